use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use tracing::instrument;

use super::error::StorageSnafu;
use super::{App, Result};
use crate::model::{Interval, Progress, ProgressKey, ProgressUpdate};
use crate::prelude::*;

#[instrument(skip(app))]
pub async fn info(
    State(app): State<App>, Path((user_id, video_id)): Path<(String, String)>,
) -> Result<Json<Progress>> {
    let key = ProgressKey::new(user_id, video_id)?;
    let progress = app.progress.get(&key).await.context(StorageSnafu)?;

    Ok(Json(progress))
}

/// Body of `POST /progress/update`. Intervals are validated while deserializing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgress {
    pub user_id: String,
    pub video_id: String,
    pub watched_intervals: Vec<Interval>,
    pub last_watched_time: f64,
    pub video_duration: f64,
}

#[instrument(skip(app))]
pub async fn update(
    State(app): State<App>, payload: Result<Json<UpdateProgress>, JsonRejection>,
) -> Result<Json<Progress>> {
    let Json(payload) = payload?;

    let key = ProgressKey::new(payload.user_id, payload.video_id)?;
    let update = ProgressUpdate {
        watched_intervals: payload.watched_intervals,
        last_watched_time: payload.last_watched_time,
        video_duration: payload.video_duration,
    };

    let progress = app.progress.update(key, update).await?;

    Ok(Json(progress))
}
