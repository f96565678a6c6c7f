use axum::extract::multipart::Field;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use tracing::instrument;
use url::Url;

use super::error::{StorageSnafu, UploadSnafu, VideoNotFoundSnafu};
use super::{ApiError, App, Result};
use crate::model::{Source, Video};
use crate::prelude::*;
use crate::service::uploads::PendingUpload;
use crate::service::StoredFile;

/// A video as clients see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub url: String,
    pub created_at: Timestamp,
}

impl From<Video> for VideoInfo {
    fn from(video: Video) -> Self {
        VideoInfo {
            id: video.id.key(),
            title: video.title,
            filename: video.filename,
            url: video.url,
            created_at: video.created_at,
        }
    }
}

fn checked_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::invalid("`title` must not be empty"));
    }
    Ok(title)
}

#[instrument(skip(app))]
pub async fn list(State(app): State<App>) -> Result<Json<Vec<VideoInfo>>> {
    let videos = Video::all(&app.database).await.context(StorageSnafu)?;
    Ok(Json(videos.into_iter().map(VideoInfo::from).collect()))
}

#[instrument(skip(app))]
pub async fn info(State(app): State<App>, Path(id): Path<String>) -> Result<Json<VideoInfo>> {
    let video = Video::find(&id, &app.database).await.context(StorageSnafu)?;
    let video = video.context(VideoNotFoundSnafu { id })?;

    Ok(Json(video.into()))
}

#[derive(Debug, Deserialize)]
pub struct LinkVideo {
    pub title: String,
    pub url: Url,
}

/// Registers a video hosted elsewhere, typically on YouTube.
#[instrument(skip(app))]
pub async fn link(
    State(app): State<App>, payload: Result<Json<LinkVideo>, JsonRejection>,
) -> Result<Json<VideoInfo>> {
    let Json(payload) = payload?;
    let title = checked_title(&payload.title)?;

    if !matches!(payload.url.scheme(), "http" | "https") {
        return Err(ApiError::invalid("`url` must be an http or https link"));
    }

    let video = Video::create(title, &Source::Link { url: payload.url }, &app.database)
        .await
        .context(StorageSnafu)?;

    tracing::info!(id = %video.id, "registered linked video");

    Ok(Json(video.into()))
}

/// Stores the `video` file of a multipart form together with its `title`.
#[instrument(skip(app, multipart))]
pub async fn upload(State(app): State<App>, mut multipart: Multipart) -> Result<Json<VideoInfo>> {
    let mut title = None;
    let mut stored: Option<StoredFile> = None;

    if let Err(error) = read_form(&app, &mut multipart, &mut title, &mut stored).await {
        if let Some(file) = stored {
            app.uploads.remove(&file.filename).await;
        }
        return Err(error);
    }

    let Some(file) = stored else {
        return Err(ApiError::invalid("missing `video` file"));
    };

    let title = match title.as_deref().map(checked_title) {
        Some(Ok(title)) => title,
        Some(Err(error)) => {
            app.uploads.remove(&file.filename).await;
            return Err(error);
        }
        None => {
            app.uploads.remove(&file.filename).await;
            return Err(ApiError::invalid("missing `title` field"));
        }
    };

    let source = Source::Upload {
        filename: file.filename.clone(),
        url: file.url,
    };

    let video = match Video::create(title, &source, &app.database).await {
        Ok(video) => video,
        Err(source) => {
            app.uploads.remove(&file.filename).await;
            return Err(source).context(StorageSnafu);
        }
    };

    tracing::info!(id = %video.id, filename = %file.filename, "uploaded video");

    Ok(Json(video.into()))
}

/// Reads the form fields. A file stored before a later field fails is left in `stored` for the caller to remove.
async fn read_form(
    app: &App, multipart: &mut Multipart, title: &mut Option<String>, stored: &mut Option<StoredFile>,
) -> Result<()> {
    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);

        match name.as_deref() {
            Some("title") => *title = Some(field.text().await?),
            Some("video") if stored.is_none() => {
                let mut pending = app
                    .uploads
                    .begin(field.file_name())
                    .await
                    .context(UploadSnafu)?;

                match receive(&mut field, &mut pending).await {
                    Ok(()) => *stored = Some(pending.finish().await.context(UploadSnafu)?),
                    Err(error) => {
                        pending.discard().await;
                        return Err(error);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

async fn receive(field: &mut Field<'_>, pending: &mut PendingUpload) -> Result<()> {
    while let Some(chunk) = field.chunk().await? {
        pending.write(&chunk).await.context(UploadSnafu)?;
    }
    Ok(())
}
