use crate::prelude::*;

use super::interval::{merge, total_length, Interval};

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProgressError {
    #[snafu(display("video duration must be a positive number of seconds, got {duration}"))]
    NonPositiveDuration { duration: f64 },

    #[snafu(display("last watched time must be a non-negative number of seconds, got {time}"))]
    InvalidPlayhead { time: f64 },

    #[snafu(display("`{field}` must not be empty"))]
    EmptyId { field: &'static str },
}

/// Percentage of `video_duration` covered by `merged`, rounded half away from zero and clamped to `0..=100`.
///
/// `merged` must be canonical (see [merge]), otherwise overlapping seconds are counted more than once.
pub fn completion_percent(merged: &[Interval], video_duration: f64) -> Result<i64, ProgressError> {
    ensure!(
        video_duration.is_finite() && video_duration > 0.0,
        NonPositiveDurationSnafu {
            duration: video_duration
        }
    );

    let watched = total_length(merged);
    let percent = (100.0 * watched / video_duration).round();

    // watched time can exceed a duration the client under-reported
    Ok(percent.clamp(0.0, 100.0) as i64)
}

/// Identifies the progress of one user on one video.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    user_id: String,
    video_id: String,
}

impl ProgressKey {
    pub fn new(user_id: impl Into<String>, video_id: impl Into<String>) -> Result<Self, ProgressError> {
        let user_id = user_id.into();
        let video_id = video_id.into();

        ensure!(!user_id.trim().is_empty(), EmptyIdSnafu { field: "userId" });
        ensure!(!video_id.trim().is_empty(), EmptyIdSnafu { field: "videoId" });

        Ok(ProgressKey { user_id, video_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn record(&self) -> Record<Progress> {
        Record::composite([self.user_id.as_str(), self.video_id.as_str()])
    }
}

impl std::fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.video_id)
    }
}

/// A newly reported batch of watched ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub watched_intervals: Vec<Interval>,
    pub last_watched_time: f64,
    pub video_duration: f64,
}

impl ProgressUpdate {
    pub fn validate(&self) -> Result<(), ProgressError> {
        ensure!(
            self.video_duration.is_finite() && self.video_duration > 0.0,
            NonPositiveDurationSnafu {
                duration: self.video_duration
            }
        );
        ensure!(
            self.last_watched_time.is_finite() && self.last_watched_time >= 0.0,
            InvalidPlayheadSnafu {
                time: self.last_watched_time
            }
        );

        Ok(())
    }
}

/// How much of a video a user has watched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub user_id: String,
    pub video_id: String,
    pub watched_intervals: Vec<Interval>,
    pub last_watched_time: f64,
    pub video_duration: f64,
    pub progress_percent: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

define_table!("progress" : Progress);

define_relation! {
    Progress > find(record: &Record<Progress>) > Option<Progress>
        where "SELECT * FROM $record"
}

define_relation! {
    Progress > save(record: &Record<Progress>, progress: &Progress) > Option<Progress>
        where "UPDATE $record CONTENT $progress RETURN AFTER"
}

impl Progress {
    /// The progress of someone who has not watched anything yet.
    pub fn empty(key: &ProgressKey) -> Self {
        Progress {
            user_id: key.user_id.clone(),
            video_id: key.video_id.clone(),
            watched_intervals: Vec::new(),
            last_watched_time: 0.0,
            video_duration: 0.0,
            progress_percent: 0,
            updated_at: None,
        }
    }

    /// Folds `update` into the watch history in `prior`, producing the record to store.
    ///
    /// The percent is always recomputed from the merged ranges, the playhead and duration are taken from `update`.
    pub fn apply(
        key: &ProgressKey, prior: Option<&Progress>, update: ProgressUpdate, at: Timestamp,
    ) -> Result<Progress, ProgressError> {
        update.validate()?;

        let history = prior.map(|p| p.watched_intervals.as_slice()).unwrap_or_default();
        let watched_intervals = merge(history.iter().copied().chain(update.watched_intervals));
        let progress_percent = completion_percent(&watched_intervals, update.video_duration)?;

        Ok(Progress {
            user_id: key.user_id.clone(),
            video_id: key.video_id.clone(),
            watched_intervals,
            last_watched_time: update.last_watched_time,
            video_duration: update.video_duration,
            progress_percent,
            updated_at: Some(at),
        })
    }
}
