use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::model::{Progress, ProgressError, ProgressKey, ProgressUpdate};
use crate::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum UpdateProgressError {
    #[snafu(display("{source}"))]
    InvalidUpdate {
        source: ProgressError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not load the progress of `{key}`: {source}"))]
    LoadProgress {
        key: ProgressKey,
        source: DatabaseQueryError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not save the progress of `{key}`: {source}"))]
    SaveProgress {
        key: ProgressKey,
        source: DatabaseQueryError,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Owns the watch history of every `(user, video)` pair.
///
/// Updates are a read-merge-write against the database. Updates for the same key are serialized through a per-key
/// lock so none of them is lost, but the lock only lives in this process: two processes sharing one database can
/// still interleave and the last write wins.
#[derive(Debug, new)]
pub struct ProgressTracker {
    database: Database,
    // only keys with an update in flight
    #[new(default)]
    locks: DashMap<ProgressKey, Arc<Mutex<()>>>,
}

impl ProgressTracker {
    /// The stored progress, or [Progress::empty] when the key was never updated.
    #[instrument(skip(self), fields(%key))]
    pub async fn get(&self, key: &ProgressKey) -> Result<Progress, DatabaseQueryError> {
        let stored = Progress::find(&key.record(), &self.database).await?;
        Ok(stored.unwrap_or_else(|| Progress::empty(key)))
    }

    /// Merges `update` into the stored history of `key` and saves the result with a single write.
    #[instrument(skip(self, update), fields(%key, intervals = update.watched_intervals.len()))]
    pub async fn update(&self, key: ProgressKey, update: ProgressUpdate) -> Result<Progress, UpdateProgressError> {
        update.validate().context(InvalidUpdateSnafu)?;

        let entry = KeyLock::acquire(&self.locks, &key);
        let _guard = entry.lock().await;

        self.merge_and_save(&key, update).await
    }

    async fn merge_and_save(&self, key: &ProgressKey, update: ProgressUpdate) -> Result<Progress, UpdateProgressError> {
        let record = key.record();
        let prior = Progress::find(&record, &self.database)
            .await
            .context(LoadProgressSnafu { key: key.clone() })?;

        let progress = Progress::apply(key, prior.as_ref(), update, now()).context(InvalidUpdateSnafu)?;

        let saved = Progress::save(&record, &progress, &self.database)
            .await
            .and_then(|saved| saved.context(NoResultsSnafu))
            .context(SaveProgressSnafu { key: key.clone() })?;

        tracing::info!(percent = saved.progress_percent, "updated progress");

        Ok(saved)
    }
}

/// A handle on the lock of one key. The map entry is removed when the last handle drops, including when the update
/// future is cancelled.
struct KeyLock<'a> {
    locks: &'a DashMap<ProgressKey, Arc<Mutex<()>>>,
    key: &'a ProgressKey,
    lock: Option<Arc<Mutex<()>>>,
}

impl<'a> KeyLock<'a> {
    fn acquire(locks: &'a DashMap<ProgressKey, Arc<Mutex<()>>>, key: &'a ProgressKey) -> Self {
        let lock = Arc::clone(&locks.entry(key.clone()).or_default());
        KeyLock {
            locks,
            key,
            lock: Some(lock),
        }
    }

    async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        match &self.lock {
            Some(lock) => lock.lock().await,
            None => unreachable!("the lock is only taken on drop"),
        }
    }
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        drop(self.lock.take());
        self.locks.remove_if(self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
