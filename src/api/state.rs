use std::sync::Arc;

use derive_new::new;

use crate::database::Database;
use crate::service::{ProgressTracker, Uploads};

/// State shared by every request handler.
#[derive(Debug, Clone, new)]
pub struct App {
    pub database: Database,
    pub progress: Arc<ProgressTracker>,
    pub uploads: Uploads,
}

pub fn create_app(database: Database, uploads: Uploads) -> App {
    let progress = ProgressTracker::new(database.clone());

    App {
        progress: Arc::new(progress),
        database,
        uploads,
    }
}
