pub mod progress;
pub mod uploads;

pub use progress::{ProgressTracker, UpdateProgressError};
pub use uploads::{StoredFile, Uploads, UploadError, PUBLIC_PREFIX};
