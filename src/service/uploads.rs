use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::prelude::*;

/// Route under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum UploadError {
    #[snafu(display("could not create the upload directory `{}`: {source}", path.display()))]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not create `{}`: {source}", path.display()))]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not write to `{}`: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// A directory of uploaded video files.
#[derive(Debug, Clone)]
pub struct Uploads {
    dir: PathBuf,
}

/// A file that has been completely written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated name of the file inside the upload directory.
    pub filename: String,
    /// Path clients can fetch the file from.
    pub url: String,
}

impl Uploads {
    /// Opens `dir`, creating it if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .context(CreateDirectorySnafu { path: dir.clone() })?;

        Ok(Uploads { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Starts writing a new file with a unique name. The extension of `original_name` is kept.
    #[tracing::instrument(skip(self))]
    pub async fn begin(&self, original_name: Option<&str>) -> Result<PendingUpload, UploadError> {
        let filename = unique_name(original_name);
        let path = self.dir.join(&filename);

        let file = File::create(&path)
            .await
            .context(CreateFileSnafu { path: path.clone() })?;

        tracing::debug!(path = %path.display(), "receiving upload");

        Ok(PendingUpload {
            filename,
            path,
            file,
        })
    }

    /// Deletes a stored file. Failures are only logged.
    pub async fn remove(&self, filename: &str) {
        let path = self.dir.join(filename);
        if let Err(error) = tokio::fs::remove_file(&path).await {
            tracing::warn!(%error, path = %path.display(), "could not remove uploaded file");
        }
    }
}

fn unique_name(original_name: Option<&str>) -> String {
    let extension = original_name
        .map(Path::new)
        .and_then(Path::extension)
        .and_then(|extension| extension.to_str())
        .filter(|extension| extension.chars().all(|c| c.is_ascii_alphanumeric()));

    let id = Uuid::new_v4().simple();
    match extension {
        Some(extension) => format!("{id}.{}", extension.to_ascii_lowercase()),
        None => id.to_string(),
    }
}

/// A file being written into the upload directory.
#[derive(Debug)]
pub struct PendingUpload {
    filename: String,
    path: PathBuf,
    file: File,
}

impl PendingUpload {
    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        self.file
            .write_all(chunk)
            .await
            .context(WriteFileSnafu { path: self.path.clone() })
    }

    pub async fn finish(mut self) -> Result<StoredFile, UploadError> {
        self.file
            .sync_all()
            .await
            .context(WriteFileSnafu { path: self.path.clone() })?;

        tracing::info!(path = %self.path.display(), "stored upload");

        Ok(StoredFile {
            url: format!("{PUBLIC_PREFIX}/{}", self.filename),
            filename: self.filename,
        })
    }

    /// Drops the partially written file.
    pub async fn discard(self) {
        let PendingUpload { path, file, .. } = self;
        drop(file);

        if let Err(error) = tokio::fs::remove_file(&path).await {
            tracing::warn!(%error, path = %path.display(), "could not remove partial upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_names_keep_the_extension() {
        let name = unique_name(Some("Holiday Clip.MP4"));
        assert!(name.ends_with(".mp4"), "{name}");
        assert_eq!(name.len(), 32 + ".mp4".len());

        assert_ne!(unique_name(Some("a.webm")), unique_name(Some("a.webm")));
    }

    #[test]
    fn odd_extensions_are_dropped() {
        assert_eq!(unique_name(None).len(), 32);
        assert_eq!(unique_name(Some("noextension")).len(), 32);
        assert_eq!(unique_name(Some("evil.mp4/../x")).len(), 32);
    }

    #[tokio::test]
    async fn writes_and_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = Uploads::open(dir.path().join("nested")).await.unwrap();

        let mut pending = uploads.begin(Some("clip.mp4")).await.unwrap();
        pending.write(b"first ").await.unwrap();
        pending.write(b"second").await.unwrap();
        let stored = pending.finish().await.unwrap();

        assert_eq!(stored.url, format!("/uploads/{}", stored.filename));

        let content = tokio::fs::read(uploads.dir().join(&stored.filename)).await.unwrap();
        assert_eq!(content, b"first second");

        uploads.remove(&stored.filename).await;
        assert!(!uploads.dir().join(&stored.filename).exists());
    }

    #[tokio::test]
    async fn discard_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = Uploads::open(dir.path()).await.unwrap();

        let mut pending = uploads.begin(None).await.unwrap();
        pending.write(b"partial").await.unwrap();
        pending.discard().await;

        let mut entries = tokio::fs::read_dir(uploads.dir()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}
