//! Staged artifacts
//!
//! Every file a request writes to disk (the uploaded input, the converter
//! output, scratch files) is a [`StagedFile`]. The file is removed when the
//! guard is released or dropped, so every exit path cleans up the same way.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio_util::io::ReaderStream;

const STAGED_PREFIX: &str = "recast-";

/// Directory in which staged files are created.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Use `dir` for staged files, creating it if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an uploaded payload to a uniquely named file carrying `extension`.
    pub async fn stage(&self, data: &[u8], extension: &str) -> io::Result<StagedFile> {
        let staged = self.allocate(extension)?;
        tokio::fs::write(staged.path(), data).await?;
        tracing::debug!(
            path = %staged.path().display(),
            size = data.len(),
            "Staged upload"
        );
        Ok(staged)
    }

    /// Reserve an empty, uniquely named file carrying `extension`.
    pub fn allocate(&self, extension: &str) -> io::Result<StagedFile> {
        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{}", extension)
        };
        let path = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&self.dir)?
            .into_temp_path();
        Ok(StagedFile { path })
    }
}

/// Scoped ownership of one staged file. Dropping it deletes the file.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. A file that is already gone counts as released.
    pub fn release(self) -> io::Result<()> {
        let shown = self.path.display().to_string();
        match self.path.close() {
            Ok(()) => {
                tracing::debug!(path = %shown, "Released staged file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Open the file as a byte stream. The guard moves into the stream, so the
    /// file is deleted once the stream has been consumed or dropped.
    pub async fn into_stream(
        self,
    ) -> io::Result<impl Stream<Item = io::Result<Bytes>> + Send + 'static> {
        let file = tokio::fs::File::open(self.path()).await?;
        let guard = self;
        Ok(ReaderStream::new(file).map(move |chunk| {
            let _held = &guard;
            chunk
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn staged_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_writes_payload_with_extension() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path()).unwrap();

        let staged = staging.stage(b"{\"a\":1}", "json").await.unwrap();

        assert_eq!(staged.path().extension().unwrap(), "json");
        assert!(staged
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(STAGED_PREFIX));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"{\"a\":1}");
    }

    #[tokio::test]
    async fn test_staged_names_are_unique() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path()).unwrap();

        let a = staging.stage(b"a", "csv").await.unwrap();
        let b = staging.stage(b"b", "csv").await.unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(staged_entries(temp.path()), 2);
    }

    #[tokio::test]
    async fn test_release_deletes_file() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path()).unwrap();
        let staged = staging.stage(b"data", "txt").await.unwrap();

        staged.release().unwrap();

        assert_eq!(staged_entries(temp.path()), 0);
    }

    #[tokio::test]
    async fn test_release_is_idempotent_when_file_already_gone() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path()).unwrap();
        let staged = staging.stage(b"data", "txt").await.unwrap();

        std::fs::remove_file(staged.path()).unwrap();

        assert!(staged.release().is_ok());
    }

    #[tokio::test]
    async fn test_drop_deletes_file() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path()).unwrap();
        {
            let _staged = staging.allocate("pdf").unwrap();
            assert_eq!(staged_entries(temp.path()), 1);
        }
        assert_eq!(staged_entries(temp.path()), 0);
    }

    #[tokio::test]
    async fn test_stream_deletes_file_after_consumption() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path()).unwrap();
        let staged = staging.stage(b"streamed body", "txt").await.unwrap();

        let stream = staged.into_stream().await.unwrap();
        // Still present while the body is being written
        assert_eq!(staged_entries(temp.path()), 1);

        let chunks: Vec<Bytes> = stream.map(|c| c.unwrap()).collect().await;
        let body: Vec<u8> = chunks.concat();
        assert_eq!(body, b"streamed body");
        assert_eq!(staged_entries(temp.path()), 0);
    }

    #[tokio::test]
    async fn test_dropping_stream_midway_deletes_file() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path()).unwrap();
        // Larger than one ReaderStream chunk
        let payload = vec![7u8; 64 * 1024];
        let staged = staging.stage(&payload, "bin").await.unwrap();

        let mut stream = Box::pin(staged.into_stream().await.unwrap());
        let first = stream.next().await.unwrap().unwrap();
        assert!(!first.is_empty());
        assert!(first.len() < payload.len());
        assert_eq!(staged_entries(temp.path()), 1);

        drop(stream);
        assert_eq!(staged_entries(temp.path()), 0);
    }

    #[test]
    fn test_new_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        let staging = StagingArea::new(&nested).unwrap();
        assert!(staging.dir().is_dir());
    }
}
