use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tracing::debug;

use crate::domain::{AppError, Item};

const STAGING_DIR_NAME: &str = "tmp";

/// Create `path` (and parents) unless it is already a directory.
pub async fn ensure_dir(path: &Path) -> Result<(), AppError> {
    if fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Ok(());
    }
    fs::create_dir_all(path)
        .await
        .map_err(|source| AppError::Setup {
            path: path.to_path_buf(),
            source,
        })
}

/// Downloads land in `<root>/tmp/` and are renamed into `<root>/` once complete,
/// so a partially written file never shows up under its final name.
#[derive(Debug, Clone)]
pub struct StagingStore {
    root: PathBuf,
    staging_dir: PathBuf,
}

impl StagingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let staging_dir = root.join(STAGING_DIR_NAME);
        Self { root, staging_dir }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub async fn ensure(&self) -> Result<(), AppError> {
        ensure_dir(&self.root).await?;
        ensure_dir(&self.staging_dir).await
    }

    pub fn final_path(&self, item: &Item) -> PathBuf {
        self.root.join(item.file_name())
    }

    pub fn staging_path(&self, item: &Item) -> PathBuf {
        self.staging_dir.join(item.file_name())
    }

    /// Whether the item already sits at its final path.
    pub async fn is_committed(&self, item: &Item) -> bool {
        fs::try_exists(self.final_path(item)).await.unwrap_or(false)
    }

    /// Truncate or create the staging file for `item`.
    pub async fn create_staging_file(&self, item: &Item) -> std::io::Result<File> {
        File::create(self.staging_path(item)).await
    }

    /// Publish the staged file by renaming it over the final path.
    pub async fn commit(&self, item: &Item) -> Result<PathBuf, AppError> {
        let from = self.staging_path(item);
        let to = self.final_path(item);

        match fs::rename(&from, &to).await {
            Ok(()) => {
                debug!(from = %from.display(), to = %to.display(), "committed");
                Ok(to)
            }
            Err(source) => Err(AppError::Commit { from, to, source }),
        }
    }

    /// Remove the staging directory if nothing is left in it.
    ///
    /// Leftover partial downloads keep the directory alive for inspection.
    pub async fn cleanup_if_empty(&self) -> std::io::Result<bool> {
        let mut entries = match fs::read_dir(&self.staging_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        if entries.next_entry().await?.is_some() {
            return Ok(false);
        }

        fs::remove_dir(&self.staging_dir).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn item() -> Item {
        Item::new("ep1", "mp3", "http://x/1")
    }

    #[tokio::test]
    async fn test_ensure_creates_root_and_staging() {
        let dir = tempfile::tempdir().unwrap();
        let store = StagingStore::new(dir.path().join("podcasts/show"));

        store.ensure().await.unwrap();
        store.ensure().await.unwrap();

        assert!(store.root().is_dir());
        assert!(store.staging_dir().is_dir());
        assert_eq!(store.staging_dir(), dir.path().join("podcasts/show/tmp"));
    }

    #[tokio::test]
    async fn test_ensure_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = StagingStore::new(&blocker).ensure().await.unwrap_err();
        match err {
            AppError::Setup { path, .. } => assert_eq!(path, blocker),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_paths_follow_layout() {
        let store = StagingStore::new("/srv/out");
        assert_eq!(store.final_path(&item()), PathBuf::from("/srv/out/ep1.mp3"));
        assert_eq!(
            store.staging_path(&item()),
            PathBuf::from("/srv/out/tmp/ep1.mp3")
        );
    }

    #[tokio::test]
    async fn test_commit_moves_staged_bytes_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = StagingStore::new(dir.path());
        store.ensure().await.unwrap();

        let mut file = store.create_staging_file(&item()).await.unwrap();
        file.write_all(b"ID3 audio").await.unwrap();
        file.sync_all().await.unwrap();
        drop(file);

        assert!(!store.is_committed(&item()).await);
        let published = store.commit(&item()).await.unwrap();

        assert_eq!(published, store.final_path(&item()));
        assert!(!store.staging_path(&item()).exists());
        assert_eq!(std::fs::read(&published).unwrap(), b"ID3 audio");
        assert!(store.is_committed(&item()).await);
    }

    #[tokio::test]
    async fn test_commit_without_staged_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = StagingStore::new(dir.path());
        store.ensure().await.unwrap();

        let err = store.commit(&item()).await.unwrap_err();
        assert!(matches!(err, AppError::Commit { .. }));
        assert!(!store.final_path(&item()).exists());
    }

    #[tokio::test]
    async fn test_create_staging_file_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let store = StagingStore::new(dir.path());
        store.ensure().await.unwrap();
        std::fs::write(store.staging_path(&item()), b"stale partial data").unwrap();

        let mut file = store.create_staging_file(&item()).await.unwrap();
        file.write_all(b"new").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        assert_eq!(std::fs::read(store.staging_path(&item())).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_empty_staging() {
        let dir = tempfile::tempdir().unwrap();
        let store = StagingStore::new(dir.path());
        store.ensure().await.unwrap();

        std::fs::write(store.staging_path(&item()), b"partial").unwrap();
        assert!(!store.cleanup_if_empty().await.unwrap());
        assert!(store.staging_dir().is_dir());

        std::fs::remove_file(store.staging_path(&item())).unwrap();
        assert!(store.cleanup_if_empty().await.unwrap());
        assert!(!store.staging_dir().exists());

        // Already gone.
        assert!(!store.cleanup_if_empty().await.unwrap());
    }
}
