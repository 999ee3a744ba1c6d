use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{decode_stored, RepositoryError, TextRepository, Versioned, INITIAL_VERSION};
use crate::shuttle::{LegislativeText, TextId};

/// One pretty-printed JSON file per text: `<directory>/<text id>.json`.
///
/// Writes go to a temporary file that is then renamed over the original.
/// The compare-and-write is serialized by an in-process mutex, so two engines
/// sharing a directory from different processes are not protected against
/// each other.
#[derive(Debug)]
pub struct FileSystemRepository {
    directory: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSystemRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn text_path(&self, id: TextId) -> PathBuf {
        self.directory.join(format!("{id}.json"))
    }

    async fn read(&self, path: &Path) -> Result<Option<Versioned<LegislativeText>>, RepositoryError> {
        if !fs::try_exists(path).await? {
            return Ok(None);
        }
        let contents = fs::read_to_string(path).await?;
        let stored = decode_stored(&contents, "/value")?;
        Ok(Some(stored))
    }

    async fn write(&self, stored: &Versioned<LegislativeText>) -> Result<(), RepositoryError> {
        fs::create_dir_all(&self.directory).await?;
        let path = self.text_path(stored.value.id());
        let serialized = serde_json::to_string_pretty(stored)?;

        let temp_file = path.with_extension("json.tmp");
        fs::write(&temp_file, serialized).await?;
        fs::rename(&temp_file, &path).await?;

        debug!(
            text_id = %stored.value.id(),
            version = stored.version,
            file = ?path,
            "Text written"
        );
        Ok(())
    }
}

#[async_trait]
impl TextRepository for FileSystemRepository {
    async fn insert(&self, text: &LegislativeText) -> Result<u64, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        if fs::try_exists(self.text_path(text.id())).await? {
            return Err(RepositoryError::AlreadyExists(text.id()));
        }
        self.write(&Versioned::new(INITIAL_VERSION, text.clone())).await?;
        info!(text_id = %text.id(), directory = ?self.directory, "Text stored");
        Ok(INITIAL_VERSION)
    }

    async fn load(&self, id: TextId) -> Result<Option<Versioned<LegislativeText>>, RepositoryError> {
        self.read(&self.text_path(id)).await
    }

    async fn save(&self, text: &LegislativeText, expected_version: u64) -> Result<u64, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let current = self
            .read(&self.text_path(text.id()))
            .await?
            .ok_or(RepositoryError::Missing(text.id()))?;
        if current.version != expected_version {
            return Err(RepositoryError::VersionMismatch {
                text_id: text.id(),
                expected: expected_version,
                found: current.version,
            });
        }

        let next = Versioned::new(current.version + 1, text.clone());
        self.write(&next).await?;
        Ok(next.version)
    }

    async fn list(&self) -> Result<Vec<Versioned<LegislativeText>>, RepositoryError> {
        if !fs::try_exists(&self.directory).await? {
            return Ok(Vec::new());
        }

        let mut all = Vec::new();
        let mut entries = fs::read_dir(&self.directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stored) = self.read(&path).await? {
                all.push(stored);
            }
        }
        all.sort_by(|a, b| a.value.timestamps().deposited_at.cmp(&b.value.timestamps().deposited_at));
        Ok(all)
    }
}
