// Persistence boundary.
//
// The engine only talks to `TextRepository`. Every stored text carries a
// version; `save` is a compare-and-write on that version so concurrent
// writers cannot silently overwrite each other.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shuttle::{LegislativeText, Location, TextId};

pub mod file;
pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;

pub use file::FileSystemRepository;
pub use memory::MemoryRepository;
#[cfg(feature = "database")]
pub use sqlite::SqliteRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Version mismatch for text {text_id}: expected {expected}, found {found}")]
    VersionMismatch {
        text_id: TextId,
        expected: u64,
        found: u64,
    },

    #[error("Text {0} already exists")]
    AlreadyExists(TextId),

    #[error("Text {0} does not exist")]
    Missing(TextId),

    #[error("Unknown location '{0}' in stored record")]
    UnknownLocation(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

/// A stored value together with its optimistic-lock version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }
}

/// First version assigned by `insert`
pub const INITIAL_VERSION: u64 = 1;

/// Parse a stored document. When parsing fails because a location name this
/// build does not know appears anywhere in the aggregate found at
/// `text_pointer`, the failure is reported as `UnknownLocation`.
pub(crate) fn decode_stored<T: DeserializeOwned>(contents: &str, text_pointer: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(contents).map_err(|e| {
        serde_json::from_str::<serde_json::Value>(contents)
            .ok()
            .and_then(|document| document.pointer(text_pointer).and_then(unknown_location_in))
            .map(RepositoryError::UnknownLocation)
            .unwrap_or(RepositoryError::Serialization(e))
    })
}

/// First location name in the aggregate that does not parse: the current
/// location, every history hop, then the committee's origin
fn unknown_location_in(text: &serde_json::Value) -> Option<String> {
    let hops = text
        .get("history")
        .and_then(|history| history.as_array())
        .into_iter()
        .flatten()
        .flat_map(|record| [record.get("from"), record.get("to")]);

    std::iter::once(text.get("location"))
        .chain(hops)
        .chain(std::iter::once(text.get("cmp").and_then(|cmp| cmp.get("convened_from"))))
        .flatten()
        .filter_map(|name| name.as_str())
        .find(|name| name.parse::<Location>().is_err())
        .map(str::to_string)
}

#[async_trait]
pub trait TextRepository: Send + Sync {
    /// Store a new text at [`INITIAL_VERSION`]
    async fn insert(&self, text: &LegislativeText) -> Result<u64, RepositoryError>;

    async fn load(&self, id: TextId) -> Result<Option<Versioned<LegislativeText>>, RepositoryError>;

    /// Overwrite the text only if its stored version is still
    /// `expected_version`. Returns the new version.
    async fn save(&self, text: &LegislativeText, expected_version: u64) -> Result<u64, RepositoryError>;

    async fn list(&self) -> Result<Vec<Versioned<LegislativeText>>, RepositoryError>;
}
