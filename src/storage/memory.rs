use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{RepositoryError, TextRepository, Versioned, INITIAL_VERSION};
use crate::shuttle::{LegislativeText, TextId};

/// In-process repository. Readers share the lock; the compare-and-write in
/// `save` holds the write lock for the whole check.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    texts: RwLock<HashMap<TextId, Versioned<LegislativeText>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> RepositoryError {
    RepositoryError::LockPoisoned(e.to_string())
}

#[async_trait]
impl TextRepository for MemoryRepository {
    async fn insert(&self, text: &LegislativeText) -> Result<u64, RepositoryError> {
        let mut texts = self.texts.write().map_err(poisoned)?;
        if texts.contains_key(&text.id()) {
            return Err(RepositoryError::AlreadyExists(text.id()));
        }
        texts.insert(text.id(), Versioned::new(INITIAL_VERSION, text.clone()));
        Ok(INITIAL_VERSION)
    }

    async fn load(&self, id: TextId) -> Result<Option<Versioned<LegislativeText>>, RepositoryError> {
        let texts = self.texts.read().map_err(poisoned)?;
        Ok(texts.get(&id).cloned())
    }

    async fn save(&self, text: &LegislativeText, expected_version: u64) -> Result<u64, RepositoryError> {
        let mut texts = self.texts.write().map_err(poisoned)?;
        let stored = texts
            .get_mut(&text.id())
            .ok_or(RepositoryError::Missing(text.id()))?;
        if stored.version != expected_version {
            return Err(RepositoryError::VersionMismatch {
                text_id: text.id(),
                expected: expected_version,
                found: stored.version,
            });
        }
        stored.version += 1;
        stored.value = text.clone();
        Ok(stored.version)
    }

    async fn list(&self) -> Result<Vec<Versioned<LegislativeText>>, RepositoryError> {
        let texts = self.texts.read().map_err(poisoned)?;
        let mut all: Vec<Versioned<LegislativeText>> = texts.values().cloned().collect();
        all.sort_by(|a, b| a.value.timestamps().deposited_at.cmp(&b.value.timestamps().deposited_at));
        Ok(all)
    }
}
