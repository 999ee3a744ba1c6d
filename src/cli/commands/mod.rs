use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{NavetteConfig, StorageBackend};
use crate::shuttle::{BroadcastNotifier, LogNotifier, NoopNotifier, Notifier, ShuttleEngine};
use crate::storage::{FileSystemRepository, MemoryRepository, TextRepository};

pub mod create;
pub mod report;
pub mod transition;

/// Build an engine over the configured storage backend
pub async fn open_engine(config: &NavetteConfig, storage_dir: Option<&str>) -> Result<ShuttleEngine> {
    let repository: Arc<dyn TextRepository> = match config.storage.backend {
        StorageBackend::File => {
            let directory = storage_dir.unwrap_or(&config.storage.directory);
            let repository = FileSystemRepository::new(directory);
            debug!(directory = ?repository.directory(), "Using file storage");
            Arc::new(repository)
        }
        StorageBackend::Memory => {
            warn!("Memory storage selected; texts will not outlive this command");
            Arc::new(MemoryRepository::new())
        }
        StorageBackend::Sqlite => open_sqlite(config).await?,
    };

    let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
        Arc::new(LogNotifier)
    } else {
        Arc::new(NoopNotifier)
    };

    Ok(ShuttleEngine::from_config(repository, notifier, &config.engine))
}

/// Engine whose notifications are also fanned out to in-process subscribers
pub fn broadcasting_engine(
    repository: Arc<dyn TextRepository>,
    config: &NavetteConfig,
) -> (ShuttleEngine, BroadcastNotifier) {
    let notifier = BroadcastNotifier::new(config.notifications.channel_capacity);
    let engine = ShuttleEngine::from_config(repository, Arc::new(notifier.clone()), &config.engine);
    (engine, notifier)
}

#[cfg(feature = "database")]
async fn open_sqlite(config: &NavetteConfig) -> Result<Arc<dyn TextRepository>> {
    let repository = crate::storage::SqliteRepository::connect(&config.storage.database_url, config.storage.auto_migrate)
        .await
        .with_context(|| format!("Failed to open database {}", config.storage.database_url))?;
    Ok(Arc::new(repository))
}

#[cfg(not(feature = "database"))]
async fn open_sqlite(_config: &NavetteConfig) -> Result<Arc<dyn TextRepository>> {
    Err(anyhow::anyhow!("SQLite storage requires building navette with the 'database' feature"))
        .context("Cannot open storage")
}

pub async fn show_how_to_get_started() -> Result<()> {
    println!("🏛️  Navette - Legislative shuttle tracking");
    println!();
    println!("To get started:");
    println!("  📥 navette create --origin assembly --title '...' --reference PL-2025-001");
    println!("  ➡️  navette advance <ID>      # Next step inside the chamber");
    println!("  🗳️  navette vote <ID> --chamber assembly --outcome adopted");
    println!("  🚌 navette transmit <ID>     # Send to the other chamber");
    println!("  📋 navette show <ID>         # Where does the text stand?");
    println!();
    println!("💡 Run 'navette --help' for the full list of commands");
    Ok(())
}
