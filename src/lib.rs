// Navette Library - Legislative Shuttle Tracking
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod shuttle;
pub mod storage;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{config, init_config, NavetteConfig};
pub use shuttle::{
    Chamber, CmpResult, Command, EngineError, LegislativeText, Location, ShuttleEngine, TextId, TextProjection,
    VoteOutcome,
};
pub use storage::{FileSystemRepository, MemoryRepository, RepositoryError, TextRepository};
pub use telemetry::{create_command_span, generate_correlation_id, init_telemetry};
