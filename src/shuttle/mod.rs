// Legislative shuttle tracking.
//
// A text moves through a closed graph of locations; every move is validated
// by `machine::apply` and appended to the text's history. `ShuttleEngine`
// wraps the pure transition function with persistence and notifications.

pub mod cmp;
pub mod command;
pub mod counter;
pub mod engine;
pub mod error;
pub mod events;
pub mod graph;
pub mod location;
pub mod machine;
pub mod phase;
pub mod projection;
pub mod text;

pub use cmp::{CmpEvent, CmpProceedings, CmpStage};
pub use command::{Command, CommandKind, CommitteeAction, CommitteeCommand, VoteEvent, VoteOutcome};
pub use engine::ShuttleEngine;
pub use error::EngineError;
pub use events::{BroadcastNotifier, EventType, LogNotifier, NoopNotifier, Notifier, ShuttleEvent};
pub use graph::{CmpResult, Edge, LocationGraph, Trigger};
pub use location::{Chamber, Location, Stage};
pub use machine::{apply, check_invariants, is_legal, TransitionRules};
pub use phase::{phase_board, phase_of, phase_ordinal, Phase, PhaseStatus, PhaseView};
pub use projection::TextProjection;
pub use text::{ChamberReadings, ChamberRecord, LegislativeText, TextId, Timestamps, TransitionRecord};
