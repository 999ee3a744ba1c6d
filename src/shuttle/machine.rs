// Transition validator.
//
// Pure function over one aggregate: no I/O, no clock, no locking. The
// command runs against a draft copy, and the aggregate is only replaced when
// every hop was legal and the post-conditions hold.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::cmp::{CmpEvent, CmpProceedings};
use super::command::{Command, CommandKind, VoteOutcome};
use super::counter;
use super::error::EngineError;
use super::graph::{CmpResult, LocationGraph, Trigger};
use super::location::{Location, Stage};
use super::text::{LegislativeText, TransitionRecord};

/// Procedural knobs that affect legality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRules {
    /// Readings each chamber must complete before a joint committee
    pub cmp_min_readings_per_chamber: u32,
}

impl Default for TransitionRules {
    fn default() -> Self {
        Self {
            cmp_min_readings_per_chamber: 1,
        }
    }
}

/// Apply `command` to `text`. On success returns the history records the
/// command appended, one per hop. On failure `text` is left untouched.
pub fn apply(
    text: &mut LegislativeText,
    command: &Command,
    now: DateTime<Utc>,
    rules: &TransitionRules,
) -> Result<Vec<TransitionRecord>, EngineError> {
    let mut draft = text.clone();
    let recorded_before = draft.history.len();

    if let Err(e) = run(&mut draft, command, now, rules) {
        warn!(
            text_id = %text.id,
            location = %text.location,
            command = %command.kind(),
            error = %e,
            "Command rejected"
        );
        return Err(e);
    }

    if let Err(e) = check_invariants(&draft) {
        error!(text_id = %text.id, error = %e, "Transition broke an aggregate invariant");
        return Err(e);
    }

    let records = draft.history[recorded_before..].to_vec();
    *text = draft;
    Ok(records)
}

/// Whether `command` would be accepted right now, without applying it
pub fn is_legal(text: &LegislativeText, command: &Command, rules: &TransitionRules) -> bool {
    let mut draft = text.clone();
    run(&mut draft, command, Utc::now(), rules).is_ok()
}

fn run(
    draft: &mut LegislativeText,
    command: &Command,
    now: DateTime<Utc>,
    rules: &TransitionRules,
) -> Result<(), EngineError> {
    let graph = LocationGraph::new();
    let kind = command.kind();
    let from = draft.location;

    if graph.is_terminal(from) {
        return Err(EngineError::TerminalStateViolation {
            location: from,
            command: kind,
        });
    }

    match command {
        Command::Advance => {
            if from == Location::FinalAn && cmp_result(draft) != Some(CmpResult::Agreement) {
                return Err(illegal(from, kind));
            }
            hop(draft, Trigger::Advance, kind, now)?;
        }

        Command::Vote { chamber, outcome } => {
            match from.chamber_stage() {
                Some((owner, Stage::Vote)) if owner == *chamber => {}
                _ => return Err(illegal(from, kind)),
            }

            match outcome {
                VoteOutcome::Rejected => {
                    hop(draft, Trigger::Reject, kind, now)?;
                }
                VoteOutcome::Adopted | VoteOutcome::Amended => {
                    let other_has_read = draft.readings.get(chamber.other()).completed_readings > 0;
                    hop(draft, Trigger::Pass, kind, now)?;
                    draft.readings.get_mut(*chamber).completed_readings += 1;

                    if *outcome == VoteOutcome::Amended {
                        // Amendments only diverge once there is another chamber's version to differ from
                        draft.divergent = other_has_read;
                    } else {
                        draft.divergent = false;
                        if other_has_read {
                            follow(draft, Trigger::Conform, kind, now)?;
                            draft.timestamps.adopted_at.get_or_insert(now);
                        }
                    }
                }
            }
        }

        Command::Transmit => {
            hop(draft, Trigger::Transmit, kind, now)?;
            follow(draft, Trigger::Arrive, kind, now)?;
        }

        Command::ConveneCmp => {
            if !matches!(from.chamber_stage(), Some((_, Stage::Adopted))) {
                return Err(illegal(from, kind));
            }
            check_cmp_gate(draft, rules)?;
            hop(draft, Trigger::Convene, kind, now)?;
            draft.cmp = Some(CmpProceedings::convene(from, now));
        }

        Command::OpenCmp => {
            if from != Location::CmpConvened {
                return Err(illegal(from, kind));
            }
            committee_step(draft, CmpEvent::OpenDeliberations, Trigger::OpenDeliberations, kind, now)?;
        }

        Command::ResolveCmp { result } => {
            if from != Location::CmpInProgress {
                return Err(illegal(from, kind));
            }
            committee_step(
                draft,
                CmpEvent::Conclude { result: *result },
                Trigger::Conclude(*result),
                kind,
                now,
            )?;
            follow(draft, Trigger::HandOver, kind, now)?;
        }

        Command::Promulgate => {
            // Straight from the Assemblée's final reading only when the committee failed
            if from == Location::FinalAn && cmp_result(draft) != Some(CmpResult::Failure) {
                return Err(illegal(from, kind));
            }
            hop(draft, Trigger::Promulgate, kind, now)?;
            draft.timestamps.adopted_at.get_or_insert(now);
            draft.timestamps.promulgated_at = Some(now);
        }
    }

    Ok(())
}

fn illegal(location: Location, command: CommandKind) -> EngineError {
    EngineError::IllegalTransition { location, command }
}

fn cmp_result(text: &LegislativeText) -> Option<CmpResult> {
    text.cmp.as_ref().and_then(|c| c.result)
}

fn check_cmp_gate(text: &LegislativeText, rules: &TransitionRules) -> Result<(), EngineError> {
    let min = rules.cmp_min_readings_per_chamber.max(1);
    let assembly = text.readings.assembly.completed_readings;
    let senate = text.readings.senate.completed_readings;
    if assembly < min || senate < min {
        return Err(EngineError::PrematureCmp {
            reason: format!(
                "each chamber must complete {min} reading(s); assembly has {assembly}, senate has {senate}"
            ),
        });
    }
    if !text.divergent {
        return Err(EngineError::PrematureCmp {
            reason: "the chambers have not adopted diverging versions".to_string(),
        });
    }
    Ok(())
}

/// Advance the committee sub-machine and the main graph in lockstep
fn committee_step(
    draft: &mut LegislativeText,
    event: CmpEvent,
    trigger: Trigger,
    kind: CommandKind,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let from = draft.location;
    let text_id = draft.id;
    let proceedings = draft.cmp.as_mut().ok_or_else(|| {
        EngineError::InvariantViolation(format!("text {text_id} is at {from} without committee proceedings"))
    })?;
    let stage = proceedings
        .handle(text_id, event, now)
        .ok_or_else(|| illegal(from, kind))?;

    let to = hop(draft, trigger, kind, now)?;
    if to != stage.location() {
        return Err(EngineError::InvariantViolation(format!(
            "committee stage {stage:?} disagrees with location {to}"
        )));
    }
    Ok(())
}

/// First hop of a command: a missing edge means the command is illegal here
fn hop(
    draft: &mut LegislativeText,
    trigger: Trigger,
    kind: CommandKind,
    now: DateTime<Utc>,
) -> Result<Location, EngineError> {
    let from = draft.location;
    let to = LocationGraph::new()
        .successor(from, trigger)
        .ok_or_else(|| illegal(from, kind))?;
    enter(draft, from, to, kind, now);
    Ok(to)
}

/// Follow-up hop the command implies; a missing edge is a graph defect
fn follow(
    draft: &mut LegislativeText,
    trigger: Trigger,
    kind: CommandKind,
    now: DateTime<Utc>,
) -> Result<Location, EngineError> {
    let from = draft.location;
    let to = LocationGraph::new().successor(from, trigger).ok_or_else(|| {
        EngineError::InvariantViolation(format!("no {trigger:?} edge from {from}"))
    })?;
    enter(draft, from, to, kind, now);
    Ok(to)
}

fn enter(draft: &mut LegislativeText, from: Location, to: Location, command: CommandKind, now: DateTime<Utc>) {
    draft.location = to;
    counter::on_enter(draft, to, now);
    let sequence = draft.history.len() as u64 + 1;
    draft.history.push(TransitionRecord {
        sequence,
        from,
        to,
        command,
        timestamp: now,
    });
    info!(
        text_id = %draft.id,
        from = %from,
        to = %to,
        command = %command,
        shuttle_count = draft.shuttle_count,
        reading_number = draft.reading_number,
        "Legislative text transition"
    );
}

/// Post-conditions every accepted command must leave in place
pub fn check_invariants(text: &LegislativeText) -> Result<(), EngineError> {
    let graph = LocationGraph::new();

    if text.location.is_transient() {
        return Err(EngineError::InvariantViolation(format!(
            "text rests at transient location {}",
            text.location
        )));
    }

    let shuttles = counter::shuttles_in_history(text);
    if shuttles != text.shuttle_count {
        return Err(EngineError::InvariantViolation(format!(
            "shuttle count {} but {} transmissions in history",
            text.shuttle_count, shuttles
        )));
    }

    let mut expected_from = text.origin.depot();
    for record in &text.history {
        if record.from != expected_from || !graph.allows(record.from, record.to) {
            return Err(EngineError::InvariantViolation(format!(
                "history record {} ({} -> {}) does not follow the location graph",
                record.sequence, record.from, record.to
            )));
        }
        expected_from = record.to;
    }
    if expected_from != text.location {
        return Err(EngineError::InvariantViolation(format!(
            "history ends at {expected_from} but text is at {}",
            text.location
        )));
    }

    if !text.timestamps.is_ordered() {
        return Err(EngineError::InvariantViolation(
            "procedural timestamps are out of order".to_string(),
        ));
    }

    if text.location.is_cmp() {
        let stage = text
            .cmp
            .as_ref()
            .map(|c| c.stage(text.id))
            .ok_or_else(|| EngineError::InvariantViolation("committee location without proceedings".to_string()))?;
        if stage.location() != text.location {
            return Err(EngineError::InvariantViolation(format!(
                "committee stage {stage:?} disagrees with location {}",
                text.location
            )));
        }
    }

    Ok(())
}
