// Joint committee (commission mixte paritaire) sub-workflow.
//
// The committee runs as its own small state machine. Its accepted events are
// persisted on the aggregate, and the machine is rebuilt by replaying them
// whenever a new committee event arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statig::prelude::*;

use super::graph::CmpResult;
use super::location::Location;
use super::text::TextId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CmpEvent {
    OpenDeliberations,
    Conclude { result: CmpResult },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CmpStage {
    Convened,
    InProgress,
    Agreement,
    Failure,
}

impl CmpStage {
    /// Location the main graph must be at for this stage
    pub fn location(self) -> Location {
        match self {
            CmpStage::Convened => Location::CmpConvened,
            CmpStage::InProgress => Location::CmpInProgress,
            CmpStage::Agreement => Location::CmpAgreement,
            CmpStage::Failure => Location::CmpFailure,
        }
    }
}

struct Committee {
    text_id: TextId,
}

#[state_machine(initial = "State::convened()")]
impl Committee {
    #[state]
    fn convened(&mut self, event: &CmpEvent) -> Outcome<State> {
        match event {
            CmpEvent::OpenDeliberations => {
                tracing::info!(text_id = %self.text_id, "Joint committee deliberations opened");
                Transition(State::in_progress())
            }
            CmpEvent::Conclude { .. } => {
                tracing::warn!(text_id = %self.text_id, "Joint committee cannot conclude before deliberating");
                Handled
            }
        }
    }

    #[state]
    fn in_progress(&mut self, event: &CmpEvent) -> Outcome<State> {
        match event {
            CmpEvent::Conclude { result: CmpResult::Agreement } => {
                tracing::info!(text_id = %self.text_id, "Joint committee reached agreement");
                Transition(State::agreement())
            }
            CmpEvent::Conclude { result: CmpResult::Failure } => {
                tracing::info!(text_id = %self.text_id, "Joint committee failed to agree");
                Transition(State::failure())
            }
            CmpEvent::OpenDeliberations => Handled,
        }
    }

    #[state]
    fn agreement(&mut self, event: &CmpEvent) -> Outcome<State> {
        tracing::warn!(text_id = %self.text_id, event = ?event, "Joint committee already concluded");
        Handled
    }

    #[state]
    fn failure(&mut self, event: &CmpEvent) -> Outcome<State> {
        tracing::warn!(text_id = %self.text_id, event = ?event, "Joint committee already concluded");
        Handled
    }
}

fn stage_of(state: &State) -> CmpStage {
    match state {
        State::Convened { .. } => CmpStage::Convened,
        State::InProgress { .. } => CmpStage::InProgress,
        State::Agreement { .. } => CmpStage::Agreement,
        State::Failure { .. } => CmpStage::Failure,
    }
}

/// Persisted record of a joint committee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmpProceedings {
    pub convened_at: DateTime<Utc>,
    /// `AN_ADOPTED` or `SN_ADOPTED`, whichever reading triggered the committee
    pub convened_from: Location,
    pub opened_at: Option<DateTime<Utc>>,
    pub concluded_at: Option<DateTime<Utc>>,
    pub result: Option<CmpResult>,
    #[serde(default)]
    events: Vec<CmpEvent>,
}

impl CmpProceedings {
    pub fn convene(convened_from: Location, now: DateTime<Utc>) -> Self {
        Self {
            convened_at: now,
            convened_from,
            opened_at: None,
            concluded_at: None,
            result: None,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[CmpEvent] {
        &self.events
    }

    /// Current stage, rebuilt from the event log
    pub fn stage(&self, text_id: TextId) -> CmpStage {
        let mut machine = Committee { text_id }.state_machine();
        for event in &self.events {
            machine.handle(event);
        }
        stage_of(machine.state())
    }

    /// Feed one event to the committee. Returns the new stage, or `None` when
    /// the committee refused the event and nothing was recorded.
    pub fn handle(&mut self, text_id: TextId, event: CmpEvent, now: DateTime<Utc>) -> Option<CmpStage> {
        let mut machine = Committee { text_id }.state_machine();
        for past in &self.events {
            machine.handle(past);
        }
        let before = stage_of(machine.state());
        machine.handle(&event);
        let after = stage_of(machine.state());
        if before == after {
            return None;
        }

        match event {
            CmpEvent::OpenDeliberations => self.opened_at = Some(now),
            CmpEvent::Conclude { result } => {
                self.concluded_at = Some(now);
                self.result = Some(result);
            }
        }
        self.events.push(event);
        Some(after)
    }
}
