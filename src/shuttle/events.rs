// Notification events for the alerting collaborator

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

use super::command::CommandKind;
use super::graph::CmpResult;
use super::location::{Chamber, Location};
use super::text::{LegislativeText, TextId, TransitionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TextDeposited,
    ReadingAdvanced,
    VoteRecorded,
    TextRejected,
    TextTransmitted,
    TextAdopted,
    CmpConvened,
    CmpOpened,
    CmpConcluded,
    TextPromulgated,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextDeposited => "text.deposited",
            Self::ReadingAdvanced => "reading.advanced",
            Self::VoteRecorded => "vote.recorded",
            Self::TextRejected => "text.rejected",
            Self::TextTransmitted => "text.transmitted",
            Self::TextAdopted => "text.adopted",
            Self::CmpConvened => "cmp.convened",
            Self::CmpOpened => "cmp.opened",
            Self::CmpConcluded => "cmp.concluded",
            Self::TextPromulgated => "text.promulgated",
        }
    }

    /// Events an SLA watcher should escalate for urgent texts
    pub fn is_milestone(&self) -> bool {
        matches!(
            self,
            Self::TextTransmitted
                | Self::TextAdopted
                | Self::TextRejected
                | Self::CmpConvened
                | Self::CmpConcluded
                | Self::TextPromulgated
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuttleEvent {
    pub event_type: EventType,
    pub text_id: TextId,
    pub reference: String,
    pub urgency: bool,
    pub location: Location,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuttle_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chamber: Option<Chamber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmp_result: Option<CmpResult>,
}

impl ShuttleEvent {
    fn new(event_type: EventType, text: &LegislativeText, location: Location, at: DateTime<Utc>) -> Self {
        Self {
            event_type,
            text_id: text.id(),
            reference: text.reference().to_string(),
            urgency: text.urgency(),
            location,
            created_at: at,
            shuttle_count: None,
            chamber: None,
            cmp_result: None,
        }
    }

    pub fn deposited(text: &LegislativeText) -> Self {
        let mut event = Self::new(
            EventType::TextDeposited,
            text,
            text.current_location(),
            text.timestamps().deposited_at,
        );
        event.chamber = Some(text.origin());
        event
    }

    /// Events for the hops one command appended to the history
    pub fn from_records(text: &LegislativeText, records: &[TransitionRecord]) -> Vec<Self> {
        let mut events = Vec::new();
        for record in records {
            let event_type = match (record.command, record.to) {
                (_, Location::AnRejected | Location::SnRejected) => EventType::TextRejected,
                (_, Location::Adopted) => EventType::TextAdopted,
                (_, Location::Promulgated) => EventType::TextPromulgated,
                (_, Location::NavetteAnToSn | Location::NavetteSnToAn) => EventType::TextTransmitted,
                (_, Location::CmpConvened) => EventType::CmpConvened,
                (_, Location::CmpInProgress) => EventType::CmpOpened,
                (_, Location::CmpAgreement | Location::CmpFailure) => EventType::CmpConcluded,
                (CommandKind::Vote, _) => EventType::VoteRecorded,
                (CommandKind::Advance, _) => EventType::ReadingAdvanced,
                // arrival after transit and hand-over after the committee
                _ => continue,
            };

            let mut event = Self::new(event_type, text, record.to, record.timestamp);
            event.chamber = record.to.chamber().or_else(|| record.from.chamber());
            match event_type {
                EventType::TextTransmitted => event.shuttle_count = Some(text.shuttle_count()),
                EventType::CmpConcluded => event.cmp_result = text.cmp().and_then(|c| c.result),
                _ => {}
            }
            events.push(event);
        }
        events
    }

    pub fn title(&self) -> String {
        let marker = if self.urgency { " [urgent]" } else { "" };
        format!("{} {}{}", self.event_type.as_str(), self.reference, marker)
    }
}

/// Sink for shuttle notifications. Delivery is best effort and must not fail
/// the command that produced the event.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &ShuttleEvent);
}

/// Writes every event to the structured log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &ShuttleEvent) {
        if !event.event_type.is_milestone() {
            debug!(
                event = event.event_type.as_str(),
                text_id = %event.text_id,
                location = %event.location,
                "Shuttle notification"
            );
            return;
        }

        if event.urgency {
            warn!(
                event = event.event_type.as_str(),
                text_id = %event.text_id,
                reference = %event.reference,
                location = %event.location,
                "Milestone reached by urgent text"
            );
        } else {
            info!(
                event = event.event_type.as_str(),
                text_id = %event.text_id,
                reference = %event.reference,
                location = %event.location,
                "Shuttle milestone"
            );
        }
    }
}

/// Fans events out to in-process subscribers
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<ShuttleEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShuttleEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn notify(&self, event: &ShuttleEvent) {
        match self.sender.send(event.clone()) {
            Ok(receivers) => debug!(receivers, event = event.event_type.as_str(), "Event broadcast"),
            Err(_) => warn!(event = event.event_type.as_str(), "No subscriber for shuttle event"),
        }
    }
}

/// Drops every event
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _event: &ShuttleEvent) {}
}
