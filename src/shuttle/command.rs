// Commands accepted by the engine, one variant per procedural act

use serde::{Deserialize, Serialize};
use std::fmt;

use super::graph::CmpResult;
use super::location::Chamber;
use super::text::TextId;

/// Result of a chamber vote as reported by the tally service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteOutcome {
    /// Passed without modification
    Adopted,
    /// Passed with amendments
    Amended,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Advance,
    Vote { chamber: Chamber, outcome: VoteOutcome },
    Transmit,
    ConveneCmp,
    OpenCmp,
    ResolveCmp { result: CmpResult },
    Promulgate,
}

/// Payload-free command tag, used in history records and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Advance,
    Vote,
    Transmit,
    ConveneCmp,
    OpenCmp,
    ResolveCmp,
    Promulgate,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Advance => CommandKind::Advance,
            Command::Vote { .. } => CommandKind::Vote,
            Command::Transmit => CommandKind::Transmit,
            Command::ConveneCmp => CommandKind::ConveneCmp,
            Command::OpenCmp => CommandKind::OpenCmp,
            Command::ResolveCmp { .. } => CommandKind::ResolveCmp,
            Command::Promulgate => CommandKind::Promulgate,
        }
    }
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Advance => "advance",
            CommandKind::Vote => "vote",
            CommandKind::Transmit => "transmit",
            CommandKind::ConveneCmp => "convene_cmp",
            CommandKind::OpenCmp => "open_cmp",
            CommandKind::ResolveCmp => "resolve_cmp",
            CommandKind::Promulgate => "promulgate",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vote outcome event from the tally service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEvent {
    pub text_id: TextId,
    pub chamber: Chamber,
    pub outcome: VoteOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitteeAction {
    Convene,
    Open,
    Resolve,
}

/// Command from the committee-management service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeCommand {
    pub text_id: TextId,
    pub action: CommitteeAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CmpResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serializes_as_tagged_variant() {
        let command = Command::Vote {
            chamber: Chamber::Senate,
            outcome: VoteOutcome::Amended,
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["type"], "vote");
        assert_eq!(json["chamber"], "SENATE");
        assert_eq!(json["outcome"], "AMENDED");
        assert_eq!(command.kind(), CommandKind::Vote);
    }

    #[test]
    fn test_committee_command_without_result() {
        let json = r#"{"text_id":"6f1c1f3c-3b1e-4d8f-9a52-0e7f4f5a9b11","action":"CONVENE"}"#;
        let command: CommitteeCommand = serde_json::from_str(json).unwrap();
        assert_eq!(command.action, CommitteeAction::Convene);
        assert_eq!(command.result, None);
    }
}
