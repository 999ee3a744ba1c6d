// Read projection consumed by rendering collaborators

use serde::{Deserialize, Serialize};

use super::command::Command;
use super::graph::LocationGraph;
use super::location::{Chamber, Location};
use super::machine::{is_legal, TransitionRules};
use super::phase::{phase_board, phase_of, Phase, PhaseView};
use super::text::{LegislativeText, TextId, Timestamps};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextProjection {
    pub text_id: TextId,
    pub reference: String,
    pub title: String,
    pub origin: Chamber,
    pub current_location: Location,
    pub phase: Phase,
    pub phase_ordinal: u8,
    pub shuttle_count: u32,
    pub reading_number: u32,
    pub is_in_transit: bool,
    pub can_transmit: bool,
    pub can_convene_cmp: bool,
    pub is_terminal: bool,
    pub urgency: bool,
    pub timestamps: Timestamps,
    pub phases: Vec<PhaseView>,
}

impl TextProjection {
    pub fn of(text: &LegislativeText, rules: &TransitionRules) -> Self {
        let location = text.current_location();
        let phase = phase_of(location, text.origin(), text.shuttle_count());
        Self {
            text_id: text.id(),
            reference: text.reference().to_string(),
            title: text.title().to_string(),
            origin: text.origin(),
            current_location: location,
            phase,
            phase_ordinal: phase.ordinal(),
            shuttle_count: text.shuttle_count(),
            reading_number: text.reading_number(),
            is_in_transit: location.is_in_transit(),
            can_transmit: is_legal(text, &Command::Transmit, rules),
            can_convene_cmp: is_legal(text, &Command::ConveneCmp, rules),
            is_terminal: LocationGraph::new().is_terminal(location),
            urgency: text.urgency(),
            timestamps: text.timestamps().clone(),
            phases: phase_board(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuttle::command::VoteOutcome;
    use crate::shuttle::machine::apply;
    use chrono::Utc;

    #[test]
    fn test_projection_of_fresh_text() {
        let text = LegislativeText::deposit(Chamber::Assembly, "Budget 2025", "PL-2025-001", true, Utc::now()).unwrap();
        let view = TextProjection::of(&text, &TransitionRules::default());
        assert_eq!(view.current_location, Location::AnDepot);
        assert_eq!(view.phase_ordinal, 0);
        assert!(!view.can_transmit);
        assert!(!view.can_convene_cmp);
        assert!(!view.is_in_transit);
        assert!(!view.is_terminal);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["current_location"], "AN_DEPOT");
        assert_eq!(json["phase"], "DEPOSIT");
    }

    #[test]
    fn test_transmit_offered_only_after_adoption() {
        let rules = TransitionRules::default();
        let mut text = LegislativeText::deposit(Chamber::Assembly, "Budget 2025", "PL-2025-001", false, Utc::now()).unwrap();
        for _ in 0..4 {
            apply(&mut text, &Command::Advance, Utc::now(), &rules).unwrap();
        }
        assert!(!TextProjection::of(&text, &rules).can_transmit);

        let vote = Command::Vote {
            chamber: Chamber::Assembly,
            outcome: VoteOutcome::Adopted,
        };
        apply(&mut text, &vote, Utc::now(), &rules).unwrap();
        let view = TextProjection::of(&text, &rules);
        assert_eq!(view.current_location, Location::AnAdopted);
        assert!(view.can_transmit);

        apply(&mut text, &Command::Transmit, Utc::now(), &rules).unwrap();
        let view = TextProjection::of(&text, &rules);
        assert_eq!(view.current_location, Location::SnBureau);
        assert!(!view.can_transmit);
        assert!(!view.is_in_transit);
    }
}
