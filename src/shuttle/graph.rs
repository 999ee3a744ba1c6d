// Static graph of legal procedural transitions.
//
// Every hop the engine makes is looked up here; nothing else in the crate
// decides which location follows which.

use serde::{Deserialize, Serialize};

use super::location::Location;
use super::location::Location::*;

/// Outcome of a joint committee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CmpResult {
    Agreement,
    Failure,
}

/// What fires an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Next procedural step inside a chamber (or final Senate reading)
    Advance,
    /// Chamber vote passed the text, with or without amendments
    Pass,
    /// Chamber vote rejected the text
    Reject,
    Transmit,
    /// Transmission reaches the receiving chamber
    Arrive,
    /// Both chambers hold identical versions
    Conform,
    Convene,
    OpenDeliberations,
    Conclude(CmpResult),
    /// Committee text goes back to the chambers for the final readings
    HandOver,
    Promulgate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: Location,
    pub trigger: Trigger,
    pub to: Location,
}

const fn edge(from: Location, trigger: Trigger, to: Location) -> Edge {
    Edge { from, trigger, to }
}

static EDGES: &[Edge] = &[
    // Assemblée nationale reading
    edge(AnDepot, Trigger::Advance, AnBureau),
    edge(AnBureau, Trigger::Advance, AnCommission),
    edge(AnCommission, Trigger::Advance, AnPleniere),
    edge(AnPleniere, Trigger::Advance, AnVote),
    edge(AnVote, Trigger::Pass, AnAdopted),
    edge(AnVote, Trigger::Reject, AnRejected),
    // Sénat reading
    edge(SnDepot, Trigger::Advance, SnBureau),
    edge(SnBureau, Trigger::Advance, SnCommission),
    edge(SnCommission, Trigger::Advance, SnPleniere),
    edge(SnPleniere, Trigger::Advance, SnVote),
    edge(SnVote, Trigger::Pass, SnAdopted),
    edge(SnVote, Trigger::Reject, SnRejected),
    // Shuttle
    edge(AnAdopted, Trigger::Transmit, NavetteAnToSn),
    edge(NavetteAnToSn, Trigger::Arrive, SnBureau),
    edge(SnAdopted, Trigger::Transmit, NavetteSnToAn),
    edge(NavetteSnToAn, Trigger::Arrive, AnBureau),
    // Identical adoption
    edge(AnAdopted, Trigger::Conform, Adopted),
    edge(SnAdopted, Trigger::Conform, Adopted),
    // Joint committee
    edge(AnAdopted, Trigger::Convene, CmpConvened),
    edge(SnAdopted, Trigger::Convene, CmpConvened),
    edge(CmpConvened, Trigger::OpenDeliberations, CmpInProgress),
    edge(CmpInProgress, Trigger::Conclude(CmpResult::Agreement), CmpAgreement),
    edge(CmpInProgress, Trigger::Conclude(CmpResult::Failure), CmpFailure),
    edge(CmpAgreement, Trigger::HandOver, FinalAn),
    edge(CmpFailure, Trigger::HandOver, FinalAn),
    // Final readings. On failure the Assemblée has the last word and the
    // Sénat reading is bypassed.
    edge(FinalAn, Trigger::Advance, FinalSn),
    edge(FinalAn, Trigger::Promulgate, Promulgated),
    edge(FinalSn, Trigger::Promulgate, Promulgated),
    edge(Adopted, Trigger::Promulgate, Promulgated),
];

/// Read-only view over the edge table
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationGraph;

impl LocationGraph {
    pub fn new() -> Self {
        Self
    }

    /// Target of `trigger` from `from`, if that edge exists
    pub fn successor(&self, from: Location, trigger: Trigger) -> Option<Location> {
        EDGES
            .iter()
            .find(|e| e.from == from && e.trigger == trigger)
            .map(|e| e.to)
    }

    pub fn successors(&self, from: Location) -> Vec<Location> {
        let mut out: Vec<Location> = Vec::new();
        for e in EDGES.iter().filter(|e| e.from == from) {
            if !out.contains(&e.to) {
                out.push(e.to);
            }
        }
        out
    }

    pub fn allows(&self, from: Location, to: Location) -> bool {
        EDGES.iter().any(|e| e.from == from && e.to == to)
    }

    /// No outgoing edge at all
    pub fn is_terminal(&self, location: Location) -> bool {
        !EDGES.iter().any(|e| e.from == location)
    }
}
