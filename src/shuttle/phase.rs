//! Phase resolver.
//!
//! Collapses the fine-grained location graph into six ordered phases for
//! progress reporting. The mapping is an exhaustive `match` over the closed
//! [`Location`] enum, so every location has a phase by construction; names
//! coming from outside go through [`phase_ordinal_of_name`], which fails with
//! [`EngineError::UnknownLocation`] instead of falling back to phase 0.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::EngineError;
use super::location::{Chamber, Location};
use super::text::LegislativeText;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Deposit,
    FirstReadingOrigin,
    ShuttleToSecond,
    FirstReadingSecond,
    /// Only visited on persistent disagreement
    Cmp,
    Promulgation,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Deposit,
        Phase::FirstReadingOrigin,
        Phase::ShuttleToSecond,
        Phase::FirstReadingSecond,
        Phase::Cmp,
        Phase::Promulgation,
    ];

    pub fn ordinal(self) -> u8 {
        match self {
            Phase::Deposit => 0,
            Phase::FirstReadingOrigin => 1,
            Phase::ShuttleToSecond => 2,
            Phase::FirstReadingSecond => 3,
            Phase::Cmp => 4,
            Phase::Promulgation => 5,
        }
    }

    pub fn is_optional(self) -> bool {
        self == Phase::Cmp
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Deposit => "DEPOSIT",
            Phase::FirstReadingOrigin => "FIRST_READING_ORIGIN",
            Phase::ShuttleToSecond => "SHUTTLE_TO_SECOND",
            Phase::FirstReadingSecond => "FIRST_READING_SECOND",
            Phase::Cmp => "CMP",
            Phase::Promulgation => "PROMULGATION",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of `location` for a text deposited in `origin` that has been
/// transmitted `shuttle_count` times.
///
/// Chamber locations count as the origin reading only while the text is in
/// its origin chamber and has never left it; every later reading round, in
/// either chamber, belongs to the inter-chamber phase.
pub fn phase_of(location: Location, origin: Chamber, shuttle_count: u32) -> Phase {
    match location {
        Location::AnDepot | Location::SnDepot => Phase::Deposit,
        Location::AnBureau
        | Location::AnCommission
        | Location::AnPleniere
        | Location::AnVote
        | Location::AnAdopted
        | Location::AnRejected => chamber_phase(Chamber::Assembly, origin, shuttle_count),
        Location::SnBureau
        | Location::SnCommission
        | Location::SnPleniere
        | Location::SnVote
        | Location::SnAdopted
        | Location::SnRejected => chamber_phase(Chamber::Senate, origin, shuttle_count),
        Location::NavetteAnToSn | Location::NavetteSnToAn => Phase::ShuttleToSecond,
        Location::CmpConvened
        | Location::CmpInProgress
        | Location::CmpAgreement
        | Location::CmpFailure => Phase::Cmp,
        Location::FinalAn | Location::FinalSn | Location::Adopted | Location::Promulgated => {
            Phase::Promulgation
        }
    }
}

fn chamber_phase(chamber: Chamber, origin: Chamber, shuttle_count: u32) -> Phase {
    if chamber == origin && shuttle_count == 0 {
        Phase::FirstReadingOrigin
    } else {
        Phase::FirstReadingSecond
    }
}

pub fn phase_ordinal(location: Location, origin: Chamber, shuttle_count: u32) -> u8 {
    phase_of(location, origin, shuttle_count).ordinal()
}

/// Ordinal for a location given by wire name, e.g. from an external store
pub fn phase_ordinal_of_name(name: &str, origin: Chamber, shuttle_count: u32) -> Result<u8, EngineError> {
    let location: Location = name.parse()?;
    Ok(phase_ordinal(location, origin, shuttle_count))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    Active,
    Upcoming,
    /// CMP phase that the text never needed
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseView {
    pub phase: Phase,
    pub ordinal: u8,
    pub status: PhaseStatus,
    pub optional: bool,
}

pub fn status_of(phase: Phase, current: Phase) -> PhaseStatus {
    match phase.ordinal().cmp(&current.ordinal()) {
        std::cmp::Ordering::Less => PhaseStatus::Completed,
        std::cmp::Ordering::Equal => PhaseStatus::Active,
        std::cmp::Ordering::Greater => PhaseStatus::Upcoming,
    }
}

/// Status of all six phases for `text`
pub fn phase_board(text: &LegislativeText) -> Vec<PhaseView> {
    let current = phase_of(text.current_location(), text.origin(), text.shuttle_count());
    let cmp_skipped = matches!(text.current_location(), Location::Adopted | Location::Promulgated)
        && !text.visited_cmp();

    Phase::ALL
        .iter()
        .map(|&phase| {
            let status = if phase == Phase::Cmp && cmp_skipped {
                PhaseStatus::Skipped
            } else {
                status_of(phase, current)
            };
            PhaseView {
                phase,
                ordinal: phase.ordinal(),
                status,
                optional: phase.is_optional(),
            }
        })
        .collect()
}
