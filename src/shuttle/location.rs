// Procedural locations a legislative text can occupy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::EngineError;

/// One of the two chambers of Parliament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Chamber {
    /// Assemblée nationale
    Assembly,
    /// Sénat
    Senate,
}

impl Chamber {
    pub fn other(self) -> Chamber {
        match self {
            Chamber::Assembly => Chamber::Senate,
            Chamber::Senate => Chamber::Assembly,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Chamber::Assembly => "ASSEMBLY",
            Chamber::Senate => "SENATE",
        }
    }

    /// Where a text deposited in this chamber starts
    pub fn depot(self) -> Location {
        match self {
            Chamber::Assembly => Location::AnDepot,
            Chamber::Senate => Location::SnDepot,
        }
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chamber {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASSEMBLY" | "AN" => Ok(Chamber::Assembly),
            "SENATE" | "SN" => Ok(Chamber::Senate),
            other => Err(EngineError::InvalidCommand(format!("unknown chamber '{other}'"))),
        }
    }
}

/// Closed set of procedural locations.
///
/// The wire name of every variant is its SCREAMING_SNAKE form (`AN_DEPOT`,
/// `NAVETTE_AN_TO_SN`, ...). Anything else fails to parse with
/// [`EngineError::UnknownLocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Location {
    AnDepot,
    AnBureau,
    AnCommission,
    AnPleniere,
    AnVote,
    AnAdopted,
    AnRejected,
    SnDepot,
    SnBureau,
    SnCommission,
    SnPleniere,
    SnVote,
    SnAdopted,
    SnRejected,
    NavetteAnToSn,
    NavetteSnToAn,
    CmpConvened,
    CmpInProgress,
    CmpAgreement,
    CmpFailure,
    FinalAn,
    FinalSn,
    Adopted,
    Promulgated,
}

/// Position of a location inside a chamber's reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Depot,
    Bureau,
    Commission,
    Pleniere,
    Vote,
    Adopted,
    Rejected,
}

impl Location {
    pub const ALL: [Location; 24] = [
        Location::AnDepot,
        Location::AnBureau,
        Location::AnCommission,
        Location::AnPleniere,
        Location::AnVote,
        Location::AnAdopted,
        Location::AnRejected,
        Location::SnDepot,
        Location::SnBureau,
        Location::SnCommission,
        Location::SnPleniere,
        Location::SnVote,
        Location::SnAdopted,
        Location::SnRejected,
        Location::NavetteAnToSn,
        Location::NavetteSnToAn,
        Location::CmpConvened,
        Location::CmpInProgress,
        Location::CmpAgreement,
        Location::CmpFailure,
        Location::FinalAn,
        Location::FinalSn,
        Location::Adopted,
        Location::Promulgated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Location::AnDepot => "AN_DEPOT",
            Location::AnBureau => "AN_BUREAU",
            Location::AnCommission => "AN_COMMISSION",
            Location::AnPleniere => "AN_PLENIERE",
            Location::AnVote => "AN_VOTE",
            Location::AnAdopted => "AN_ADOPTED",
            Location::AnRejected => "AN_REJECTED",
            Location::SnDepot => "SN_DEPOT",
            Location::SnBureau => "SN_BUREAU",
            Location::SnCommission => "SN_COMMISSION",
            Location::SnPleniere => "SN_PLENIERE",
            Location::SnVote => "SN_VOTE",
            Location::SnAdopted => "SN_ADOPTED",
            Location::SnRejected => "SN_REJECTED",
            Location::NavetteAnToSn => "NAVETTE_AN_TO_SN",
            Location::NavetteSnToAn => "NAVETTE_SN_TO_AN",
            Location::CmpConvened => "CMP_CONVENED",
            Location::CmpInProgress => "CMP_IN_PROGRESS",
            Location::CmpAgreement => "CMP_AGREEMENT",
            Location::CmpFailure => "CMP_FAILURE",
            Location::FinalAn => "FINAL_AN",
            Location::FinalSn => "FINAL_SN",
            Location::Adopted => "ADOPTED",
            Location::Promulgated => "PROMULGATED",
        }
    }

    /// The chamber and reading stage for locations that belong to one chamber
    pub fn chamber_stage(self) -> Option<(Chamber, Stage)> {
        use Chamber::*;
        let pair = match self {
            Location::AnDepot => (Assembly, Stage::Depot),
            Location::AnBureau => (Assembly, Stage::Bureau),
            Location::AnCommission => (Assembly, Stage::Commission),
            Location::AnPleniere => (Assembly, Stage::Pleniere),
            Location::AnVote => (Assembly, Stage::Vote),
            Location::AnAdopted => (Assembly, Stage::Adopted),
            Location::AnRejected => (Assembly, Stage::Rejected),
            Location::SnDepot => (Senate, Stage::Depot),
            Location::SnBureau => (Senate, Stage::Bureau),
            Location::SnCommission => (Senate, Stage::Commission),
            Location::SnPleniere => (Senate, Stage::Pleniere),
            Location::SnVote => (Senate, Stage::Vote),
            Location::SnAdopted => (Senate, Stage::Adopted),
            Location::SnRejected => (Senate, Stage::Rejected),
            Location::NavetteAnToSn
            | Location::NavetteSnToAn
            | Location::CmpConvened
            | Location::CmpInProgress
            | Location::CmpAgreement
            | Location::CmpFailure
            | Location::FinalAn
            | Location::FinalSn
            | Location::Adopted
            | Location::Promulgated => return None,
        };
        Some(pair)
    }

    pub fn chamber(self) -> Option<Chamber> {
        self.chamber_stage().map(|(chamber, _)| chamber)
    }

    pub fn is_in_transit(self) -> bool {
        matches!(self, Location::NavetteAnToSn | Location::NavetteSnToAn)
    }

    pub fn is_cmp(self) -> bool {
        matches!(
            self,
            Location::CmpConvened
                | Location::CmpInProgress
                | Location::CmpAgreement
                | Location::CmpFailure
        )
    }

    pub fn is_bureau(self) -> bool {
        matches!(self, Location::AnBureau | Location::SnBureau)
    }

    /// Markers the engine passes through but never rests on
    pub fn is_transient(self) -> bool {
        self.is_in_transit() || matches!(self, Location::CmpAgreement | Location::CmpFailure)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .iter()
            .copied()
            .find(|location| location.as_str() == s)
            .ok_or_else(|| EngineError::UnknownLocation(s.to_string()))
    }
}
