// The legislative text aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::cmp::CmpProceedings;
use super::command::CommandKind;
use super::error::EngineError;
use super::location::{Chamber, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextId(pub Uuid);

impl TextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TextId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(TextId)
            .map_err(|e| EngineError::InvalidText(format!("invalid text id '{s}': {e}")))
    }
}

/// Procedural timestamps, each set at most once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub deposited_at: DateTime<Utc>,
    pub transmitted_at: Option<DateTime<Utc>>,
    pub adopted_at: Option<DateTime<Utc>>,
    pub promulgated_at: Option<DateTime<Utc>>,
}

impl Timestamps {
    /// Present timestamps never go backwards in deposit → transmit → adopt → promulgate order
    pub fn is_ordered(&self) -> bool {
        let chain = [
            Some(self.deposited_at),
            self.transmitted_at,
            self.adopted_at,
            self.promulgated_at,
        ];
        let present: Vec<DateTime<Utc>> = chain.into_iter().flatten().collect();
        present.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Per-chamber reading bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChamberRecord {
    /// Times the text entered this chamber's bureau
    pub bureau_arrivals: u32,
    /// Readings that ended with the chamber passing the text
    pub completed_readings: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChamberReadings {
    pub assembly: ChamberRecord,
    pub senate: ChamberRecord,
}

impl ChamberReadings {
    pub fn get(&self, chamber: Chamber) -> &ChamberRecord {
        match chamber {
            Chamber::Assembly => &self.assembly,
            Chamber::Senate => &self.senate,
        }
    }

    pub(super) fn get_mut(&mut self, chamber: Chamber) -> &mut ChamberRecord {
        match chamber {
            Chamber::Assembly => &mut self.assembly,
            Chamber::Senate => &mut self.senate,
        }
    }
}

/// One hop of the state machine, as recorded in the history feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub sequence: u64,
    pub from: Location,
    pub to: Location,
    pub command: CommandKind,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate root, one per bill.
///
/// Fields are only writable from inside the `shuttle` module; the location
/// changes exclusively through [`crate::shuttle::machine::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegislativeText {
    pub(super) id: TextId,
    pub(super) reference: String,
    pub(super) title: String,
    pub(super) origin: Chamber,
    pub(super) location: Location,
    pub(super) reading_number: u32,
    pub(super) shuttle_count: u32,
    pub(super) urgency: bool,
    pub(super) timestamps: Timestamps,
    pub(super) readings: ChamberReadings,
    pub(super) divergent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) cmp: Option<CmpProceedings>,
    #[serde(default)]
    pub(super) history: Vec<TransitionRecord>,
}

impl LegislativeText {
    /// A freshly deposited text, sitting in its origin chamber's depot
    pub fn deposit(
        origin: Chamber,
        title: impl Into<String>,
        reference: impl Into<String>,
        urgency: bool,
        now: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        let title = title.into();
        let reference = reference.into();
        if title.trim().is_empty() {
            return Err(EngineError::InvalidText("title must not be blank".to_string()));
        }
        if reference.trim().is_empty() {
            return Err(EngineError::InvalidText("reference must not be blank".to_string()));
        }

        Ok(Self {
            id: TextId::new(),
            reference,
            title,
            origin,
            location: origin.depot(),
            reading_number: 1,
            shuttle_count: 0,
            urgency,
            timestamps: Timestamps {
                deposited_at: now,
                transmitted_at: None,
                adopted_at: None,
                promulgated_at: None,
            },
            readings: ChamberReadings::default(),
            divergent: false,
            cmp: None,
            history: Vec::new(),
        })
    }

    pub fn id(&self) -> TextId {
        self.id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn origin(&self) -> Chamber {
        self.origin
    }

    pub fn current_location(&self) -> Location {
        self.location
    }

    pub fn reading_number(&self) -> u32 {
        self.reading_number
    }

    pub fn shuttle_count(&self) -> u32 {
        self.shuttle_count
    }

    pub fn urgency(&self) -> bool {
        self.urgency
    }

    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    pub fn readings(&self) -> &ChamberReadings {
        &self.readings
    }

    pub fn is_divergent(&self) -> bool {
        self.divergent
    }

    pub fn cmp(&self) -> Option<&CmpProceedings> {
        self.cmp.as_ref()
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    pub fn visited_cmp(&self) -> bool {
        self.history.iter().any(|r| r.to.is_cmp())
    }

    pub fn is_promulgated(&self) -> bool {
        self.location == Location::Promulgated
    }
}
