// Shuttle and reading counters.
//
// Both counters are derived from hops: nothing outside this module writes
// `shuttle_count` or `reading_number`.

use chrono::{DateTime, Utc};

use super::location::Location;
use super::text::LegislativeText;

/// Bookkeeping for a hop into `to`. Called by the validator for every hop.
pub(super) fn on_enter(text: &mut LegislativeText, to: Location, now: DateTime<Utc>) {
    if to.is_in_transit() {
        record_transmission(text, now);
    }
    if to.is_bureau() {
        record_bureau_arrival(text, to);
    }
}

fn record_transmission(text: &mut LegislativeText, now: DateTime<Utc>) {
    text.shuttle_count += 1;
    if text.timestamps.transmitted_at.is_none() {
        text.timestamps.transmitted_at = Some(now);
    }
    tracing::debug!(
        text_id = %text.id,
        shuttle_count = text.shuttle_count,
        "Shuttle count incremented"
    );
}

fn record_bureau_arrival(text: &mut LegislativeText, bureau: Location) {
    let Some(chamber) = bureau.chamber() else {
        return;
    };
    let record = text.readings.get_mut(chamber);
    record.bureau_arrivals += 1;
    // First arrival at a bureau is part of reading one; every re-entry opens a new reading
    if record.bureau_arrivals > 1 {
        text.reading_number += 1;
        tracing::debug!(
            text_id = %text.id,
            bureau = %bureau,
            reading_number = text.reading_number,
            "New reading opened"
        );
    }
}

/// Shuttles counted straight from the history feed
pub fn shuttles_in_history(text: &LegislativeText) -> u32 {
    text.history().iter().filter(|r| r.to.is_in_transit()).count() as u32
}
