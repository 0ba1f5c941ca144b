//! Scan reconciliation
//!
//! Applies one barcode scan to an event's checklist and, for returns, to the
//! inventory. Nothing here fails: unknown events are ignored, unknown codes are
//! logged as `MISSING`, and over-returns are clamped to the open balance.
//!
//! Outbound scans only move the checklist tally. The matching inventory debit
//! happens when an outbound slip is signed (see [`crate::slip`]).

use crate::barcode;
use crate::checklist::{Direction, LogStatus, ScanLogEntry, ScanStatus};
use crate::json_helpers::deserialize_opt_quantity;
use crate::model::{AppState, StockBucket};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scan captured by the scanner input or typed in by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanCommand {
    pub event_id: String,
    pub barcode: String,
    pub direction: Direction,
    /// Only meaningful for `IN`; defaults to `OK`
    #[serde(default)]
    pub status: Option<ScanStatus>,
    /// Defaults to 1; fractional input is rounded
    #[serde(default, deserialize_with = "deserialize_opt_quantity")]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
}

impl ScanCommand {
    #[must_use]
    pub fn new(event_id: impl Into<String>, barcode: impl Into<String>, direction: Direction) -> Self {
        Self {
            event_id: event_id.into(),
            barcode: barcode.into(),
            direction,
            status: None,
            quantity: None,
            note: None,
        }
    }

    #[must_use]
    pub fn outbound(event_id: impl Into<String>, barcode: impl Into<String>, quantity: u32) -> Self {
        Self::new(event_id, barcode, Direction::Out).with_quantity(quantity)
    }

    #[must_use]
    pub fn inbound(
        event_id: impl Into<String>,
        barcode: impl Into<String>,
        status: ScanStatus,
        quantity: u32,
    ) -> Self {
        let mut cmd = Self::new(event_id, barcode, Direction::In).with_quantity(quantity);
        cmd.status = Some(status);
        cmd
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Requested quantity, at least 1.
    #[must_use]
    pub fn requested_quantity(&self) -> u32 {
        self.quantity.unwrap_or(1).max(1)
    }

    fn supplied_note(&self) -> Option<String> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

/// What a scan did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// No event with the command's id; nothing changed
    UnknownEvent,
    /// Code did not resolve; only a `MISSING` log entry was added
    Unresolved { barcode: String },
    /// Tallies (and, for returns, inventory) were updated
    Recorded {
        item_id: String,
        direction: Direction,
        status: ScanStatus,
        requested: u32,
        applied: u32,
    },
}

fn bucket_for(status: ScanStatus) -> StockBucket {
    match status {
        ScanStatus::Ok => StockBucket::Available,
        ScanStatus::Damaged => StockBucket::Broken,
        ScanStatus::Lost => StockBucket::Lost,
    }
}

/// Apply `cmd` to `state` in place.
pub fn apply_scan(state: &mut AppState, cmd: &ScanCommand) -> ScanOutcome {
    let Some(event_idx) = state.events.iter().position(|e| e.id == cmd.event_id) else {
        log::debug!("scan for unknown event {} ignored", cmd.event_id);
        return ScanOutcome::UnknownEvent;
    };

    let requested = cmd.requested_quantity();
    let code = barcode::normalize(&cmd.barcode);
    let note = cmd.supplied_note();
    let resolved = barcode::find_by_barcode(&state.inventory, &cmd.barcode)
        .map(|item| (item.id.clone(), item.name.clone()));

    let Some((item_id, item_name)) = resolved else {
        log::warn!(
            "event {}: unresolved {} scan of '{}'",
            cmd.event_id,
            cmd.direction,
            code
        );
        let entry = ScanLogEntry {
            id: Uuid::new_v4().to_string(),
            item_id: None,
            item_name: None,
            barcode: code.clone(),
            direction: cmd.direction,
            status: LogStatus::Missing,
            quantity: requested,
            note,
            timestamp: Utc::now(),
        };
        state.events[event_idx].checklist.push_log(entry);
        return ScanOutcome::Unresolved { barcode: code };
    };

    let (status, applied) = match cmd.direction {
        Direction::Out => {
            let event = &mut state.events[event_idx];
            event.checklist.outbound.add(&item_id, requested);
            (ScanStatus::Ok, requested)
        }
        Direction::In => {
            let status = cmd.status.unwrap_or_default();
            let event = &mut state.events[event_idx];
            let remaining = event.allocation(&item_id).map_or(0, |a| a.remaining());
            let applied = if remaining > 0 {
                requested.min(remaining)
            } else {
                requested
            };
            if applied < requested {
                log::debug!(
                    "event {}: return of {} x{} clamped to open balance {}",
                    event.id,
                    item_id,
                    requested,
                    applied
                );
            }

            let checklist = &mut event.checklist;
            checklist.inbound.add(&item_id, applied);
            match status {
                ScanStatus::Damaged => {
                    checklist.damaged.add(&item_id, applied);
                }
                ScanStatus::Lost => {
                    checklist.lost.add(&item_id, applied);
                }
                ScanStatus::Ok => {}
            }
            if let Some(note) = &note {
                checklist.notes.insert(item_id.clone(), note.clone());
            }

            let allocation = event.allocation_or_insert(&item_id);
            allocation.returned_quantity = allocation.returned_quantity.saturating_add(applied);

            if let Some(item) = state.item_mut(&item_id) {
                item.return_from_use(bucket_for(status), applied);
            }
            (status, applied)
        }
    };

    let entry = ScanLogEntry {
        id: Uuid::new_v4().to_string(),
        item_id: Some(item_id.clone()),
        item_name: Some(item_name),
        barcode: code,
        direction: cmd.direction,
        status: status.into(),
        quantity: applied,
        note,
        timestamp: Utc::now(),
    };
    state.events[event_idx].checklist.push_log(entry);

    ScanOutcome::Recorded {
        item_id,
        direction: cmd.direction,
        status,
        requested,
        applied,
    }
}

/// By-value form of [`apply_scan`].
#[must_use]
pub fn scan(mut state: AppState, cmd: &ScanCommand) -> AppState {
    apply_scan(&mut state, cmd);
    state
}
