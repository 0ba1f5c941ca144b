//! The per-event movement ledger
//!
//! An [`EventChecklist`] holds cumulative outbound/inbound/damaged/lost tallies,
//! the latest note per item, a capped scan log, the signature pairs collected
//! for each direction and the signed slips. It is only mutated by the scan and
//! signature reducers.

use crate::json_helpers::{deserialize_quantity, LenientQuantity};
use crate::model::{Event, InventoryItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Most recent scan log entries kept per event.
pub const LOG_CAPACITY: usize = 50;

/// Movement direction of a scan, signature or slip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Leaving the warehouse
    #[default]
    #[serde(rename = "OUT")]
    Out,
    /// Returning to the warehouse
    #[serde(rename = "IN")]
    In,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Out => f.write_str("OUT"),
            Direction::In => f.write_str("IN"),
        }
    }
}

/// Condition of returned equipment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanStatus {
    #[default]
    Ok,
    Damaged,
    Lost,
}

/// Status recorded on a scan log entry; `Missing` marks an unresolved code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogStatus {
    #[default]
    Ok,
    Damaged,
    Lost,
    Missing,
}

impl From<ScanStatus> for LogStatus {
    fn from(status: ScanStatus) -> Self {
        match status {
            ScanStatus::Ok => LogStatus::Ok,
            ScanStatus::Damaged => LogStatus::Damaged,
            ScanStatus::Lost => LogStatus::Lost,
        }
    }
}

/// Per-item quantities with an explicit zero default.
///
/// Values are read leniently (floats, numeric strings, `null`); a `null` tally
/// reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tally(BTreeMap<String, u32>);

impl<'de> Deserialize<'de> for Tally {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<BTreeMap<String, LenientQuantity>> = Option::deserialize(deserializer)?;
        Ok(Tally(
            raw.unwrap_or_default()
                .into_iter()
                .map(|(item_id, LenientQuantity(qty))| (item_id, qty))
                .collect(),
        ))
    }
}

impl Tally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity for `item_id`, zero when never counted.
    #[must_use]
    pub fn get(&self, item_id: &str) -> u32 {
        self.0.get(item_id).copied().unwrap_or(0)
    }

    /// Add `qty` to `item_id` and return the new total.
    pub fn add(&mut self, item_id: &str, qty: u32) -> u32 {
        let slot = self.0.entry(item_id.to_string()).or_insert(0);
        *slot = slot.saturating_add(qty);
        *slot
    }

    /// Item ids with a recorded quantity, in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum over all items.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().map(|&v| u64::from(v)).sum()
    }

    fn drop_zeroes(&mut self) {
        self.0.retain(|_, qty| *qty > 0);
    }
}

impl FromIterator<(String, u32)> for Tally {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for (item_id, qty) in iter {
            tally.add(&item_id, qty);
        }
        tally
    }
}

/// One processed scan, including unresolved ones.
///
/// Entries missing an `id` get one assigned by [`EventChecklist::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanLogEntry {
    pub id: String,
    pub item_id: Option<String>,
    pub item_name: Option<String>,
    pub barcode: String,
    pub direction: Direction,
    pub status: LogStatus,
    /// Quantity actually committed
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: u32,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One captured signature. `data_url` is the signature pad image, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Signature {
    pub name: String,
    pub title: Option<String>,
    pub note: Option<String>,
    pub signed_at: DateTime<Utc>,
    pub data_url: String,
    pub direction: Direction,
}

impl Signature {
    #[must_use]
    pub fn new(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            signed_at: Utc::now(),
            direction,
            ..Self::default()
        }
    }
}

/// Manager and operator signatures collected for one direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignaturePair {
    pub manager: Option<Signature>,
    pub operator: Option<Signature>,
    pub note: Option<String>,
    pub direction: Direction,
}

impl SignaturePair {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.manager.is_some() && self.operator.is_some()
    }
}

/// Signature pairs by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Signatures {
    pub outbound: Option<SignaturePair>,
    pub inbound: Option<SignaturePair>,
}

impl Signatures {
    #[must_use]
    pub fn get(&self, direction: Direction) -> Option<&SignaturePair> {
        match direction {
            Direction::Out => self.outbound.as_ref(),
            Direction::In => self.inbound.as_ref(),
        }
    }

    /// Pair for `direction`, created empty when absent.
    pub fn entry(&mut self, direction: Direction) -> &mut SignaturePair {
        let slot = match direction {
            Direction::Out => &mut self.outbound,
            Direction::In => &mut self.inbound,
        };
        slot.get_or_insert_with(|| SignaturePair {
            direction,
            ..SignaturePair::default()
        })
    }
}

/// Per-item movement snapshot; also the line item of a [`Slip`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChecklistRow {
    pub item_id: String,
    pub item_name: Option<String>,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub order_qty: u32,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub scanned_out: u32,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub scanned_in: u32,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub damaged: u32,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub lost: u32,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub missing: u32,
}

/// An immutable, two-signature record of one hand-off batch.
///
/// A stored slip without an `id` or `slipNo` is completed on load by
/// [`EventChecklist::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Slip {
    pub id: String,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub slip_no: u32,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
    pub manager: Signature,
    pub operator: Signature,
    pub note: Option<String>,
    pub items: Vec<ChecklistRow>,
}

impl Slip {
    /// Units covered by this slip in its own direction.
    #[must_use]
    pub fn quantity_for(&self, item_id: &str) -> u32 {
        self.items
            .iter()
            .filter(|row| row.item_id == item_id)
            .map(|row| match self.direction {
                Direction::Out => row.scanned_out,
                Direction::In => row.scanned_in,
            })
            .fold(0, u32::saturating_add)
    }
}

/// Full audit trail of physical movement for one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventChecklist {
    pub outbound: Tally,
    pub inbound: Tally,
    pub damaged: Tally,
    pub lost: Tally,
    pub notes: BTreeMap<String, String>,
    /// Newest first
    pub logs: Vec<ScanLogEntry>,
    pub signatures: Signatures,
    /// Newest first
    pub slips: Vec<Slip>,
}

impl EventChecklist {
    /// Prepend a log entry, keeping the newest [`LOG_CAPACITY`].
    pub fn push_log(&mut self, entry: ScanLogEntry) {
        self.logs.insert(0, entry);
        self.logs.truncate(LOG_CAPACITY);
    }

    /// Slips of one direction, newest first.
    pub fn slips_for(&self, direction: Direction) -> impl Iterator<Item = &Slip> {
        self.slips.iter().filter(move |s| s.direction == direction)
    }

    /// Sum of what earlier slips of `direction` already cover, per item.
    #[must_use]
    pub fn slipped_totals(&self, direction: Direction) -> Tally {
        let mut totals = Tally::new();
        for slip in self.slips_for(direction) {
            for row in &slip.items {
                let qty = match direction {
                    Direction::Out => row.scanned_out,
                    Direction::In => row.scanned_in,
                };
                totals.add(&row.item_id, qty);
            }
        }
        totals
    }

    /// Fill in defaults that older documents lack.
    pub fn normalize(&mut self) {
        self.outbound.drop_zeroes();
        self.inbound.drop_zeroes();
        self.damaged.drop_zeroes();
        self.lost.drop_zeroes();
        self.logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.logs.truncate(LOG_CAPACITY);
        if let Some(pair) = self.signatures.outbound.as_mut() {
            pair.direction = Direction::Out;
        }
        if let Some(pair) = self.signatures.inbound.as_mut() {
            pair.direction = Direction::In;
        }
        for entry in self.logs.iter_mut().filter(|e| e.id.is_empty()) {
            entry.id = Uuid::new_v4().to_string();
        }

        self.slips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for direction in [Direction::Out, Direction::In] {
            let mut last = 0;
            // Oldest first so unnumbered slips continue the sequence
            for slip in self.slips.iter_mut().rev().filter(|s| s.direction == direction) {
                if slip.slip_no == 0 {
                    slip.slip_no = last + 1;
                }
                last = last.max(slip.slip_no);
            }
        }
        for slip in &mut self.slips {
            if slip.id.is_empty() {
                slip.id = Uuid::new_v4().to_string();
            }
        }
    }
}

/// Units of `item_id` still unaccounted for: `max(0, order - inbound - lost)`.
#[must_use]
pub fn missing(event: &Event, item_id: &str) -> u32 {
    let checklist = &event.checklist;
    event
        .order_quantity(item_id)
        .saturating_sub(checklist.inbound.get(item_id))
        .saturating_sub(checklist.lost.get(item_id))
}

/// Current snapshot of every item touched by `event`.
///
/// Rows follow allocation order, then any other item with an outbound or
/// inbound tally in key order.
#[must_use]
pub fn rows(event: &Event, inventory: &[InventoryItem]) -> Vec<ChecklistRow> {
    let checklist = &event.checklist;
    let mut ids: Vec<&str> = Vec::new();
    let allocated = event.items.iter().map(|a| a.item_id.as_str());
    let tallied = checklist.outbound.keys().chain(checklist.inbound.keys());
    for id in allocated.chain(tallied) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    ids.into_iter()
        .map(|item_id| ChecklistRow {
            item_id: item_id.to_string(),
            item_name: inventory
                .iter()
                .find(|i| i.id == item_id)
                .map(|i| i.name.clone()),
            order_qty: event.order_quantity(item_id),
            scanned_out: checklist.outbound.get(item_id),
            scanned_in: checklist.inbound.get(item_id),
            damaged: checklist.damaged.get(item_id),
            lost: checklist.lost.get(item_id),
            missing: missing(event, item_id),
        })
        .collect()
}
