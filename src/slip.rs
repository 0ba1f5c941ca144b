//! Signatures and signed hand-off slips
//!
//! Manager and operator sign each direction separately, possibly at different
//! times. Once both have signed and a slip is requested, the movement not yet
//! covered by an earlier slip of the same direction becomes a new, immutable
//! slip, and only then is the outbound inventory debit committed.
//!
//! Each slip covers `cumulative tally - sum of earlier slips`, so several
//! partial hand-offs (one per truck, say) never count a unit twice.

use crate::checklist::{self, ChecklistRow, Direction, EventChecklist, Signature, Slip};
use crate::model::{AppState, Event, InventoryItem};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A signature capture, optionally asking for a slip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureCommand {
    pub event_id: String,
    pub direction: Direction,
    #[serde(default)]
    pub manager: Option<Signature>,
    #[serde(default)]
    pub operator: Option<Signature>,
    #[serde(default)]
    pub note: Option<String>,
    /// Rows to slip instead of the event's current snapshot
    #[serde(default)]
    pub items_snapshot: Option<Vec<ChecklistRow>>,
    #[serde(default)]
    pub create_slip: bool,
}

impl SignatureCommand {
    #[must_use]
    pub fn new(event_id: impl Into<String>, direction: Direction) -> Self {
        Self {
            event_id: event_id.into(),
            direction,
            manager: None,
            operator: None,
            note: None,
            items_snapshot: None,
            create_slip: false,
        }
    }

    #[must_use]
    pub fn manager(mut self, signature: Signature) -> Self {
        self.manager = Some(signature);
        self
    }

    #[must_use]
    pub fn operator(mut self, signature: Signature) -> Self {
        self.operator = Some(signature);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn snapshot(mut self, rows: Vec<ChecklistRow>) -> Self {
        self.items_snapshot = Some(rows);
        self
    }

    #[must_use]
    pub fn create_slip(mut self) -> Self {
        self.create_slip = true;
        self
    }
}

/// What a signature command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutcome {
    /// No event with the command's id; nothing changed
    UnknownEvent,
    /// Signatures merged, no slip created
    Signed {
        direction: Direction,
        complete: bool,
        pending_lines: usize,
    },
    /// Signatures merged and a slip created
    SlipCreated {
        slip_id: String,
        slip_no: u32,
        direction: Direction,
        lines: usize,
        units: u64,
    },
}

/// Rows of `snapshot` not yet covered by earlier slips of `direction`.
///
/// `OUT` rows carry the uncovered outbound quantity. `IN` rows carry the
/// uncovered inbound quantity, capped at what went out and has not come back
/// on a slip yet, and show the total outbound quantity for context.
#[must_use]
pub fn uncovered_rows(
    checklist: &EventChecklist,
    direction: Direction,
    snapshot: &[ChecklistRow],
) -> Vec<ChecklistRow> {
    let prior = checklist.slipped_totals(direction);
    snapshot
        .iter()
        .filter_map(|row| {
            let covered = prior.get(&row.item_id);
            match direction {
                Direction::Out => {
                    let delta = row.scanned_out.saturating_sub(covered);
                    (delta > 0).then(|| ChecklistRow {
                        scanned_out: delta,
                        ..row.clone()
                    })
                }
                Direction::In => {
                    let total_out = checklist.outbound.get(&row.item_id);
                    let remaining_out = total_out.saturating_sub(covered);
                    let delta = remaining_out.min(row.scanned_in.saturating_sub(covered));
                    (delta > 0).then(|| ChecklistRow {
                        scanned_in: delta,
                        scanned_out: total_out,
                        ..row.clone()
                    })
                }
            }
        })
        .collect()
}

/// Lines a slip for `direction` would contain right now.
#[must_use]
pub fn pending_rows(event: &Event, inventory: &[InventoryItem], direction: Direction) -> Vec<ChecklistRow> {
    let snapshot = checklist::rows(event, inventory);
    uncovered_rows(&event.checklist, direction, &snapshot)
}

fn line_quantity(direction: Direction, row: &ChecklistRow) -> u32 {
    match direction {
        Direction::Out => row.scanned_out,
        Direction::In => row.scanned_in,
    }
}

fn commit_inventory(inventory: &mut [InventoryItem], direction: Direction, rows: &[ChecklistRow]) {
    for row in rows {
        let qty = line_quantity(direction, row);
        let Some(item) = inventory.iter_mut().find(|i| i.id == row.item_id) else {
            log::warn!("slip line for unknown item {} not committed", row.item_id);
            continue;
        };
        match direction {
            Direction::Out => {
                if item.available_quantity < qty {
                    log::warn!(
                        "item {}: committing {} out with only {} available",
                        item.id,
                        qty,
                        item.available_quantity
                    );
                }
                item.available_quantity = item.available_quantity.saturating_sub(qty);
                item.in_use_quantity = item.in_use_quantity.saturating_add(qty);
                item.usage_count = item.usage_count.saturating_add(qty);
            }
            Direction::In => {
                item.available_quantity = item.available_quantity.saturating_add(qty);
                item.in_use_quantity = item.in_use_quantity.saturating_sub(qty);
            }
        }
    }
}

/// Apply `cmd` to `state` in place.
pub fn apply_signature(state: &mut AppState, cmd: &SignatureCommand) -> SignOutcome {
    let Some(event_idx) = state.events.iter().position(|e| e.id == cmd.event_id) else {
        log::debug!("signature for unknown event {} ignored", cmd.event_id);
        return SignOutcome::UnknownEvent;
    };
    let direction = cmd.direction;

    let delta = {
        let event = &state.events[event_idx];
        match &cmd.items_snapshot {
            Some(snapshot) => uncovered_rows(&event.checklist, direction, snapshot),
            None => pending_rows(event, &state.inventory, direction),
        }
    };

    let event = &mut state.events[event_idx];
    let pair = event.checklist.signatures.entry(direction);
    if let Some(manager) = &cmd.manager {
        pair.manager = Some(manager.clone());
    }
    if let Some(operator) = &cmd.operator {
        pair.operator = Some(operator.clone());
    }
    if let Some(note) = &cmd.note {
        pair.note = Some(note.clone());
    }

    let signers = match (&pair.manager, &pair.operator) {
        (Some(manager), Some(operator)) => Some((manager.clone(), operator.clone())),
        _ => None,
    };
    let pair_note = pair.note.clone();

    let (manager, operator) = match signers {
        Some(signers) if cmd.create_slip && !delta.is_empty() => signers,
        signers => {
            return SignOutcome::Signed {
                direction,
                complete: signers.is_some(),
                pending_lines: delta.len(),
            };
        }
    };

    let slip_no = event.checklist.slips_for(direction).count() as u32 + 1;
    let units: u64 = delta
        .iter()
        .map(|row| u64::from(line_quantity(direction, row)))
        .sum();
    let slip = Slip {
        id: Uuid::new_v4().to_string(),
        slip_no,
        direction,
        created_at: Utc::now(),
        manager,
        operator,
        note: pair_note,
        items: delta,
    };
    log::info!(
        "event {}: {} slip #{} created with {} line(s), {} unit(s)",
        event.id,
        direction,
        slip_no,
        slip.items.len(),
        units
    );
    let outcome = SignOutcome::SlipCreated {
        slip_id: slip.id.clone(),
        slip_no,
        direction,
        lines: slip.items.len(),
        units,
    };
    event.checklist.slips.insert(0, slip);

    let items = &state.events[event_idx].checklist.slips[0].items;
    commit_inventory(&mut state.inventory, direction, items);
    outcome
}

/// By-value form of [`apply_signature`].
#[must_use]
pub fn sign(mut state: AppState, cmd: &SignatureCommand) -> AppState {
    apply_signature(&mut state, cmd);
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(item_id: &str, scanned_out: u32, scanned_in: u32) -> ChecklistRow {
        ChecklistRow {
            item_id: item_id.to_string(),
            scanned_out,
            scanned_in,
            ..ChecklistRow::default()
        }
    }

    fn slip(direction: Direction, items: Vec<ChecklistRow>) -> Slip {
        Slip {
            id: Uuid::new_v4().to_string(),
            slip_no: 1,
            direction,
            created_at: Utc::now(),
            manager: Signature::new("M", direction),
            operator: Signature::new("O", direction),
            note: None,
            items,
        }
    }

    #[test]
    fn test_outbound_delta_subtracts_prior_slips() {
        let mut checklist = EventChecklist::default();
        checklist.slips.push(slip(Direction::Out, vec![row("a", 6, 0)]));
        let delta = uncovered_rows(&checklist, Direction::Out, &[row("a", 10, 0), row("b", 0, 0)]);
        assert_eq!(delta, vec![row("a", 4, 0)]);
    }

    #[test]
    fn test_inbound_delta_is_capped_by_outbound() {
        let mut checklist = EventChecklist::default();
        checklist.outbound.add("a", 5);
        checklist.slips.push(slip(Direction::In, vec![row("a", 5, 2)]));
        // 2 already slipped back; 3 more out there, 6 scanned in overall
        let delta = uncovered_rows(&checklist, Direction::In, &[row("a", 5, 6)]);
        assert_eq!(delta, vec![row("a", 5, 3)]);
    }

    #[test]
    fn test_inbound_without_outbound_never_slips() {
        let checklist = EventChecklist::default();
        assert!(uncovered_rows(&checklist, Direction::In, &[row("a", 0, 4)]).is_empty());
    }

    #[test]
    fn test_outbound_slips_ignore_inbound_slips() {
        let mut checklist = EventChecklist::default();
        checklist.slips.push(slip(Direction::In, vec![row("a", 3, 3)]));
        let delta = uncovered_rows(&checklist, Direction::Out, &[row("a", 3, 0)]);
        assert_eq!(delta, vec![row("a", 3, 0)]);
    }
}
