//! Stock maintenance outside the scan flow
//!
//! Item creation, receiving, manual status changes and allocation edits. Unlike
//! the scan and signature reducers these validate their input and report
//! problems as [`GearError`]; a rejected call leaves the state untouched.

use crate::barcode;
use crate::model::{
    AppState, Event, EventItemAllocation, InventoryItem, NewEvent, NewItem, StockBucket,
};
use crate::store::ReceivingLine;
use crate::GearError;
use uuid::Uuid;

fn duplicate_error(state: &AppState, code: &str, exclude_id: Option<&str>) -> Option<GearError> {
    barcode::find_duplicate(&state.inventory, code, exclude_id).map(|other| GearError::DuplicateBarcode {
        barcode: barcode::normalize(code),
        conflicting_id: other.id.clone(),
        conflicting_name: other.name.clone(),
    })
}

fn event_mut<'a>(state: &'a mut AppState, event_id: &str) -> Result<&'a mut Event, GearError> {
    state
        .event_mut(event_id)
        .ok_or_else(|| GearError::UnknownEvent(event_id.to_string()))
}

/// Create an item, generating a barcode when none usable was given.
///
/// # Errors
///
/// `GearError::DuplicateBarcode` if another item already has the code.
pub fn add_item(state: &mut AppState, new_item: NewItem) -> Result<String, GearError> {
    let id = Uuid::new_v4().to_string();
    let mut item = barcode::ensure_barcode(new_item.into_item(id.clone()));
    item.barcode = barcode::normalize(&item.barcode);
    if let Some(err) = duplicate_error(state, &item.barcode, None) {
        return Err(err);
    }
    log::info!("added item {} '{}' ({} unit(s))", item.id, item.name, item.total_quantity);
    state.inventory.push(item);
    Ok(id)
}

/// Replace an item's barcode.
///
/// # Errors
///
/// `GearError::UnknownItem`, or `GearError::DuplicateBarcode` naming the item
/// that already has the code.
pub fn set_barcode(state: &mut AppState, item_id: &str, code: &str) -> Result<(), GearError> {
    if state.item(item_id).is_none() {
        return Err(GearError::UnknownItem(item_id.to_string()));
    }
    if let Some(err) = duplicate_error(state, code, Some(item_id)) {
        return Err(err);
    }
    if let Some(item) = state.item_mut(item_id) {
        item.barcode = barcode::normalize(code);
    }
    Ok(())
}

/// Receiving transaction: `qty` new units, all available. Returns the new total.
///
/// # Errors
///
/// `GearError::UnknownItem` if no item has `item_id`.
pub fn receive(state: &mut AppState, item_id: &str, qty: u32) -> Result<u32, GearError> {
    let item = state
        .item_mut(item_id)
        .ok_or_else(|| GearError::UnknownItem(item_id.to_string()))?;
    item.total_quantity = item.total_quantity.saturating_add(qty);
    item.available_quantity = item.available_quantity.saturating_add(qty);
    log::debug!("received {} x{}; total {}", item_id, qty, item.total_quantity);
    Ok(item.total_quantity)
}

/// Outcome of [`apply_receiving`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivingSummary {
    /// Units added to existing items
    pub received: u32,
    /// Ids of items created for unknown codes
    pub created: Vec<String>,
}

/// Apply a receiving manifest: known codes are received, unknown ones become items.
///
/// # Errors
///
/// `GearError::DuplicateBarcode` if a new item collides; lines before it stay applied.
pub fn apply_receiving(state: &mut AppState, lines: &[ReceivingLine]) -> Result<ReceivingSummary, GearError> {
    let mut summary = ReceivingSummary::default();
    for line in lines {
        let known = barcode::find_by_barcode(&state.inventory, &line.barcode).map(|i| i.id.clone());
        match known {
            Some(item_id) => {
                receive(state, &item_id, line.quantity)?;
                summary.received = summary.received.saturating_add(line.quantity);
            }
            None => {
                let name = if line.name.is_empty() {
                    line.barcode.clone()
                } else {
                    line.name.clone()
                };
                let new_item = NewItem {
                    name,
                    category: line.category.clone(),
                    barcode: line.barcode.clone(),
                    quantity: line.quantity,
                    ..NewItem::default()
                };
                summary.created.push(add_item(state, new_item)?);
            }
        }
    }
    Ok(summary)
}

/// Move up to `qty` units of an item between buckets. Returns the units moved.
///
/// Moving into `Lost` takes the units out of the total; moving out of `Lost`
/// (found equipment) puts them back.
///
/// # Errors
///
/// `GearError::UnknownItem` if no item has `item_id`.
pub fn change_status(
    state: &mut AppState,
    item_id: &str,
    from: StockBucket,
    to: StockBucket,
    qty: u32,
) -> Result<u32, GearError> {
    let item = state
        .item_mut(item_id)
        .ok_or_else(|| GearError::UnknownItem(item_id.to_string()))?;
    if from == to {
        return Ok(0);
    }
    let moved = qty.min(item.bucket(from));
    let landed = item.bucket(to).saturating_add(moved);
    *item.bucket_mut(from) -= moved;
    *item.bucket_mut(to) = landed;

    match (from.counts_towards_total(), to.counts_towards_total()) {
        (true, false) => item.total_quantity = item.total_quantity.saturating_sub(moved),
        (false, true) => item.total_quantity = item.total_quantity.saturating_add(moved),
        _ => {}
    }
    log::debug!("item {}: {} unit(s) {} -> {}", item_id, moved, from, to);
    Ok(moved)
}

/// Delete an item that has no units out.
///
/// # Errors
///
/// `GearError::ItemInUse` while `in_use_quantity > 0`, `GearError::UnknownItem`
/// if it does not exist.
pub fn remove_item(state: &mut AppState, item_id: &str) -> Result<InventoryItem, GearError> {
    let idx = state
        .inventory
        .iter()
        .position(|i| i.id == item_id)
        .ok_or_else(|| GearError::UnknownItem(item_id.to_string()))?;
    let in_use = state.inventory[idx].in_use_quantity;
    if in_use > 0 {
        return Err(GearError::ItemInUse {
            item_id: item_id.to_string(),
            in_use,
        });
    }
    Ok(state.inventory.remove(idx))
}

/// Create an event with an empty checklist. Returns its id.
pub fn create_event(state: &mut AppState, new_event: NewEvent) -> String {
    let id = Uuid::new_v4().to_string();
    let mut event = Event::new(id.clone(), new_event.name);
    event.venue = new_event.venue;
    event.starts_at = new_event.starts_at;
    state.events.push(event);
    id
}

/// Add `qty` planned units of an item to an event, creating the allocation if needed.
///
/// # Errors
///
/// `GearError::UnknownItem` or `GearError::UnknownEvent`.
pub fn allocate(state: &mut AppState, event_id: &str, item_id: &str, qty: u32) -> Result<u32, GearError> {
    if state.item(item_id).is_none() {
        return Err(GearError::UnknownItem(item_id.to_string()));
    }
    let allocation = event_mut(state, event_id)?.allocation_or_insert(item_id);
    allocation.quantity = allocation.quantity.saturating_add(qty);
    Ok(allocation.quantity)
}

/// Edit the planned quantity; never below what has already been returned.
/// Returns the quantity that was set.
///
/// # Errors
///
/// `GearError::UnknownEvent`, or `GearError::UnknownItem` if the item is not allocated.
pub fn set_allocation_quantity(
    state: &mut AppState,
    event_id: &str,
    item_id: &str,
    qty: u32,
) -> Result<u32, GearError> {
    let allocation = event_mut(state, event_id)?
        .allocation_mut(item_id)
        .ok_or_else(|| GearError::UnknownItem(item_id.to_string()))?;
    allocation.quantity = qty.max(allocation.returned_quantity);
    Ok(allocation.quantity)
}

/// Remove an item from an event's order. Checklist history is kept.
///
/// # Errors
///
/// `GearError::UnknownEvent`.
pub fn strip_allocation(
    state: &mut AppState,
    event_id: &str,
    item_id: &str,
) -> Result<Option<EventItemAllocation>, GearError> {
    let event = event_mut(state, event_id)?;
    let removed = event
        .items
        .iter()
        .position(|a| a.item_id == item_id)
        .map(|idx| event.items.remove(idx));
    Ok(removed)
}

/// Set the manual completion flag of an allocation.
///
/// # Errors
///
/// `GearError::UnknownEvent`, or `GearError::UnknownItem` if the item is not allocated.
pub fn mark_done(state: &mut AppState, event_id: &str, item_id: &str, done: bool) -> Result<(), GearError> {
    event_mut(state, event_id)?
        .allocation_mut(item_id)
        .ok_or_else(|| GearError::UnknownItem(item_id.to_string()))?
        .done = done;
    Ok(())
}
