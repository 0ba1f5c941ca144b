//! Integration tests for signatures and hand-off slips

mod common;

use common::{item, signature, state_with, EVENT, ITEM, ITEM_CODE};
use eventgear::slip::{apply_signature, pending_rows};
use eventgear::{
    dispatch, AppState, ChecklistRow, Command, Direction, InventoryItem, ScanCommand, ScanStatus,
    SignOutcome, SignatureCommand,
};

fn scan_out(state: AppState, qty: u32) -> AppState {
    dispatch(state, &ScanCommand::outbound(EVENT, ITEM_CODE, qty).into())
}

fn scan_in(state: AppState, status: ScanStatus, qty: u32) -> AppState {
    dispatch(state, &ScanCommand::inbound(EVENT, ITEM_CODE, status, qty).into())
}

fn signed(direction: Direction) -> SignatureCommand {
    SignatureCommand::new(EVENT, direction)
        .manager(signature(direction))
        .operator(signature(direction))
        .create_slip()
}

fn sign(state: AppState, cmd: SignatureCommand) -> AppState {
    dispatch(state, &Command::Sign(cmd))
}

// ============================================================================
// Outbound slips
// ============================================================================

#[test]
fn test_outbound_slip_covers_all_scans_once() {
    let state = scan_out(scan_out(state_with(item(0, 12), 10), 6), 4);
    let state = sign(state, signed(Direction::Out));

    let checklist = &state.event(EVENT).unwrap().checklist;
    assert_eq!(checklist.slips.len(), 1);
    let slip = &checklist.slips[0];
    assert_eq!(slip.slip_no, 1);
    assert_eq!(slip.direction, Direction::Out);
    assert_eq!(slip.items.len(), 1);
    assert_eq!(slip.items[0].item_id, ITEM);
    assert_eq!(slip.items[0].scanned_out, 10);
    assert_eq!(slip.items[0].order_qty, 10);
    assert_eq!(slip.items[0].item_name.as_deref(), Some("Moving head"));

    let stock = state.item(ITEM).unwrap();
    assert_eq!(stock.available_quantity, 2);
    assert_eq!(stock.in_use_quantity, 10);
    assert_eq!(stock.usage_count, 10);

    // Nothing new scanned: a second request is a no-op
    let again = sign(state.clone(), signed(Direction::Out));
    assert_eq!(again.event(EVENT).unwrap().checklist.slips.len(), 1);
    assert_eq!(again.inventory, state.inventory);
}

#[test]
fn test_partial_slips_are_sequenced() {
    let state = scan_out(state_with(item(0, 10), 10), 6);
    let state = sign(state, signed(Direction::Out));
    let state = scan_out(state, 4);

    let mut state = state;
    let outcome = apply_signature(&mut state, &signed(Direction::Out));
    assert!(matches!(
        outcome,
        SignOutcome::SlipCreated { slip_no: 2, lines: 1, units: 4, .. }
    ));

    let checklist = &state.event(EVENT).unwrap().checklist;
    assert_eq!(checklist.slips.len(), 2);
    assert_eq!(checklist.slips[0].slip_no, 2);
    assert_eq!(checklist.slips[0].items[0].scanned_out, 4);
    assert_eq!(checklist.slips[1].slip_no, 1);
    assert_eq!(checklist.slips[1].items[0].scanned_out, 6);

    let stock = state.item(ITEM).unwrap();
    assert_eq!(stock.in_use_quantity, 10);
    assert_eq!(stock.available_quantity, 0);
    assert_eq!(stock.usage_count, 10);
}

// ============================================================================
// Signature gating
// ============================================================================

#[test]
fn test_signatures_merge_across_calls() {
    let mut state = scan_out(state_with(item(0, 5), 5), 5);

    let manager_only = SignatureCommand::new(EVENT, Direction::Out)
        .manager(signature(Direction::Out))
        .note("truck 1")
        .create_slip();
    let outcome = apply_signature(&mut state, &manager_only);
    assert_eq!(
        outcome,
        SignOutcome::Signed {
            direction: Direction::Out,
            complete: false,
            pending_lines: 1
        }
    );
    assert!(state.event(EVENT).unwrap().checklist.slips.is_empty());
    assert_eq!(state.item(ITEM).unwrap().available_quantity, 5);

    let operator = signature(Direction::Out);
    let operator_only = SignatureCommand::new(EVENT, Direction::Out)
        .operator(operator.clone())
        .create_slip();
    let outcome = apply_signature(&mut state, &operator_only);
    assert!(matches!(outcome, SignOutcome::SlipCreated { slip_no: 1, .. }));

    let checklist = &state.event(EVENT).unwrap().checklist;
    let pair = checklist.signatures.get(Direction::Out).unwrap();
    assert!(pair.is_complete());
    assert_eq!(pair.note.as_deref(), Some("truck 1"));
    assert_eq!(checklist.slips[0].operator, operator);
    assert_eq!(checklist.slips[0].note.as_deref(), Some("truck 1"));
}

#[test]
fn test_signing_without_slip_request_keeps_delta_open() {
    let state = scan_out(state_with(item(0, 5), 5), 3);
    let mut cmd = signed(Direction::Out);
    cmd.create_slip = false;
    let state = sign(state, cmd);

    let event = state.event(EVENT).unwrap();
    assert!(event.checklist.slips.is_empty());
    assert!(event.checklist.signatures.get(Direction::Out).unwrap().is_complete());
    assert_eq!(pending_rows(event, &state.inventory, Direction::Out)[0].scanned_out, 3);
    assert_eq!(state.item(ITEM).unwrap().available_quantity, 5);
}

#[test]
fn test_signing_unknown_event_changes_nothing() {
    let state = scan_out(state_with(item(0, 5), 5), 3);
    let mut cmd = signed(Direction::Out);
    cmd.event_id = "nope".to_string();
    let mut after = state.clone();
    assert_eq!(apply_signature(&mut after, &cmd), SignOutcome::UnknownEvent);
    assert_eq!(after, state);
}

// ============================================================================
// Inbound slips
// ============================================================================

#[test]
fn test_inbound_slip_counts_returns_against_outbound() {
    let state = scan_out(state_with(item(0, 5), 5), 5);
    let state = sign(state, signed(Direction::Out));
    let state = scan_in(state, ScanStatus::Ok, 2);
    let state = scan_in(state, ScanStatus::Damaged, 1);

    let state = sign(state, signed(Direction::In));
    let checklist = &state.event(EVENT).unwrap().checklist;
    let inbound: Vec<_> = checklist.slips_for(Direction::In).collect();
    assert_eq!(inbound.len(), 1);
    assert_eq!(inbound[0].slip_no, 1);
    assert_eq!(inbound[0].items[0].scanned_in, 3);
    assert_eq!(inbound[0].items[0].scanned_out, 5);
    assert_eq!(inbound[0].items[0].damaged, 1);
    assert_eq!(checklist.slips_for(Direction::Out).count(), 1);

    // Second inbound slip only covers the remaining returns
    let state = scan_in(state, ScanStatus::Ok, 2);
    let state = sign(state, signed(Direction::In));
    let checklist = &state.event(EVENT).unwrap().checklist;
    assert_eq!(checklist.slips[0].direction, Direction::In);
    assert_eq!(checklist.slips[0].slip_no, 2);
    assert_eq!(checklist.slips[0].items[0].scanned_in, 2);
    assert_eq!(state.item(ITEM).unwrap().usage_count, 5);
}

// Known issue: inbound scans already return units to `available`, and the
// signed IN slip credits them again. After this sequence the item breaks
// `total == available + in_use + maintenance + broken`; the assertions pin
// the current double credit, they do not describe a desired property.
#[test]
fn test_inbound_slip_commit_double_credits_returns() {
    let mut state = scan_out(state_with(item(0, 4), 4), 4);
    state = sign(state, signed(Direction::Out));
    state = scan_in(state, ScanStatus::Ok, 4);
    let before = state.item(ITEM).unwrap().clone();
    assert!(before.is_balanced());

    state = sign(state, signed(Direction::In));
    let after = state.item(ITEM).unwrap();
    assert_eq!(after.available_quantity, before.available_quantity + 4);
    assert_eq!(after.in_use_quantity, before.in_use_quantity.saturating_sub(4));
    assert_eq!(after.usage_count, before.usage_count);
    assert!(after.available_quantity > after.total_quantity);
    assert!(!after.is_balanced());
}

#[test]
fn test_caller_snapshot_is_used_for_delta() {
    let second = InventoryItem::new("Y", "Hazer", 3).with_barcode("880000000077");
    let mut state = state_with(item(0, 10), 10);
    state.inventory.push(second);
    let state = scan_out(state, 5);
    let state = dispatch(state, &ScanCommand::outbound(EVENT, "880000000077", 2).into());

    let snapshot = vec![ChecklistRow {
        item_id: "Y".to_string(),
        scanned_out: 2,
        ..ChecklistRow::default()
    }];
    let state = sign(state, signed(Direction::Out).snapshot(snapshot));

    let checklist = &state.event(EVENT).unwrap().checklist;
    assert_eq!(checklist.slips[0].items.len(), 1);
    assert_eq!(checklist.slips[0].items[0].item_id, "Y");
    assert_eq!(state.item("Y").unwrap().in_use_quantity, 2);
    assert_eq!(state.item(ITEM).unwrap().in_use_quantity, 0);

    // X is still uncovered and slips on the next request
    let state = sign(state, signed(Direction::Out));
    let checklist = &state.event(EVENT).unwrap().checklist;
    assert_eq!(checklist.slips[0].slip_no, 2);
    assert_eq!(checklist.slips[0].items.len(), 1);
    assert_eq!(checklist.slips[0].items[0].item_id, ITEM);
    assert_eq!(checklist.slips[0].items[0].scanned_out, 5);
}
