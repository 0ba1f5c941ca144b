//! Shared fixtures for integration tests

#![allow(dead_code)]

use eventgear::{AppState, Direction, Event, InventoryItem, Signature};
use fake::faker::name::en::Name;
use fake::Fake;

pub const EVENT: &str = "E1";
pub const ITEM: &str = "X";
pub const ITEM_CODE: &str = "880000000042";

/// Item `X` with `in_use` units out and `available` on the shelf.
pub fn item(in_use: u32, available: u32) -> InventoryItem {
    let mut item = InventoryItem::new(ITEM, "Moving head", in_use + available).with_barcode(ITEM_CODE);
    item.in_use_quantity = in_use;
    item.available_quantity = available;
    item
}

/// Event `E1` ordering `quantity` units of `X`.
pub fn state_with(item: InventoryItem, quantity: u32) -> AppState {
    AppState::new(
        vec![item],
        vec![Event::new(EVENT, "Spring gala").with_allocation(ITEM, quantity)],
    )
}

pub fn signature(direction: Direction) -> Signature {
    let mut signature = Signature::new(Name().fake::<String>(), direction);
    signature.data_url = "data:image/png;base64,iVBORw0KGgo=".to_string();
    signature
}

pub fn temp_dir(label: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("eventgear-{label}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
