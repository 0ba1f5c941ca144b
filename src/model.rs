//! Domain records persisted in the application document
//!
//! Field names serialize in `camelCase` so documents written by the browser
//! dashboard load unchanged. Every field has a default: older documents that
//! predate a field still deserialize, and [`AppState::normalize`] fills in the
//! rest.

pub mod event;
pub mod inventory;
pub mod state;

pub use event::{Event, EventItemAllocation, NewEvent};
pub use inventory::{InventoryItem, NewItem, StockBucket};
pub use state::AppState;
