//! # eventgear
//!
//! Equipment ledger for an event-rental warehouse: barcode identity, per-event
//! checklists fed by scans, two-signature hand-off slips, and the inventory
//! movements they commit.
//!
//! The scan and signature reducers ([`reconcile`], [`slip`]) are pure state
//! transitions over [`AppState`]; [`Ledger`] adds persistence and
//! last-writer-wins replication around them.

pub mod barcode;
pub mod checklist;
pub mod config;
pub mod error;
pub mod json_helpers;
pub mod ledger;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod model;
pub mod reconcile;
pub mod replication;
pub mod slip;
pub mod stock;
pub mod store;

pub use checklist::{
    ChecklistRow, Direction, EventChecklist, LogStatus, ScanLogEntry, ScanStatus, Signature,
    SignaturePair, Slip, Tally,
};
pub use config::GearConfig;
pub use error::GearError;
pub use ledger::{dispatch, Command, Ledger, Outcome};
pub use model::{AppState, Event, EventItemAllocation, InventoryItem, NewEvent, NewItem, StockBucket};
pub use reconcile::{ScanCommand, ScanOutcome};
pub use replication::Replicator;
pub use slip::{SignOutcome, SignatureCommand};
pub use store::{JsonFileStore, MemoryStore, StateStore};
