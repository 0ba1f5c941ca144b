//! The whole application document.

use crate::barcode;
use crate::model::{Event, InventoryItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the ledger persists and replicates as one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub inventory: Vec<InventoryItem>,
    pub events: Vec<Event>,
    /// Stamp of the last local write, compared by replication
    pub updated_at: Option<DateTime<Utc>>,
}

impl AppState {
    #[must_use]
    pub fn new(inventory: Vec<InventoryItem>, events: Vec<Event>) -> Self {
        Self {
            inventory,
            events,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn event(&self, event_id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == event_id)
    }

    pub fn event_mut(&mut self, event_id: &str) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.id == event_id)
    }

    #[must_use]
    pub fn item(&self, item_id: &str) -> Option<&InventoryItem> {
        self.inventory.iter().find(|i| i.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut InventoryItem> {
        self.inventory.iter_mut().find(|i| i.id == item_id)
    }

    /// Fill in what older documents lack. Run on every load.
    pub fn normalize(&mut self) {
        for item in &mut self.inventory {
            item.barcode = barcode::normalize(&item.barcode);
        }
        for event in &mut self.events {
            event.checklist.normalize();
        }
    }

    /// Consume and return the normalized document.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }
}
