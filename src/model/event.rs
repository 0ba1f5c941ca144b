//! Events and their equipment allocations.

use crate::checklist::EventChecklist;
use crate::json_helpers::{deserialize_quantity, deserialize_string_or_null};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Planned vs. returned quantity of one item within one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventItemAllocation {
    #[serde(deserialize_with = "deserialize_string_or_null")]
    pub item_id: String,
    /// Ordered amount
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: u32,
    /// Cumulative amount scanned back in
    #[serde(deserialize_with = "deserialize_quantity")]
    pub returned_quantity: u32,
    /// Manual completion flag
    pub done: bool,
}

impl EventItemAllocation {
    #[must_use]
    pub fn new(item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            ..Self::default()
        }
    }

    /// Units still expected back; zero once everything has been returned.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.quantity.saturating_sub(self.returned_quantity)
    }
}

/// One event and the equipment that moves for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    #[serde(deserialize_with = "deserialize_string_or_null")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_string_or_null")]
    pub name: String,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub items: Vec<EventItemAllocation>,
    pub checklist: EventChecklist,
}

impl Event {
    /// New event with an empty checklist.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_allocation(mut self, item_id: impl Into<String>, quantity: u32) -> Self {
        self.items.push(EventItemAllocation::new(item_id, quantity));
        self
    }

    #[must_use]
    pub fn allocation(&self, item_id: &str) -> Option<&EventItemAllocation> {
        self.items.iter().find(|a| a.item_id == item_id)
    }

    pub fn allocation_mut(&mut self, item_id: &str) -> Option<&mut EventItemAllocation> {
        self.items.iter_mut().find(|a| a.item_id == item_id)
    }

    /// Allocation for `item_id`, created with `quantity = 0` when absent.
    pub fn allocation_or_insert(&mut self, item_id: &str) -> &mut EventItemAllocation {
        let idx = match self.items.iter().position(|a| a.item_id == item_id) {
            Some(idx) => idx,
            None => {
                self.items.push(EventItemAllocation::new(item_id, 0));
                self.items.len() - 1
            }
        };
        &mut self.items[idx]
    }

    /// Ordered quantity for `item_id`, zero when not allocated.
    #[must_use]
    pub fn order_quantity(&self, item_id: &str) -> u32 {
        self.allocation(item_id).map_or(0, |a| a.quantity)
    }
}

/// Input for creating an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewEvent {
    pub name: String,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
}
