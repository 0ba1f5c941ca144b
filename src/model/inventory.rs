//! Inventory items and their stock buckets.

use crate::json_helpers::{deserialize_quantity, deserialize_string_or_null};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One physical equipment SKU and its stock counters.
///
/// `total_quantity == available + in_use + maintenance + broken`; lost units
/// are tracked separately and are not part of the total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryItem {
    #[serde(deserialize_with = "deserialize_string_or_null")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_string_or_null")]
    pub name: String,
    #[serde(deserialize_with = "deserialize_string_or_null")]
    pub category: String,
    #[serde(deserialize_with = "deserialize_string_or_null")]
    pub description: String,
    pub image_url: Option<String>,
    #[serde(deserialize_with = "deserialize_string_or_null")]
    pub barcode: String,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub total_quantity: u32,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub available_quantity: u32,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub in_use_quantity: u32,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub maintenance_quantity: u32,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub broken_quantity: u32,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub lost_quantity: u32,
    /// Lifetime units committed on outbound slips
    #[serde(deserialize_with = "deserialize_quantity")]
    pub usage_count: u32,
}

impl InventoryItem {
    /// Create an item with `quantity` units, all available.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            total_quantity: quantity,
            available_quantity: quantity,
            ..Self::default()
        }
    }

    /// Builder-style barcode setter.
    #[must_use]
    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = barcode.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Current count in one bucket.
    #[must_use]
    pub fn bucket(&self, bucket: StockBucket) -> u32 {
        match bucket {
            StockBucket::Available => self.available_quantity,
            StockBucket::InUse => self.in_use_quantity,
            StockBucket::Maintenance => self.maintenance_quantity,
            StockBucket::Broken => self.broken_quantity,
            StockBucket::Lost => self.lost_quantity,
        }
    }

    pub(crate) fn bucket_mut(&mut self, bucket: StockBucket) -> &mut u32 {
        match bucket {
            StockBucket::Available => &mut self.available_quantity,
            StockBucket::InUse => &mut self.in_use_quantity,
            StockBucket::Maintenance => &mut self.maintenance_quantity,
            StockBucket::Broken => &mut self.broken_quantity,
            StockBucket::Lost => &mut self.lost_quantity,
        }
    }

    /// Sum of the buckets that make up `total_quantity`.
    #[must_use]
    pub fn accounted_quantity(&self) -> u32 {
        self.available_quantity
            .saturating_add(self.in_use_quantity)
            .saturating_add(self.maintenance_quantity)
            .saturating_add(self.broken_quantity)
    }

    /// Whether the stock counters add up to the total.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.accounted_quantity() == self.total_quantity
    }

    /// Return units from an event in the given bucket.
    ///
    /// Units leave `in_use` (saturating). Lost units also leave the total.
    pub(crate) fn return_from_use(&mut self, bucket: StockBucket, qty: u32) {
        self.in_use_quantity = self.in_use_quantity.saturating_sub(qty);
        match bucket {
            StockBucket::Lost => {
                self.lost_quantity = self.lost_quantity.saturating_add(qty);
                self.total_quantity = self.total_quantity.saturating_sub(qty);
            }
            other => {
                let slot = self.bucket_mut(other);
                *slot = slot.saturating_add(qty);
            }
        }
    }
}

/// The five stock counters of an [`InventoryItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockBucket {
    Available,
    InUse,
    Maintenance,
    Broken,
    Lost,
}

impl StockBucket {
    /// Whether units in this bucket count towards `total_quantity`.
    #[must_use]
    pub fn counts_towards_total(self) -> bool {
        !matches!(self, StockBucket::Lost)
    }
}

impl fmt::Display for StockBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StockBucket::Available => "available",
            StockBucket::InUse => "in use",
            StockBucket::Maintenance => "maintenance",
            StockBucket::Broken => "broken",
            StockBucket::Lost => "lost",
        };
        f.write_str(label)
    }
}

/// Input for creating a new inventory item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub description: String,
    pub image_url: Option<String>,
    /// Leave empty to have one generated
    pub barcode: String,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: u32,
}

impl NewItem {
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = barcode.into();
        self
    }

    /// Build the stored item under `id`, all units available.
    #[must_use]
    pub fn into_item(self, id: String) -> InventoryItem {
        InventoryItem {
            id,
            name: self.name,
            category: self.category,
            description: self.description,
            image_url: self.image_url,
            barcode: self.barcode,
            total_quantity: self.quantity,
            available_quantity: self.quantity,
            ..InventoryItem::default()
        }
    }
}
