//! CSV inventory export and receiving manifests

use crate::json_helpers::deserialize_quantity;
use crate::model::InventoryItem;
use crate::GearError;
use serde::{Deserialize, Serialize};
use std::io;

#[derive(Debug, Serialize)]
struct InventoryRecord<'a> {
    id: &'a str,
    name: &'a str,
    category: &'a str,
    barcode: &'a str,
    total: u32,
    available: u32,
    in_use: u32,
    maintenance: u32,
    broken: u32,
    lost: u32,
    usage_count: u32,
}

impl<'a> From<&'a InventoryItem> for InventoryRecord<'a> {
    fn from(item: &'a InventoryItem) -> Self {
        Self {
            id: &item.id,
            name: &item.name,
            category: &item.category,
            barcode: &item.barcode,
            total: item.total_quantity,
            available: item.available_quantity,
            in_use: item.in_use_quantity,
            maintenance: item.maintenance_quantity,
            broken: item.broken_quantity,
            lost: item.lost_quantity,
            usage_count: item.usage_count,
        }
    }
}

/// Write one CSV row per item, with a header.
///
/// # Errors
///
/// Returns `GearError::Csv` or `GearError::Io` if writing fails.
pub fn export_inventory<W: io::Write>(inventory: &[InventoryItem], writer: W) -> Result<(), GearError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for item in inventory {
        wtr.serialize(InventoryRecord::from(item))?;
    }
    wtr.flush()?;
    Ok(())
}

/// One line of a receiving manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReceivingLine {
    pub barcode: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: u32,
}

/// Read a receiving manifest with columns `barcode,name,category,quantity`.
///
/// Lines with a zero quantity are skipped.
///
/// # Errors
///
/// Returns `GearError::Csv` on a malformed row.
pub fn import_receiving<R: io::Read>(reader: R) -> Result<Vec<ReceivingLine>, GearError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut lines = Vec::new();
    for record in rdr.deserialize::<ReceivingLine>() {
        let line = record?;
        if line.quantity > 0 {
            lines.push(line);
        }
    }
    Ok(lines)
}
