//! Barcode identity for physical items
//!
//! Scanned codes are canonicalized by stripping whitespace. Items without a
//! usable code get a generated 12-digit one. Generated codes are not
//! structurally unique, so callers check [`find_duplicate`] before persisting
//! (or use [`assign_unique`], which retries until the code is free).

use crate::model::InventoryItem;
use crate::GearError;
use chrono::Utc;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

/// Prefix of every generated code.
pub const GENERATED_PREFIX: &str = "88";
/// Length of every generated code.
pub const GENERATED_LEN: usize = 12;
/// Shortest stored code accepted as-is by [`ensure_barcode`].
pub const MIN_BARCODE_LEN: usize = 6;

const MAX_ASSIGN_ATTEMPTS: usize = 32;

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D+").expect("digit pattern is valid"));

/// Canonical form of a scanned or stored code: all whitespace removed.
#[must_use]
pub fn normalize(code: &str) -> String {
    WHITESPACE.replace_all(code, "").into_owned()
}

/// Generate a 12-character numeric code.
///
/// Layout: `88`, the digits found in `seed`, the low 8 digits of the current
/// epoch milliseconds, then 3 random digits; truncated or zero-padded to 12.
#[must_use]
pub fn generate(seed: &str) -> String {
    let seed_digits = NON_DIGIT.replace_all(seed, "");
    let millis = Utc::now().timestamp_millis().rem_euclid(100_000_000);
    let random: u32 = rand::thread_rng().gen_range(0..1000);

    let mut code = format!("{GENERATED_PREFIX}{seed_digits}{millis:08}{random:03}");
    code.truncate(GENERATED_LEN);
    while code.len() < GENERATED_LEN {
        code.push('0');
    }
    code
}

/// Return `item` unchanged if its code is usable, otherwise with a generated one.
#[must_use]
pub fn ensure_barcode(mut item: InventoryItem) -> InventoryItem {
    if normalize(&item.barcode).len() >= MIN_BARCODE_LEN {
        return item;
    }
    item.barcode = generate(&item.id);
    item
}

/// Another item (not `exclude_id`) whose normalized code equals `barcode`.
///
/// Advisory only: nothing is rejected here, the caller decides.
#[must_use]
pub fn find_duplicate<'a>(
    inventory: &'a [InventoryItem],
    barcode: &str,
    exclude_id: Option<&str>,
) -> Option<&'a InventoryItem> {
    let wanted = normalize(barcode);
    if wanted.is_empty() {
        return None;
    }
    inventory
        .iter()
        .filter(|item| exclude_id != Some(item.id.as_str()))
        .find(|item| normalize(&item.barcode) == wanted)
}

/// Resolve a scanned code to an item by normalized barcode, or by raw id for
/// legacy items that were never given one.
#[must_use]
pub fn find_by_barcode<'a>(inventory: &'a [InventoryItem], code: &str) -> Option<&'a InventoryItem> {
    let wanted = normalize(code);
    if wanted.is_empty() {
        return None;
    }
    inventory
        .iter()
        .find(|item| normalize(&item.barcode) == wanted || item.id == code || item.id == wanted)
}

/// Like [`ensure_barcode`], but regenerates while the code collides with
/// another item of `inventory`.
///
/// Retries are unseeded: a seed with ten or more digits fills the whole code
/// and would repeat the same collision.
///
/// # Errors
///
/// `GearError::DuplicateBarcode` naming the last conflicting item if no free
/// code was found within the attempt budget.
pub fn assign_unique(inventory: &[InventoryItem], item: InventoryItem) -> Result<InventoryItem, GearError> {
    let mut item = ensure_barcode(item);
    for _ in 0..MAX_ASSIGN_ATTEMPTS {
        if find_duplicate(inventory, &item.barcode, Some(&item.id)).is_none() {
            return Ok(item);
        }
        item.barcode = generate("");
    }
    match find_duplicate(inventory, &item.barcode, Some(&item.id)) {
        None => Ok(item),
        Some(other) => {
            log::warn!(
                "barcode for item {} still collides after {} attempts",
                item.id,
                MAX_ASSIGN_ATTEMPTS
            );
            Err(GearError::DuplicateBarcode {
                barcode: normalize(&item.barcode),
                conflicting_id: other.id.clone(),
                conflicting_name: other.name.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_all_whitespace() {
        assert_eq!(normalize(" 88 1234\t5678\n"), "8812345678");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("ABC-12"), "ABC-12");
    }

    #[test]
    fn test_generated_code_shape() {
        for seed in ["", "item-7", "SKU 123456789012345", "no digits"] {
            let code = generate(seed);
            assert_eq!(code.len(), GENERATED_LEN, "seed {seed:?}");
            assert!(code.starts_with(GENERATED_PREFIX));
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_eq!(normalize(&code), code);
            assert_eq!(normalize(&normalize(&code)), code);
        }
    }

    #[test]
    fn test_long_seed_digits_fill_the_code() {
        assert_eq!(generate("sku-1234567890123"), "881234567890");
    }

    #[test]
    fn test_ensure_keeps_usable_codes() {
        let item = InventoryItem::new("x", "Mixer", 1).with_barcode("ABC123");
        assert_eq!(ensure_barcode(item.clone()), item);

        let short = InventoryItem::new("x", "Mixer", 1).with_barcode(" 12 3 ");
        let fixed = ensure_barcode(short);
        assert_eq!(fixed.barcode.len(), GENERATED_LEN);
    }

    #[test]
    fn test_duplicates_ignore_self_and_empty_codes() {
        let inventory = vec![
            InventoryItem::new("a", "Truss", 4).with_barcode("880000000001"),
            InventoryItem::new("b", "Cable", 9),
        ];
        assert_eq!(
            find_duplicate(&inventory, " 8800 0000 0001", None).map(|i| i.id.as_str()),
            Some("a")
        );
        assert!(find_duplicate(&inventory, "880000000001", Some("a")).is_none());
        assert!(find_duplicate(&inventory, "", None).is_none());
    }

    #[test]
    fn test_lookup_falls_back_to_item_id() {
        let inventory = vec![
            InventoryItem::new("a", "Truss", 4).with_barcode("880000000001"),
            InventoryItem::new("legacy-cable", "Cable", 9),
        ];
        assert_eq!(
            find_by_barcode(&inventory, "880000000001 ").map(|i| i.id.as_str()),
            Some("a")
        );
        assert_eq!(
            find_by_barcode(&inventory, "legacy-cable").map(|i| i.id.as_str()),
            Some("legacy-cable")
        );
        assert!(find_by_barcode(&inventory, "999").is_none());
        assert!(find_by_barcode(&inventory, "  ").is_none());
    }

    #[test]
    fn test_assign_unique_avoids_existing_codes() {
        let inventory = vec![InventoryItem::new("a", "Truss", 4).with_barcode("880000000001")];
        let item = InventoryItem::new("b", "Truss", 2).with_barcode("880000000001");
        let item = assign_unique(&inventory, item).unwrap();
        assert_ne!(item.barcode, "880000000001");
        assert!(find_duplicate(&inventory, &item.barcode, Some("b")).is_none());
    }

    #[test]
    fn test_assign_unique_with_digit_heavy_id() {
        let inventory = vec![InventoryItem::new("a", "Truss", 4).with_barcode("881234567890")];
        let item = InventoryItem::new("sku-1234567890123", "Truss", 2);
        assert_eq!(ensure_barcode(item.clone()).barcode, "881234567890");

        let item = assign_unique(&inventory, item).unwrap();
        assert_ne!(item.barcode, "881234567890");
        assert_eq!(item.barcode.len(), GENERATED_LEN);
        assert!(find_duplicate(&inventory, &item.barcode, Some(&item.id)).is_none());
    }
}
