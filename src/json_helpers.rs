//! JSON deserialization helpers for persisted documents
//!
//! Documents written by older clients store quantities inconsistently: plain
//! integers, floats from arithmetic in the browser, numeric strings, or `null`
//! where a field was `undefined`. These deserializers accept all of them so a
//! document can always be loaded and normalized.

use serde::de::{self, Deserializer, Visitor};
use std::fmt;

/// Round a raw numeric value to a non-negative quantity.
fn clamp_quantity(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value.round() as u32
    }
}

struct QuantityVisitor;

impl<'de> Visitor<'de> for QuantityVisitor {
    type Value = Option<u32>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a quantity as a number, a numeric string, or null")
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(u32::try_from(value).unwrap_or(u32::MAX)))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(u32::try_from(value.max(0)).unwrap_or(u32::MAX)))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(clamp_quantity(value)))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<f64>()
            .map(|v| Some(clamp_quantity(v)))
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(value), &self))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

/// Deserialize a stored quantity, treating `null` and blank strings as zero.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Row {
///     #[serde(deserialize_with = "eventgear::json_helpers::deserialize_quantity")]
///     qty: u32,
/// }
///
/// let row: Row = serde_json::from_str(r#"{"qty": "4"}"#).unwrap();
/// assert_eq!(row.qty, 4);
/// let row: Row = serde_json::from_str(r#"{"qty": 2.6}"#).unwrap();
/// assert_eq!(row.qty, 3);
/// let row: Row = serde_json::from_str(r#"{"qty": null}"#).unwrap();
/// assert_eq!(row.qty, 0);
/// ```
pub fn deserialize_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserializer
        .deserialize_option(QuantityVisitor)?
        .unwrap_or(0))
}

/// Deserialize an optional quantity; `null` and blank strings stay `None`.
pub fn deserialize_opt_quantity<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(QuantityVisitor)
}

/// A quantity read through [`deserialize_quantity`], for map and sequence values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LenientQuantity(pub u32);

impl<'de> serde::Deserialize<'de> for LenientQuantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_quantity(deserializer).map(LenientQuantity)
    }
}

/// Deserialize a string that older documents may have stored as `null`.
pub fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "deserialize_quantity")]
        qty: u32,
        #[serde(default, deserialize_with = "deserialize_opt_quantity")]
        requested: Option<u32>,
        #[serde(default, deserialize_with = "deserialize_string_or_null")]
        label: String,
    }

    fn sample(json: &str) -> Sample {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_quantity_accepts_mixed_representations() {
        assert_eq!(sample(r#"{"qty": 7}"#).qty, 7);
        assert_eq!(sample(r#"{"qty": "12"}"#).qty, 12);
        assert_eq!(sample(r#"{"qty": 1.5}"#).qty, 2);
        assert_eq!(sample(r#"{"qty": -3}"#).qty, 0);
        assert_eq!(sample(r#"{"qty": null}"#).qty, 0);
        assert_eq!(sample(r#"{}"#).qty, 0);
    }

    #[test]
    fn test_quantity_rejects_garbage_strings() {
        assert!(serde_json::from_str::<Sample>(r#"{"qty": "lots"}"#).is_err());
    }

    #[test]
    fn test_optional_quantity_keeps_absence() {
        assert_eq!(sample(r#"{}"#).requested, None);
        assert_eq!(sample(r#"{"requested": null}"#).requested, None);
        assert_eq!(sample(r#"{"requested": " "}"#).requested, None);
        assert_eq!(sample(r#"{"requested": 0.4}"#).requested, Some(0));
        assert_eq!(sample(r#"{"requested": 3}"#).requested, Some(3));
    }

    #[test]
    fn test_lenient_quantity_in_maps() {
        let map: std::collections::BTreeMap<String, LenientQuantity> =
            serde_json::from_str(r#"{"a": 2.0, "b": "3", "c": null, "d": 4}"#).unwrap();
        assert_eq!(map["a"], LenientQuantity(2));
        assert_eq!(map["b"], LenientQuantity(3));
        assert_eq!(map["c"], LenientQuantity(0));
        assert_eq!(map["d"], LenientQuantity(4));
    }

    #[test]
    fn test_null_string_becomes_empty() {
        assert_eq!(sample(r#"{"label": null}"#).label, "");
        assert_eq!(sample(r#"{"label": "Truss"}"#).label, "Truss");
    }
}
