//! The orderable item catalog.
//!
//! Built once at startup and shared read-only behind an `Arc`. Definition
//! order is preserved so selection prompts render in a stable sequence.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OrderError, Result};

/// A non-negative amount of money, stored as whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price {
    cents: u64,
}

impl Price {
    pub const fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }
}

impl TryFrom<f64> for Price {
    type Error = OrderError;

    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(OrderError::Config(format!(
                "price must be a non-negative number, got {value}"
            )));
        }
        Ok(Self {
            cents: (value * 100.0).round() as u64,
        })
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> f64 {
        price.cents as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

/// One orderable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub price: Price,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }

    /// Button label shown in the selection prompt, e.g. `Vodka - $80.00`.
    pub fn option_label(&self) -> String {
        format!("{} - ${}", self.name, self.price)
    }
}

/// Immutable id → entry mapping with stable iteration order.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting empty or duplicate ids.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(OrderError::Config(format!(
                    "catalog entry #{i} has an empty id"
                )));
            }
            if index.insert(entry.id.clone(), i).is_some() {
                return Err(OrderError::Config(format!(
                    "duplicate catalog id '{}'",
                    entry.id
                )));
            }
        }
        Ok(Self { entries, index })
    }

    pub fn lookup(&self, item_id: &str) -> Option<&CatalogEntry> {
        self.index.get(item_id).map(|&i| &self.entries[i])
    }

    /// Entries in definition order.
    pub fn list(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    /// The built-in menu used when no catalog is configured.
    fn default() -> Self {
        let entries = vec![
            CatalogEntry::new("vodka - absolute", "Vodka", Price::from_cents(8_000)),
            CatalogEntry::new("jagermaister", "Jagermaister", Price::from_cents(8_050)),
            CatalogEntry::new("vvvisky", "VVVisky", Price::from_cents(8_000)),
            CatalogEntry::new("soda", "Soda Pop 🥤", Price::from_cents(300_000)),
        ];
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        Self { entries, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_renders_two_decimals() {
        assert_eq!(Price::from_cents(300_000).to_string(), "3000.00");
        assert_eq!(Price::from_cents(8_050).to_string(), "80.50");
        assert_eq!(Price::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn price_from_float_rounds_to_cents() {
        assert_eq!(Price::try_from(80.5).unwrap().cents(), 8_050);
        assert_eq!(Price::try_from(0.1 + 0.2).unwrap().cents(), 30);
        assert!(Price::try_from(-1.0).is_err());
        assert!(Price::try_from(f64::NAN).is_err());
    }

    #[test]
    fn default_catalog_keeps_definition_order() {
        let catalog = Catalog::default();
        let ids: Vec<&str> = catalog.list().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["vodka - absolute", "jagermaister", "vvvisky", "soda"]);
    }

    #[test]
    fn lookup_hits_and_misses() {
        let catalog = Catalog::default();
        assert_eq!(catalog.lookup("soda").unwrap().name, "Soda Pop 🥤");
        assert_eq!(catalog.lookup("vodka - absolute").unwrap().name, "Vodka");
        assert!(catalog.lookup("vodka").is_none());
        assert!(catalog.lookup("beer").is_none());
        assert!(catalog.lookup("").is_none());
    }

    #[test]
    fn option_label_format() {
        let catalog = Catalog::default();
        assert_eq!(catalog.lookup("jagermaister").unwrap().option_label(), "Jagermaister - $80.50");
    }

    #[test]
    fn duplicate_ids_rejected() {
        let result = Catalog::new(vec![
            CatalogEntry::new("a", "A", Price::from_cents(100)),
            CatalogEntry::new("a", "Again", Price::from_cents(200)),
        ]);
        assert!(matches!(result, Err(OrderError::Config(_))));
    }

    #[test]
    fn empty_id_rejected() {
        let result = Catalog::new(vec![CatalogEntry::new("  ", "Blank", Price::from_cents(1))]);
        assert!(result.is_err());
    }
}
