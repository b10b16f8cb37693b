//! Delivery
//!
//! Flat delivery fees looked up by city and neighborhood from a static table.

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prices::Price;

/// Errors loading a delivery table.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// IO error reading the table file
    #[error("failed to read delivery table: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse delivery table: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// The table has no cities
    #[error("delivery table is empty")]
    Empty,
}

/// Where the order is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    /// City name
    pub city: String,

    /// Neighborhood within the city
    pub neighborhood: String,
}

impl DeliveryInfo {
    /// Creates a delivery selection.
    pub fn new(city: impl Into<String>, neighborhood: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            neighborhood: neighborhood.into(),
        }
    }
}

/// City -> neighborhood -> flat fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryTable {
    cities: BTreeMap<String, BTreeMap<String, Price>>,
}

const DEFAULT_TABLE: &[(&str, &[(&str, u64)])] = &[
    (
        "Central City",
        &[
            ("Downtown", 800),
            ("Old Town", 800),
            ("Riverside", 1000),
            ("University District", 1000),
            ("Harbor", 1200),
        ],
    ),
    (
        "North Valley",
        &[("Hillcrest", 1500), ("Lakeside", 1500), ("Pine Ridge", 1800)],
    ),
    (
        "South Bay",
        &[("Marina", 1200), ("Seaview", 1400), ("Industrial Park", 2000)],
    ),
];

impl Default for DeliveryTable {
    fn default() -> Self {
        let cities = DEFAULT_TABLE
            .iter()
            .map(|(city, neighborhoods)| {
                let fees = neighborhoods
                    .iter()
                    .map(|(name, fee)| ((*name).to_string(), Price::new(*fee)))
                    .collect();

                ((*city).to_string(), fees)
            })
            .collect();

        Self { cities }
    }
}

impl DeliveryTable {
    /// Builds a table from nested maps.
    pub fn new(cities: BTreeMap<String, BTreeMap<String, Price>>) -> Self {
        Self { cities }
    }

    /// Parses a YAML table.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Yaml`] for malformed input and [`DeliveryError::Empty`]
    /// when no city is defined.
    pub fn from_yaml(yaml: &str) -> Result<Self, DeliveryError> {
        let table: DeliveryTable = serde_norway::from_str(yaml)?;

        if table.cities.is_empty() {
            return Err(DeliveryError::Empty);
        }

        Ok(table)
    }

    /// Reads a YAML table from disk.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DeliveryError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Fee for a delivery selection, if the pair is known.
    pub fn fee(&self, delivery: &DeliveryInfo) -> Option<Price> {
        let (_, neighborhoods) = find_key(&self.cities, &delivery.city)?;
        let (_, fee) = find_key(neighborhoods, &delivery.neighborhood)?;

        Some(*fee)
    }

    /// Fee for an optional selection; unknown or absent pairs cost nothing.
    pub fn fee_or_zero(&self, delivery: Option<&DeliveryInfo>) -> Price {
        delivery.and_then(|d| self.fee(d)).unwrap_or(Price::ZERO)
    }

    /// Whether the pair exists in the table.
    pub fn contains(&self, delivery: &DeliveryInfo) -> bool {
        self.fee(delivery).is_some()
    }

    /// City names in sorted order.
    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.cities.keys().map(String::as_str)
    }

    /// Neighborhoods and fees for a city.
    pub fn neighborhoods(&self, city: &str) -> Vec<(&str, Price)> {
        find_key(&self.cities, city)
            .map(|(_, neighborhoods)| {
                neighborhoods
                    .iter()
                    .map(|(name, fee)| (name.as_str(), *fee))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn find_key<'a, V>(map: &'a BTreeMap<String, V>, wanted: &str) -> Option<(&'a String, &'a V)> {
    let wanted = wanted.trim().to_lowercase();

    map.iter().find(|(key, _)| key.trim().to_lowercase() == wanted)
}
