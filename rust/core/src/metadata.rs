// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element metadata model
//!
//! Properties and quantities as delivered by the metadata collaborator. The
//! selection core caches these per element and never interprets the values;
//! the helpers here only flatten quantity sets for display and budgeting.

use crate::ids::ElementId;
use crate::kind::ElementKind;
use rustc_hash::FxHashMap;

/// Value of a single property in a property set
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue {
    Text(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    List(Vec<PropertyValue>),
    Null,
}

impl PropertyValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Measured value of an element quantity.
///
/// Quantity sets carry one value slot per measure; the first populated slot
/// in the order below is the quantity's value.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantityValue {
    pub volume: Option<f64>,
    pub area: Option<f64>,
    pub length: Option<f64>,
    pub count: Option<f64>,
    pub weight: Option<f64>,
}

impl QuantityValue {
    pub fn value(&self) -> Option<f64> {
        self.volume
            .or(self.area)
            .or(self.length)
            .or(self.count)
            .or(self.weight)
    }
}

/// A named quantity inside a quantity set
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quantity {
    pub name: String,
    pub value: QuantityValue,
}

/// A property set or quantity set attached to an element
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertySet {
    pub name: String,
    pub properties: Vec<(String, PropertyValue)>,
    pub quantities: Vec<Quantity>,
}

impl PropertySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up a property by name
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Direct attributes and property sets of one element
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementProperties {
    pub id: ElementId,
    pub kind: ElementKind,
    pub name: Option<String>,
    pub global_id: Option<String>,
    pub property_sets: Vec<PropertySet>,
}

impl ElementProperties {
    /// Display name, falling back to `Element <id>`
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Element {}", self.id.get()),
        }
    }
}

/// Flat `name -> value` mapping of quantities, in first-seen order.
///
/// Re-inserting a name updates the value in place and keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantityMap {
    entries: Vec<(String, f64)>,
    index: FxHashMap<String, usize>,
}

impl QuantityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&slot| self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl FromIterator<(String, f64)> for QuantityMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

/// Everything known about one element once hydration completes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementMetadata {
    pub properties: ElementProperties,
    pub quantities: QuantityMap,
}

/// Flatten the quantity sets of an element into a single map.
///
/// Quantities without a usable value or without a name are skipped. When two
/// sets report the same name, the later set wins.
pub fn extract_quantities(property_sets: &[PropertySet]) -> QuantityMap {
    let mut map = QuantityMap::new();
    for set in property_sets {
        for quantity in &set.quantities {
            if quantity.name.is_empty() {
                continue;
            }
            if let Some(value) = quantity.value.value() {
                map.insert(quantity.name.clone(), value);
            }
        }
    }
    map
}

const PRIMARY_QUANTITY_HINTS: [&str; 6] = ["volume", "área", "area", "length", "count", "weight"];

/// Pick the quantity most useful for budgeting.
///
/// Prefers the first quantity whose name mentions a volume, area, length,
/// count or weight, and otherwise falls back to the first quantity.
pub fn primary_quantity(quantities: &QuantityMap) -> Option<(&str, f64)> {
    quantities
        .iter()
        .find(|(name, _)| {
            let lower = name.to_lowercase();
            PRIMARY_QUANTITY_HINTS.iter().any(|hint| lower.contains(hint))
        })
        .or_else(|| quantities.iter().next())
}
