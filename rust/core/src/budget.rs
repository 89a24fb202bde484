// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Budget aggregation over selected elements
//!
//! A budget is a user-curated list of line items, each seeded from the
//! metadata of a selected element. Totals are plain sums over the numeric
//! fields already on the items.

use crate::error::{Error, Result};
use crate::ids::ElementId;
use crate::kind::ElementKind;
use crate::metadata::{primary_quantity, ElementMetadata};

/// One line of a budget
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BudgetItem {
    /// Unique key of the line (an element can appear on several lines)
    pub id: String,
    pub element_id: ElementId,
    pub name: String,
    pub kind: ElementKind,
    pub quantity_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub unit_price: Option<f64>,
}

impl BudgetItem {
    /// Seed a line item from hydrated element metadata.
    ///
    /// The quantity is the element's primary quantity, if it has any.
    pub fn from_metadata(id: impl Into<String>, metadata: &ElementMetadata) -> Self {
        let primary = primary_quantity(&metadata.quantities);
        Self {
            id: id.into(),
            element_id: metadata.properties.id,
            name: metadata.properties.display_name(),
            kind: metadata.properties.kind.clone(),
            quantity_name: primary.map(|(name, _)| name.to_string()),
            quantity: primary.map(|(_, value)| value),
            unit: None,
            unit_price: None,
        }
    }

    /// Quantity times unit price, with missing fields counting as zero
    pub fn subtotal(&self) -> f64 {
        self.quantity.unwrap_or(0.0) * self.unit_price.unwrap_or(0.0)
    }
}

/// Partial update of a budget line; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct BudgetItemPatch {
    pub name: Option<String>,
    pub quantity: Option<Option<f64>>,
    pub unit: Option<Option<String>>,
    pub unit_price: Option<Option<f64>>,
}

/// Ordered list of budget lines
#[derive(Debug, Clone, Default)]
pub struct Budget {
    items: Vec<BudgetItem>,
}

impl Budget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: BudgetItem) {
        self.items.push(item);
    }

    /// Remove a line by key. Removing an unknown key is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<BudgetItem> {
        let position = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(position))
    }

    pub fn update(&mut self, id: &str, patch: BudgetItemPatch) -> Result<&BudgetItem> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::UnknownBudgetItem(id.to_string()))?;

        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity.filter(|v| v.is_finite());
        }
        if let Some(unit) = patch.unit {
            item.unit = unit;
        }
        if let Some(unit_price) = patch.unit_price {
            item.unit_price = unit_price.filter(|v| v.is_finite());
        }
        Ok(item)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[BudgetItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Simple sum of line quantities, regardless of unit
    pub fn total_quantity(&self) -> f64 {
        self.items.iter().map(|item| item.quantity.unwrap_or(0.0)).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.items.iter().map(BudgetItem::subtotal).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ElementProperties, QuantityMap};
    use approx::assert_relative_eq;

    fn wall_metadata() -> ElementMetadata {
        let mut quantities = QuantityMap::new();
        quantities.insert("Height", 3.0);
        quantities.insert("NetVolume", 1.5);
        ElementMetadata {
            properties: ElementProperties {
                id: ElementId(101),
                kind: ElementKind::Wall,
                name: Some("Basic Wall".to_string()),
                ..Default::default()
            },
            quantities,
        }
    }

    #[test]
    fn test_item_from_metadata() {
        let item = BudgetItem::from_metadata("101-1", &wall_metadata());
        assert_eq!(item.element_id, ElementId(101));
        assert_eq!(item.name, "Basic Wall");
        assert_eq!(item.kind, ElementKind::Wall);
        assert_eq!(item.quantity_name.as_deref(), Some("NetVolume"));
        assert_eq!(item.quantity, Some(1.5));
    }

    #[test]
    fn test_item_without_quantities() {
        let metadata = ElementMetadata {
            properties: ElementProperties {
                id: ElementId(5),
                ..Default::default()
            },
            quantities: QuantityMap::new(),
        };
        let item = BudgetItem::from_metadata("5-1", &metadata);
        assert_eq!(item.name, "Element 5");
        assert_eq!(item.quantity, None);
        assert_eq!(item.subtotal(), 0.0);
    }

    #[test]
    fn test_totals() {
        let mut budget = Budget::new();
        budget.add(BudgetItem::from_metadata("a", &wall_metadata()));
        budget.add(BudgetItem::from_metadata("b", &wall_metadata()));

        budget
            .update(
                "a",
                BudgetItemPatch {
                    unit_price: Some(Some(100.0)),
                    unit: Some(Some("m3".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();
        budget
            .update(
                "b",
                BudgetItemPatch {
                    quantity: Some(Some(2.0)),
                    unit_price: Some(Some(10.0)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_relative_eq!(budget.total_quantity(), 3.5);
        assert_relative_eq!(budget.total_cost(), 170.0);
    }

    #[test]
    fn test_update_rejects_non_finite() {
        let mut budget = Budget::new();
        budget.add(BudgetItem::from_metadata("a", &wall_metadata()));
        let item = budget
            .update(
                "a",
                BudgetItemPatch {
                    quantity: Some(Some(f64::NAN)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(item.quantity, None);
    }

    #[test]
    fn test_remove_and_unknown() {
        let mut budget = Budget::new();
        budget.add(BudgetItem::from_metadata("a", &wall_metadata()));
        assert!(budget.remove("missing").is_none());
        assert!(budget.remove("a").is_some());
        assert!(budget.is_empty());

        let err = budget.update("a", BudgetItemPatch::default()).unwrap_err();
        assert_eq!(err, Error::UnknownBudgetItem("a".to_string()));
    }
}
