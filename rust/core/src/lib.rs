// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Pick Core
//!
//! Shared element data model for the IFC-Pick crates.
//!
//! ## Overview
//!
//! - **Identifiers**: [`ElementId`] (express ID) and [`ModelId`] (loaded model handle)
//! - **Element kinds**: explicit [`ElementKind`] stamped by the parser
//! - **Metadata**: property sets, quantity sets and the flattened [`QuantityMap`]
//! - **Budget**: line items seeded from selected elements, with totals
//!
//! Parsing of the model file itself lives outside this workspace; the types
//! here are what the parser and the metadata collaborator hand over.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for the data model

pub mod budget;
pub mod error;
pub mod ids;
pub mod kind;
pub mod metadata;

pub use budget::{Budget, BudgetItem, BudgetItemPatch};
pub use error::{Error, MetadataError, Result};
pub use ids::{ElementId, ModelId};
pub use kind::ElementKind;
pub use metadata::{
    extract_quantities, primary_quantity, ElementMetadata, ElementProperties, PropertySet,
    PropertyValue, Quantity, QuantityMap, QuantityValue,
};
