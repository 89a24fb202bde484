// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ids::{ElementId, ModelId};
use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the element data model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unknown budget item: {0}")]
    UnknownBudgetItem(String),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

/// Failure reported by a metadata collaborator.
///
/// Cloneable so that a single failed fetch can be observed by every caller
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataError {
    #[error("Element {element} not found in {model}")]
    NotFound { model: ModelId, element: ElementId },

    #[error("Metadata source failed: {0}")]
    Source(String),
}
