// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for selection operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the selection controller.
///
/// Metadata failures never appear here: they are reported through the
/// hydration future and logged, and leave the selection untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Geometry error: {0}")]
    Geometry(#[from] ifc_pick_geometry::Error),
}
