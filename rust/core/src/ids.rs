// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifier newtypes shared by geometry, picking and selection.

use std::fmt;

/// Express ID of a model element (the `#123` in a STEP file).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub u32);

impl ElementId {
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Recover an element ID from a float-encoded element tag.
    ///
    /// Tags travel through float vertex buffers, so the value is rounded to
    /// the nearest integer. Non-finite and out-of-range values are not IDs.
    #[inline]
    pub fn from_tag(tag: f64) -> Option<Self> {
        if !tag.is_finite() {
            return None;
        }
        let rounded = tag.round();
        if rounded < 0.0 || rounded > u32::MAX as f64 {
            return None;
        }
        Some(Self(rounded as u32))
    }

    /// Float encoding used for element-tag vertex channels
    #[inline]
    pub fn as_tag(self) -> f64 {
        self.0 as f64
    }
}

impl From<u32> for ElementId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle of a loaded model, assigned by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelId(pub u32);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model:{}", self.0)
    }
}
