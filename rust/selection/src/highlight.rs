// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Highlight state and the rendering collaborator that draws it

use ifc_pick_core::{ElementId, ModelId};
use std::cell::Cell;

/// Currently highlighted element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Highlight {
    pub element_id: ElementId,
    pub model: ModelId,
}

/// Holder of the current highlight.
///
/// The element and its model are always written together in one replace, so
/// readers never observe one without the other.
#[derive(Debug, Default)]
pub struct HighlightState {
    current: Cell<Option<Highlight>>,
}

impl HighlightState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> Option<Highlight> {
        self.current.get()
    }

    /// Swap in a new highlight, returning the previous one
    #[inline]
    pub fn replace(&self, next: Option<Highlight>) -> Option<Highlight> {
        self.current.replace(next)
    }

    /// Remove the highlight, returning what was highlighted
    #[inline]
    pub fn clear(&self) -> Option<Highlight> {
        self.current.take()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current.get().is_none()
    }
}

/// How the renderer should draw highlighted elements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightStyle {
    /// `0xRRGGBB`
    pub color: u32,
    pub opacity: f32,
}

impl HighlightStyle {
    pub const DEFAULT_COLOR: u32 = 0xffa500;
    pub const DEFAULT_OPACITY: f32 = 0.6;

    /// Color as linear `[r, g, b]` components in `0.0..=1.0`
    pub fn rgb(&self) -> [f32; 3] {
        let channel = |shift: u32| ((self.color >> shift) & 0xff) as f32 / 255.0;
        [channel(16), channel(8), channel(0)]
    }
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            color: Self::DEFAULT_COLOR,
            opacity: Self::DEFAULT_OPACITY,
        }
    }
}

/// Rendering side of the highlight.
///
/// Called synchronously from the pointer handler; implementations should only
/// record the request and apply it on the next frame.
pub trait Highlighter {
    fn set_highlight(&self, model: ModelId, elements: &[ElementId], style: &HighlightStyle);

    fn clear_highlight(&self, model: ModelId);
}
