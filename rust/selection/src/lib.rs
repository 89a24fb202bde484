// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Pick Selection
//!
//! Single-threaded selection layer for an IFC viewer: pointer clicks become a
//! highlighted element, and the element's metadata is fetched in the
//! background through a caller-provided [`MetadataSource`].
//!
//! ```rust,ignore
//! let mut selection = SelectionController::new(&Config::from_env(), source, renderer);
//! selection.load_elements(model, &element_meshes)?;
//!
//! if let ClickOutcome::Selected { hydration: Some(hydration), .. } =
//!     selection.on_pointer_event(&camera, &viewport, x, y)?
//! {
//!     wasm_bindgen_futures::spawn_local(async move {
//!         let _ = hydration.await;
//!     });
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod highlight;
pub mod hydration;

pub use config::Config;
pub use controller::{ClickOutcome, ListenerId, SelectionController};
pub use error::{Error, Result};
pub use highlight::{Highlight, HighlightState, HighlightStyle, Highlighter};
pub use hydration::{Hydration, MetadataCache, MetadataResult, MetadataSource};
