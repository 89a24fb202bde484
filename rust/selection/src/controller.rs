// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pointer selection
//!
//! [`SelectionController`] turns pointer clicks into a highlighted element.
//! It owns the loaded scene and the [`HighlightState`], drives the pick
//! resolver, tells the renderer what to draw, and starts metadata hydration
//! for newly selected elements. Clicks never wait on hydration.

use crate::config::Config;
use crate::error::Result;
use crate::highlight::{Highlight, HighlightState, HighlightStyle, Highlighter};
use crate::hydration::{Hydration, MetadataCache, MetadataSource};
use ifc_pick_core::{BudgetItem, ElementId, ElementMetadata, ModelId};
use ifc_pick_geometry::{
    BatchedMesh, Camera, ElementMesh, GeometryBatcher, PickRay, PickResolver, PickResult, Viewport,
};
use std::rc::Rc;

/// Identifies a listener registered with [`SelectionController::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

type Listener = Box<dyn Fn(Option<Highlight>)>;

/// What a click did
pub enum ClickOutcome {
    /// Nothing was hit; the selection is empty
    Cleared,
    /// An element was selected
    Selected {
        pick: PickResult,
        /// Metadata fetch to drive, absent when the metadata is cached
        hydration: Option<Hydration>,
    },
}

impl ClickOutcome {
    pub fn pick(&self) -> Option<&PickResult> {
        match self {
            ClickOutcome::Cleared => None,
            ClickOutcome::Selected { pick, .. } => Some(pick),
        }
    }

    pub fn into_hydration(self) -> Option<Hydration> {
        match self {
            ClickOutcome::Cleared => None,
            ClickOutcome::Selected { hydration, .. } => hydration,
        }
    }
}

struct Scene {
    model: ModelId,
    batches: Vec<BatchedMesh>,
}

/// Selection state machine for one viewer
pub struct SelectionController {
    batcher: GeometryBatcher,
    resolver: PickResolver,
    style: HighlightStyle,
    scene: Option<Scene>,
    highlight: HighlightState,
    cache: Rc<MetadataCache>,
    source: Rc<dyn MetadataSource>,
    highlighter: Rc<dyn Highlighter>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: usize,
}

impl SelectionController {
    pub fn new(config: &Config, source: Rc<dyn MetadataSource>, highlighter: Rc<dyn Highlighter>) -> Self {
        Self {
            batcher: GeometryBatcher::new(config.batch),
            resolver: PickResolver::new(config.pick),
            style: config.highlight,
            scene: None,
            highlight: HighlightState::new(),
            cache: Rc::new(MetadataCache::new()),
            source,
            highlighter,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Batch the element meshes of a freshly loaded model and make it the
    /// active scene. Returns the number of batches.
    pub fn load_elements(&mut self, model: ModelId, elements: &[ElementMesh]) -> Result<usize> {
        let batches = self.batcher.batch_elements(elements)?;
        let count = batches.len();
        self.set_scene(model, batches);
        Ok(count)
    }

    /// Replace the pickable scene and clear the selection.
    ///
    /// Batches without a model are stamped with `model`.
    pub fn set_scene(&mut self, model: ModelId, batches: Vec<BatchedMesh>) {
        let batches: Vec<BatchedMesh> = batches
            .into_iter()
            .map(|batch| match batch.model() {
                Some(_) => batch,
                None => batch.with_model(model),
            })
            .collect();

        tracing::debug!(%model, batches = batches.len(), "Scene loaded");
        self.clear();
        if self.scene.as_ref().is_some_and(|scene| scene.model == model) {
            self.cache.evict_model(model);
        }
        self.scene = Some(Scene { model, batches });
    }

    /// Active model, if a scene is loaded
    pub fn model(&self) -> Option<ModelId> {
        self.scene.as_ref().map(|scene| scene.model)
    }

    pub fn batches(&self) -> &[BatchedMesh] {
        self.scene
            .as_ref()
            .map(|scene| scene.batches.as_slice())
            .unwrap_or_default()
    }

    /// Current highlight
    #[inline]
    pub fn highlight(&self) -> Option<Highlight> {
        self.highlight.current()
    }

    pub fn style(&self) -> &HighlightStyle {
        &self.style
    }

    /// Handle a pointer event in viewport pixels
    pub fn on_pointer_event(
        &self,
        camera: &Camera,
        viewport: &Viewport,
        client_x: f64,
        client_y: f64,
    ) -> Result<ClickOutcome> {
        let ray = viewport
            .to_ndc(client_x, client_y)
            .and_then(|ndc| PickRay::from_camera(camera, ndc));
        match ray {
            Some(ray) => self.on_pointer_click(&ray),
            None => {
                tracing::debug!(client_x, client_y, "No pick ray for pointer event");
                self.clear();
                Ok(ClickOutcome::Cleared)
            }
        }
    }

    /// Select whatever the ray hits in the active model.
    ///
    /// A miss clears the selection. A hit replaces the highlight and returns
    /// the hydration to drive, if the element's metadata is not cached yet.
    /// Structural errors clear the selection and are returned.
    pub fn on_pointer_click(&self, ray: &PickRay) -> Result<ClickOutcome> {
        let Some(scene) = &self.scene else {
            self.clear();
            return Ok(ClickOutcome::Cleared);
        };

        let pick = match self.resolver.resolve(ray, &scene.batches, Some(scene.model)) {
            Ok(pick) => pick,
            Err(err) => {
                tracing::error!(model = %scene.model, error = %err, "Pick failed");
                self.clear();
                return Err(err.into());
            }
        };

        let Some(pick) = pick else {
            self.clear();
            return Ok(ClickOutcome::Cleared);
        };

        let next = Highlight {
            element_id: pick.element_id,
            model: scene.model,
        };
        let previous = self.highlight.replace(Some(next));
        if let Some(previous) = previous.filter(|p| p.model != next.model) {
            self.highlighter.clear_highlight(previous.model);
        }
        self.highlighter
            .set_highlight(next.model, &[next.element_id], &self.style);
        self.notify(Some(next));

        tracing::debug!(
            element = %pick.element_id,
            confidence = ?pick.confidence,
            distance = pick.distance,
            "Element selected"
        );

        let hydration = self.cache.hydrate(self.source.as_ref(), next.model, next.element_id);
        Ok(ClickOutcome::Selected { pick, hydration })
    }

    /// Clear the selection. Does nothing when nothing is selected.
    pub fn clear(&self) {
        if let Some(previous) = self.highlight.clear() {
            self.highlighter.clear_highlight(previous.model);
            self.notify(None);
        }
    }

    /// Register a listener called with the new highlight on every change
    pub fn subscribe(&mut self, listener: impl Fn(Option<Highlight>) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Cached metadata of any element
    pub fn metadata(&self, model: ModelId, element: ElementId) -> Option<Rc<ElementMetadata>> {
        self.cache.get(model, element)
    }

    /// Cached metadata of the selected element
    pub fn selected_metadata(&self) -> Option<Rc<ElementMetadata>> {
        let current = self.highlight.current()?;
        self.cache.get(current.model, current.element_id)
    }

    /// Budget line for the selected element, once its metadata is hydrated
    pub fn selected_budget_item(&self, id: impl Into<String>) -> Option<BudgetItem> {
        self.selected_metadata()
            .map(|metadata| BudgetItem::from_metadata(id, &metadata))
    }

    fn notify(&self, highlight: Option<Highlight>) {
        for (_, listener) in &self.listeners {
            listener(highlight);
        }
    }
}
