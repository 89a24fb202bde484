// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metadata hydration
//!
//! Property and quantity lookups go through an external [`MetadataSource`].
//! [`MetadataCache::hydrate`] issues at most one fetch per `(model, element)`
//! at a time: callers asking while a fetch is outstanding get a clone of the
//! same [`Hydration`] future and observe the same result.
//!
//! A completed hydration only writes its own cache entry. It never touches the
//! selection, so a late result for an element that is no longer selected is
//! harmless. Evicting a model starts a new load generation for it; fetches
//! issued before the eviction complete without writing anything.

use futures_util::future::{self, FutureExt, LocalBoxFuture, Shared};
use ifc_pick_core::{
    extract_quantities, ElementId, ElementMetadata, ElementProperties, MetadataError, ModelId,
    PropertySet,
};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Outcome of a hydration
pub type MetadataResult = std::result::Result<Rc<ElementMetadata>, MetadataError>;

/// In-flight metadata fetch, shared between every caller that asked for it
pub type Hydration = Shared<LocalBoxFuture<'static, MetadataResult>>;

/// External property lookup
pub trait MetadataSource {
    /// Direct attributes and property sets of an element
    fn fetch_properties(
        &self,
        model: ModelId,
        element: ElementId,
    ) -> LocalBoxFuture<'static, Result<ElementProperties, MetadataError>>;

    /// Quantity sets of an element
    fn fetch_quantities(
        &self,
        model: ModelId,
        element: ElementId,
    ) -> LocalBoxFuture<'static, Result<Vec<PropertySet>, MetadataError>>;
}

type Key = (ModelId, ElementId);

/// Hydrated metadata plus the fetches still in flight
#[derive(Default)]
pub struct MetadataCache {
    entries: RefCell<FxHashMap<Key, Rc<ElementMetadata>>>,
    in_flight: RefCell<FxHashMap<Key, Hydration>>,
    generations: RefCell<FxHashMap<ModelId, u64>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached metadata of an element
    pub fn get(&self, model: ModelId, element: ElementId) -> Option<Rc<ElementMetadata>> {
        self.entries.borrow().get(&(model, element)).cloned()
    }

    #[inline]
    pub fn contains(&self, model: ModelId, element: ElementId) -> bool {
        self.entries.borrow().contains_key(&(model, element))
    }

    #[inline]
    pub fn is_in_flight(&self, model: ModelId, element: ElementId) -> bool {
        self.in_flight.borrow().contains_key(&(model, element))
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drop every cached entry and in-flight fetch of a model (on reload)
    pub fn evict_model(&self, model: ModelId) {
        self.entries.borrow_mut().retain(|(m, _), _| *m != model);
        self.in_flight.borrow_mut().retain(|(m, _), _| *m != model);
        *self.generations.borrow_mut().entry(model).or_default() += 1;
    }

    fn generation(&self, model: ModelId) -> u64 {
        self.generations.borrow().get(&model).copied().unwrap_or_default()
    }

    /// Start, or join, the hydration of an element.
    ///
    /// Returns `None` when the metadata is already cached. The returned future
    /// does nothing until polled; the fetch requests themselves are issued to
    /// the source right away. A failed fetch is logged and leaves no entry, so
    /// a later request tries again.
    pub fn hydrate(
        self: &Rc<Self>,
        source: &dyn MetadataSource,
        model: ModelId,
        element: ElementId,
    ) -> Option<Hydration> {
        let key = (model, element);
        if self.entries.borrow().contains_key(&key) {
            return None;
        }
        if let Some(pending) = self.in_flight.borrow().get(&key) {
            tracing::trace!(%model, %element, "Joining in-flight hydration");
            return Some(pending.clone());
        }

        tracing::debug!(%model, %element, "Hydrating element metadata");
        let properties = source.fetch_properties(model, element);
        let quantities = source.fetch_quantities(model, element);
        let generation = self.generation(model);
        let cache: Weak<Self> = Rc::downgrade(self);

        let hydration = async move {
            let result = future::try_join(properties, quantities)
                .await
                .map(|(properties, quantity_sets)| {
                    Rc::new(ElementMetadata {
                        properties,
                        quantities: extract_quantities(&quantity_sets),
                    })
                });

            if let Some(cache) = cache.upgrade() {
                cache.complete(key, generation, &result);
            }
            result
        }
        .boxed_local()
        .shared();

        self.in_flight.borrow_mut().insert(key, hydration.clone());
        Some(hydration)
    }

    fn complete(&self, key: Key, generation: u64, result: &MetadataResult) {
        let (model, element) = key;
        if generation != self.generation(model) {
            tracing::trace!(%model, %element, "Dropping hydration issued before eviction");
            return;
        }
        self.in_flight.borrow_mut().remove(&key);
        match result {
            Ok(metadata) => {
                self.entries.borrow_mut().insert(key, Rc::clone(metadata));
                tracing::debug!(
                    %model,
                    %element,
                    quantities = metadata.quantities.len(),
                    "Element metadata hydrated"
                );
            }
            Err(err) => {
                tracing::warn!(%model, %element, error = %err, "Metadata hydration failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_pick_core::{Quantity, QuantityValue};
    use std::cell::Cell;

    #[derive(Default)]
    struct Immediate {
        calls: Cell<usize>,
        fail: bool,
        name: Cell<Option<&'static str>>,
    }

    impl MetadataSource for Immediate {
        fn fetch_properties(
            &self,
            _model: ModelId,
            element: ElementId,
        ) -> LocalBoxFuture<'static, Result<ElementProperties, MetadataError>> {
            self.calls.set(self.calls.get() + 1);
            let result = if self.fail {
                Err(MetadataError::Source("offline".into()))
            } else {
                Ok(ElementProperties {
                    id: element,
                    name: Some(self.name.get().unwrap_or("Wall").into()),
                    ..Default::default()
                })
            };
            future::ready(result).boxed_local()
        }

        fn fetch_quantities(
            &self,
            _model: ModelId,
            _element: ElementId,
        ) -> LocalBoxFuture<'static, Result<Vec<PropertySet>, MetadataError>> {
            let mut set = PropertySet::new("Qto_WallBaseQuantities");
            set.quantities.push(Quantity {
                name: "NetVolume".into(),
                value: QuantityValue {
                    volume: Some(2.5),
                    ..Default::default()
                },
            });
            future::ready(Ok(vec![set])).boxed_local()
        }
    }

    #[test]
    fn test_hydrate_then_cached() {
        let cache = Rc::new(MetadataCache::new());
        let source = Immediate::default();

        let hydration = cache.hydrate(&source, ModelId(1), ElementId(5)).unwrap();
        assert!(cache.is_in_flight(ModelId(1), ElementId(5)));

        let metadata = hydration.now_or_never().unwrap().unwrap();
        assert_eq!(metadata.properties.id, ElementId(5));
        assert_eq!(metadata.quantities.get("NetVolume"), Some(2.5));
        assert!(cache.contains(ModelId(1), ElementId(5)));
        assert!(!cache.is_in_flight(ModelId(1), ElementId(5)));

        assert!(cache.hydrate(&source, ModelId(1), ElementId(5)).is_none());
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn test_join_in_flight() {
        let cache = Rc::new(MetadataCache::new());
        let source = Immediate::default();

        let first = cache.hydrate(&source, ModelId(1), ElementId(5)).unwrap();
        let second = cache.hydrate(&source, ModelId(1), ElementId(5)).unwrap();
        assert_eq!(source.calls.get(), 1);

        let a = first.now_or_never().unwrap().unwrap();
        let b = second.now_or_never().unwrap().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_failure_leaves_no_entry() {
        let cache = Rc::new(MetadataCache::new());
        let source = Immediate {
            fail: true,
            ..Default::default()
        };

        let result = cache
            .hydrate(&source, ModelId(1), ElementId(5))
            .unwrap()
            .now_or_never()
            .unwrap();
        assert_eq!(result.unwrap_err(), MetadataError::Source("offline".into()));
        assert!(cache.is_empty());
        assert!(!cache.is_in_flight(ModelId(1), ElementId(5)));
    }

    #[test]
    fn test_evict_model() {
        let cache = Rc::new(MetadataCache::new());
        let source = Immediate::default();
        for (model, element) in [(1, 1), (1, 2), (2, 1)] {
            let _ = cache
                .hydrate(&source, ModelId(model), ElementId(element))
                .unwrap()
                .now_or_never();
        }
        cache.evict_model(ModelId(1));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(ModelId(2), ElementId(1)));
    }

    #[test]
    fn test_evict_drops_in_flight_fetch() {
        let cache = Rc::new(MetadataCache::new());
        let source = Immediate::default();

        let stale = cache.hydrate(&source, ModelId(1), ElementId(5)).unwrap();
        cache.evict_model(ModelId(1));
        assert!(!cache.is_in_flight(ModelId(1), ElementId(5)));

        source.name.set(Some("gen2"));
        let fresh = cache.hydrate(&source, ModelId(1), ElementId(5)).unwrap();
        assert_eq!(source.calls.get(), 2);

        // The pre-eviction fetch finishes first but must not populate the cache
        let old = stale.now_or_never().unwrap().unwrap();
        assert_eq!(old.properties.name.as_deref(), Some("Wall"));
        assert!(!cache.contains(ModelId(1), ElementId(5)));
        assert!(cache.is_in_flight(ModelId(1), ElementId(5)));

        fresh.now_or_never().unwrap().unwrap();
        let cached = cache.get(ModelId(1), ElementId(5)).unwrap();
        assert_eq!(cached.properties.name.as_deref(), Some("gen2"));
        assert!(!cache.is_in_flight(ModelId(1), ElementId(5)));
    }
}
