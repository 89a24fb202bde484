// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection behaviour while metadata fetches are outstanding.
//! The metadata source answers only when the test releases a response.

use futures_util::future::{FutureExt, LocalBoxFuture};
use ifc_pick_core::{ElementId, ElementProperties, MetadataError, ModelId, PropertySet};
use ifc_pick_geometry::{ElementMesh, Mesh, Point3, Vector3};
use ifc_pick_selection::{
    ClickOutcome, Config, Highlight, HighlightStyle, Highlighter, MetadataSource, SelectionController,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tokio::sync::oneshot;

type PropertiesReply = Result<ElementProperties, MetadataError>;

/// Metadata source whose property fetches resolve on demand
#[derive(Default)]
struct Deferred {
    fetches: Cell<usize>,
    pending: RefCell<Vec<(ElementId, oneshot::Sender<PropertiesReply>)>>,
}

impl Deferred {
    fn respond(&self, element: ElementId, reply: PropertiesReply) {
        let mut pending = self.pending.borrow_mut();
        let slot = pending
            .iter()
            .position(|(id, _)| *id == element)
            .expect("no pending fetch for element");
        let (_, sender) = pending.remove(slot);
        let _ = sender.send(reply);
    }

    fn succeed(&self, element: ElementId) {
        self.respond(
            element,
            Ok(ElementProperties {
                id: element,
                name: Some(format!("Element {}", element.get())),
                ..Default::default()
            }),
        );
    }
}

impl MetadataSource for Deferred {
    fn fetch_properties(
        &self,
        _model: ModelId,
        element: ElementId,
    ) -> LocalBoxFuture<'static, Result<ElementProperties, MetadataError>> {
        self.fetches.set(self.fetches.get() + 1);
        let (sender, receiver) = oneshot::channel();
        self.pending.borrow_mut().push((element, sender));
        async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(MetadataError::Source("dropped".into())))
        }
        .boxed_local()
    }

    fn fetch_quantities(
        &self,
        _model: ModelId,
        _element: ElementId,
    ) -> LocalBoxFuture<'static, Result<Vec<PropertySet>, MetadataError>> {
        futures_util::future::ready(Ok(Vec::new())).boxed_local()
    }
}

struct NullRenderer;

impl Highlighter for NullRenderer {
    fn set_highlight(&self, _model: ModelId, _elements: &[ElementId], _style: &HighlightStyle) {}

    fn clear_highlight(&self, _model: ModelId) {}
}

const MODEL: ModelId = ModelId(1);
const A: ElementId = ElementId(10);
const B: ElementId = ElementId(20);

/// Element A covers x in [0, 1], element B covers x in [2, 3]
fn scene() -> Vec<ElementMesh> {
    let square = |x: f32, id: ElementId| ElementMesh {
        element_id: id,
        model: MODEL,
        material: 0,
        mesh: Mesh::from_positions(vec![
            x, 0.0, 0.0, x + 1.0, 0.0, 0.0, x + 1.0, 1.0, 0.0, x, 1.0, 0.0,
        ])
        .unwrap()
        .with_indices(vec![0, 1, 2, 0, 2, 3])
        .unwrap(),
    };
    vec![square(0.0, A), square(2.0, B)]
}

fn click_ray(x: f64) -> ifc_pick_geometry::PickRay {
    ifc_pick_geometry::PickRay::new(Point3::new(x, 0.3, 5.0), Vector3::new(0.0, 0.0, -1.0)).unwrap()
}

fn setup() -> (SelectionController, Rc<Deferred>) {
    let source = Rc::new(Deferred::default());
    let mut controller = SelectionController::new(&Config::default(), source.clone(), Rc::new(NullRenderer));
    controller.load_elements(MODEL, &scene()).unwrap();
    (controller, source)
}

#[tokio::test(flavor = "current_thread")]
async fn repeated_clicks_share_one_fetch() {
    let (controller, source) = setup();

    let first = controller.on_pointer_click(&click_ray(0.5)).unwrap().into_hydration().unwrap();
    let second = controller.on_pointer_click(&click_ray(0.5)).unwrap().into_hydration().unwrap();
    assert_eq!(source.fetches.get(), 1);

    source.succeed(A);
    let (a, b) = futures_util::future::join(first, second).await;
    assert!(Rc::ptr_eq(&a.unwrap(), &b.unwrap()));

    let third = controller.on_pointer_click(&click_ray(0.5)).unwrap();
    assert!(third.into_hydration().is_none());
    assert_eq!(source.fetches.get(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn stale_completion_keeps_current_selection() {
    let (controller, source) = setup();

    let hydrate_a = controller.on_pointer_click(&click_ray(0.5)).unwrap().into_hydration().unwrap();
    let hydrate_b = controller.on_pointer_click(&click_ray(2.5)).unwrap().into_hydration().unwrap();

    source.succeed(A);
    hydrate_a.await.unwrap();

    assert_eq!(
        controller.highlight(),
        Some(Highlight {
            element_id: B,
            model: MODEL,
        })
    );
    assert!(controller.selected_metadata().is_none());
    assert!(controller.metadata(MODEL, A).is_some());

    source.succeed(B);
    hydrate_b.await.unwrap();
    assert_eq!(controller.selected_metadata().unwrap().properties.id, B);
}

#[tokio::test(flavor = "current_thread")]
async fn failed_fetch_leaves_selection_intact() {
    let (controller, source) = setup();

    let hydration = controller.on_pointer_click(&click_ray(0.5)).unwrap().into_hydration().unwrap();
    source.respond(A, Err(MetadataError::NotFound { model: MODEL, element: A }));
    let result = hydration.await;

    assert_eq!(result.unwrap_err(), MetadataError::NotFound { model: MODEL, element: A });
    assert_eq!(controller.highlight().map(|h| h.element_id), Some(A));
    assert!(controller.selected_metadata().is_none());

    // Nothing was cached, so the next click asks again
    let retry = controller.on_pointer_click(&click_ray(0.5)).unwrap();
    assert!(matches!(retry, ClickOutcome::Selected { hydration: Some(_), .. }));
    assert_eq!(source.fetches.get(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn clicks_do_not_wait_for_hydration() {
    let (controller, source) = setup();

    let _pending = controller.on_pointer_click(&click_ray(0.5)).unwrap().into_hydration().unwrap();
    let outcome = controller.on_pointer_click(&click_ray(8.0)).unwrap();

    assert!(matches!(outcome, ClickOutcome::Cleared));
    assert_eq!(controller.highlight(), None);
    assert_eq!(source.pending.borrow().len(), 1);
}
