// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end picking: element meshes are batched, a pointer position is
//! unprojected through a camera, and the hit is resolved back to its element.

use approx::assert_relative_eq;
use ifc_pick_core::{ElementId, ModelId};
use ifc_pick_geometry::{
    merge_meshes, AttributeData, BatchConfig, Camera, Channel, Confidence, ElementMesh, GeometryBatcher,
    Mesh, PickRay, PickResolver, Point3, Vector3, Viewport,
};

const MODEL: ModelId = ModelId(3);

/// Axis-aligned box with 12 triangles
fn cuboid(min: [f32; 3], max: [f32; 3]) -> Mesh {
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;
    let positions = vec![
        x0, y0, z0, x1, y0, z0, x1, y1, z0, x0, y1, z0, // bottom
        x0, y0, z1, x1, y0, z1, x1, y1, z1, x0, y1, z1, // top
    ];
    let indices = vec![
        0, 2, 1, 0, 3, 2, // bottom
        4, 5, 6, 4, 6, 7, // top
        0, 1, 5, 0, 5, 4, // front
        2, 3, 7, 2, 7, 6, // back
        1, 2, 6, 1, 6, 5, // right
        3, 0, 4, 3, 4, 7, // left
    ];
    Mesh::from_positions(positions)
        .unwrap()
        .with_indices(indices)
        .unwrap()
}

/// Three walls side by side along x, two sharing a material
fn walls() -> Vec<ElementMesh> {
    [(101, 0, 0.0), (102, 1, 2.0), (103, 0, 4.0)]
        .into_iter()
        .map(|(id, material, x)| ElementMesh {
            element_id: ElementId(id),
            model: MODEL,
            material,
            mesh: cuboid([x, 0.0, 0.0], [x + 1.0, 1.0, 3.0]),
        })
        .collect()
}

fn top_down_camera() -> Camera {
    Camera::perspective(
        Point3::new(2.5, 0.3, 20.0),
        Point3::new(2.5, 0.3, 0.0),
        Vector3::y(),
        45.0,
        1.0,
        0.1,
        100.0,
    )
}

#[test]
fn pick_through_camera() {
    let batches = GeometryBatcher::default().batch_elements(&walls()).unwrap();
    assert_eq!(batches.len(), 2);

    let viewport = Viewport::new(0.0, 0.0, 800.0, 800.0);
    let camera = top_down_camera();
    let resolver = PickResolver::default();

    // Straight down through the middle wall
    let ndc = viewport.to_ndc(400.0, 400.0).unwrap();
    let ray = PickRay::from_camera(&camera, ndc).unwrap();
    let pick = resolver.resolve(&ray, &batches, Some(MODEL)).unwrap().unwrap();

    assert_eq!(pick.element_id, ElementId(102));
    assert_eq!(pick.confidence, Confidence::Exact);
    assert_eq!(pick.source.batch_index, 1);
    assert_relative_eq!(pick.point.z, 3.0, epsilon = 1e-6);
}

#[test]
fn pick_other_model_is_filtered() {
    let batches = GeometryBatcher::default().batch_elements(&walls()).unwrap();
    let ray = PickRay::new(Point3::new(0.5, 0.3, 10.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
    let resolver = PickResolver::default();

    assert!(resolver.resolve(&ray, &batches, Some(ModelId(4))).unwrap().is_none());
    assert_eq!(
        resolver.resolve(&ray, &batches, None).unwrap().unwrap().element_id,
        ElementId(101)
    );
}

#[test]
fn batched_tags_follow_source_ranges() {
    let batches = GeometryBatcher::new(BatchConfig {
        track_groups: false,
        max_vertices_per_batch: 1 << 16,
    })
    .batch_elements(&walls())
    .unwrap();
    let first = &batches[0];

    // Element batches always record source ranges
    assert_eq!(first.groups().len(), 2);
    for triangle in 0..first.triangle_count() {
        let [a, _, _] = first.mesh().triangle(triangle).unwrap();
        assert_eq!(first.mesh().element_tag(a), first.element_for_triangle(triangle));
    }
}

#[test]
fn mixed_tagging_keeps_attribute_union() {
    let tagged = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])
        .with_element_tag(ElementId(7))
        .unwrap();
    let untagged = cuboid([0.0, 0.0, 5.0], [1.0, 1.0, 6.0]);
    let batch = merge_meshes(&[untagged, tagged], true).unwrap();

    let tags = batch.mesh().channel(Channel::ElementTag).unwrap();
    assert_eq!(tags.item_count(), batch.mesh().vertex_count());
    assert!(matches!(tags.data(), AttributeData::U32(_)));
    assert_eq!(batch.mesh().element_tag(0), None);
    assert_eq!(batch.mesh().element_tag(8), Some(ElementId(7)));

    // The untagged box is nearer; the tagged one behind it is picked
    let ray = PickRay::new(Point3::new(0.5, 0.3, 10.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
    let pick = PickResolver::default().resolve(&ray, &[batch], None).unwrap().unwrap();
    assert_eq!(pick.element_id, ElementId(7));
    assert_relative_eq!(pick.distance, 9.0, epsilon = 1e-9);
}
