// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Pick Geometry
//!
//! Attribute-preserving mesh batching and ray picking for IFC element meshes,
//! using nalgebra for the ray math.
//!
//! ```rust,ignore
//! let batches = GeometryBatcher::default().batch_elements(&element_meshes)?;
//! let ndc = viewport.to_ndc(event_x, event_y).unwrap();
//! let ray = PickRay::from_camera(&camera, ndc).unwrap();
//! let pick = PickResolver::default().resolve(&ray, &batches, Some(model))?;
//! ```

pub mod batch;
pub mod bounds;
pub mod error;
pub mod mesh;
pub mod pick;
pub mod ray;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector3};

pub use batch::{merge_meshes, BatchConfig, BatchedMesh, ElementMesh, GeometryBatcher, SourceRange};
pub use bounds::{Aabb, BoundingSphere};
pub use error::{Error, Result};
pub use mesh::{AttributeChannel, AttributeData, Channel, ChannelShape, ComponentType, Mesh};
pub use pick::{Confidence, Hit, PickConfig, PickResolver, PickResult, SourceRef};
pub use ray::{Camera, PickRay, Viewport};
