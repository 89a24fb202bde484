// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attribute-preserving geometry batching
//!
//! Many small per-element meshes are merged into a few large meshes for
//! rendering. Every channel present on any input survives the merge, so the
//! element-tag channel still maps each merged triangle back to its element.
//! Optional source ranges record which triangles came from which input.

use crate::bounds::{Aabb, BoundingSphere};
use crate::error::{Error, Result};
use crate::mesh::{AttributeChannel, AttributeData, Channel, ChannelShape, Mesh};
use ifc_pick_core::{ElementId, ModelId};
use rustc_hash::FxHashMap;
use std::ops::Range;

/// Triangles of a batched mesh that came from one input mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub start_triangle: usize,
    pub triangle_count: usize,
    /// Position of the source mesh in the merge input
    pub source_index: usize,
}

impl SourceRange {
    #[inline]
    pub fn end_triangle(&self) -> usize {
        self.start_triangle + self.triangle_count
    }

    #[inline]
    pub fn triangles(&self) -> Range<usize> {
        self.start_triangle..self.end_triangle()
    }

    #[inline]
    pub fn contains(&self, triangle: usize) -> bool {
        self.triangles().contains(&triangle)
    }
}

/// Result of merging meshes. Immutable once built.
#[derive(Debug, Clone)]
pub struct BatchedMesh {
    mesh: Mesh,
    groups: Vec<SourceRange>,
    source_elements: Vec<Option<ElementId>>,
    bounding_box: Option<Aabb>,
    bounding_sphere: Option<BoundingSphere>,
    model: Option<ModelId>,
    material: Option<u32>,
}

impl BatchedMesh {
    /// Merged, always-indexed mesh
    #[inline]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Source ranges in input order (empty unless groups were tracked)
    #[inline]
    pub fn groups(&self) -> &[SourceRange] {
        &self.groups
    }

    #[inline]
    pub fn bounding_box(&self) -> Option<&Aabb> {
        self.bounding_box.as_ref()
    }

    #[inline]
    pub fn bounding_sphere(&self) -> Option<&BoundingSphere> {
        self.bounding_sphere.as_ref()
    }

    /// Model the batch belongs to, if known
    #[inline]
    pub fn model(&self) -> Option<ModelId> {
        self.model
    }

    /// Material group key shared by every source of the batch
    #[inline]
    pub fn material(&self) -> Option<u32> {
        self.material
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Stamp the owning model
    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = Some(model);
        self
    }

    /// Attach the element ID of each source mesh, in input order
    pub fn with_source_elements(mut self, elements: Vec<Option<ElementId>>) -> Self {
        self.source_elements = elements;
        self
    }

    /// Source range containing a triangle
    pub fn source_for_triangle(&self, triangle: usize) -> Option<&SourceRange> {
        let position = self
            .groups
            .partition_point(|range| range.end_triangle() <= triangle);
        self.groups.get(position).filter(|range| range.contains(triangle))
    }

    /// Element recorded for the source a triangle came from
    pub fn element_for_triangle(&self, triangle: usize) -> Option<ElementId> {
        let range = self.source_for_triangle(triangle)?;
        self.source_elements.get(range.source_index).copied().flatten()
    }

    /// Triangle range drawn for one source mesh
    pub fn triangles_of_source(&self, source_index: usize) -> Option<Range<usize>> {
        self.groups
            .get(source_index)
            .filter(|range| range.source_index == source_index)
            .map(SourceRange::triangles)
    }

    /// Triangle ranges of every source recorded for an element
    pub fn element_ranges(&self, element: ElementId) -> Vec<Range<usize>> {
        self.source_elements
            .iter()
            .enumerate()
            .filter(|(_, id)| **id == Some(element))
            .filter_map(|(source_index, _)| self.triangles_of_source(source_index))
            .collect()
    }
}

/// Merge meshes into one batched mesh.
///
/// The output carries the union of all input channels. Inputs lacking an
/// optional channel contribute sentinel entries for it, so every channel keeps
/// one item per merged vertex. Non-indexed inputs get a trivial index buffer.
/// With `track_groups`, one [`SourceRange`] is recorded per input.
pub fn merge_meshes(meshes: &[Mesh], track_groups: bool) -> Result<BatchedMesh> {
    let refs: Vec<&Mesh> = meshes.iter().collect();
    merge_mesh_refs(&refs, track_groups)
}

fn merge_mesh_refs(meshes: &[&Mesh], track_groups: bool) -> Result<BatchedMesh> {
    if meshes.is_empty() {
        return Err(Error::EmptyInput);
    }

    // Union of channels; shapes must agree wherever a channel appears
    let mut shapes: [Option<ChannelShape>; Channel::COUNT] = [None; Channel::COUNT];
    for (index, mesh) in meshes.iter().enumerate() {
        if !mesh.has_channel(Channel::Position) {
            return Err(Error::MissingPosition(index));
        }
        for channel in Channel::ALL {
            let Some(attribute) = mesh.channel(channel) else {
                continue;
            };
            let shape = attribute.shape();
            match shapes[channel.slot()] {
                None => shapes[channel.slot()] = Some(shape),
                Some(existing) if existing != shape => {
                    return Err(Error::AttributeShapeMismatch(channel));
                }
                Some(_) => {}
            }
        }
    }

    let total_vertices: usize = meshes.iter().map(|m| m.vertex_count()).sum();
    if total_vertices > u32::MAX as usize {
        return Err(Error::BatchTooLarge {
            vertices: total_vertices,
        });
    }
    let total_indices: usize = meshes.iter().map(|m| m.triangle_count() * 3).sum();

    let mut channels: [Option<AttributeChannel>; Channel::COUNT] =
        shapes.map(|shape| shape.map(|shape| AttributeChannel::empty(shape, total_vertices)));
    let mut indices: Vec<u32> = Vec::with_capacity(total_indices);
    let mut groups = Vec::with_capacity(if track_groups { meshes.len() } else { 0 });

    let mut vertex_offset: u32 = 0;
    let mut triangle_offset = 0usize;

    for (source_index, mesh) in meshes.iter().enumerate() {
        let vertex_count = mesh.vertex_count();

        for channel in Channel::ALL {
            let Some(merged) = channels[channel.slot()].as_mut() else {
                continue;
            };
            match mesh.channel(channel) {
                Some(attribute) => {
                    if !merged.extend_from(attribute) {
                        return Err(Error::AttributeShapeMismatch(channel));
                    }
                }
                None => merged.extend_sentinel(vertex_count),
            }
        }

        let triangle_count = match mesh.indices() {
            Some(source) => {
                indices.extend(source.iter().map(|&i| i + vertex_offset));
                source.len() / 3
            }
            None => {
                if vertex_count % 3 != 0 {
                    return Err(Error::CorruptIndexBuffer(format!(
                        "mesh {} is not indexed and has {} vertices",
                        source_index, vertex_count
                    )));
                }
                indices.extend(vertex_offset..vertex_offset + vertex_count as u32);
                vertex_count / 3
            }
        };

        if track_groups {
            groups.push(SourceRange {
                start_triangle: triangle_offset,
                triangle_count,
                source_index,
            });
        }

        vertex_offset += vertex_count as u32;
        triangle_offset += triangle_count;
    }

    let mesh = Mesh::from_parts(channels, Some(indices));
    let bounding_box = mesh.bounds();
    let bounding_sphere = match (mesh.positions(), &bounding_box) {
        (Some(positions), Some(aabb)) => Some(BoundingSphere::from_positions(positions, aabb)),
        _ => None,
    };

    Ok(BatchedMesh {
        mesh,
        groups,
        source_elements: Vec::new(),
        bounding_box,
        bounding_sphere,
        model: None,
        material: None,
    })
}

/// Per-element mesh handed over by the model parser
#[derive(Debug, Clone)]
pub struct ElementMesh {
    pub element_id: ElementId,
    pub model: ModelId,
    /// Material or style group; elements sharing it can share a draw call
    pub material: u32,
    pub mesh: Mesh,
}

/// Batching settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Record source ranges when merging plain meshes
    pub track_groups: bool,
    /// Start a new batch once a group would exceed this many vertices
    pub max_vertices_per_batch: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            track_groups: true,
            max_vertices_per_batch: 1 << 20,
        }
    }
}

/// Merges meshes according to a [`BatchConfig`]
#[derive(Debug, Clone, Default)]
pub struct GeometryBatcher {
    config: BatchConfig,
}

impl GeometryBatcher {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Merge meshes into one batch, tracking groups as configured
    pub fn merge(&self, meshes: &[Mesh]) -> Result<BatchedMesh> {
        merge_meshes(meshes, self.config.track_groups)
    }

    /// Batch the element meshes of a model for rendering.
    ///
    /// Elements are grouped by `(model, material)` in first-seen order and each
    /// group is split so that no batch exceeds `max_vertices_per_batch` (a
    /// single oversized element still gets a batch of its own). Elements
    /// without a tag channel are tagged with their ID on a private copy, and
    /// tag channels of any other width are widened to `u32` the same way.
    /// Source ranges and the per-source element table are always recorded.
    /// An empty input yields no batches.
    pub fn batch_elements(&self, elements: &[ElementMesh]) -> Result<Vec<BatchedMesh>> {
        // (model, material, members, vertices) per chunk; open_chunk points at
        // the chunk currently being filled for each group
        let mut chunks: Vec<(ModelId, u32, Vec<usize>, usize)> = Vec::new();
        let mut open_chunk: FxHashMap<(ModelId, u32), usize> = FxHashMap::default();

        for (index, element) in elements.iter().enumerate() {
            if element.mesh.is_empty() {
                continue;
            }
            let key = (element.model, element.material);
            let vertices = element.mesh.vertex_count();

            let reuse = open_chunk.get(&key).copied().filter(|&chunk| {
                let (_, _, _, filled) = &chunks[chunk];
                filled + vertices <= self.config.max_vertices_per_batch
            });

            let chunk = match reuse {
                Some(chunk) => chunk,
                None => {
                    chunks.push((element.model, element.material, Vec::new(), 0));
                    open_chunk.insert(key, chunks.len() - 1);
                    chunks.len() - 1
                }
            };
            let (_, _, members, filled) = &mut chunks[chunk];
            members.push(index);
            *filled += vertices;
        }

        let mut batches = Vec::with_capacity(chunks.len());
        for (model, material, members, _) in chunks {
            let tagged: Vec<Option<Mesh>> = members
                .iter()
                .map(|&i| {
                    let element = &elements[i];
                    match element.mesh.channel(Channel::ElementTag) {
                        None => element.mesh.clone().with_element_tag(element.element_id).map(Some),
                        Some(tags) if is_u32_tag_channel(tags) => Ok(None),
                        // Other widths would clash with the u32 tags written above
                        Some(_) => element.mesh.clone().with_widened_element_tags().map(Some),
                    }
                })
                .collect::<Result<_>>()?;

            let refs: Vec<&Mesh> = members
                .iter()
                .zip(&tagged)
                .map(|(&i, copy)| copy.as_ref().unwrap_or(&elements[i].mesh))
                .collect();

            let mut batch = merge_mesh_refs(&refs, true)?
                .with_model(model)
                .with_source_elements(members.iter().map(|&i| Some(elements[i].element_id)).collect());
            batch.material = Some(material);
            batches.push(batch);
        }

        tracing::debug!(
            elements = elements.len(),
            batches = batches.len(),
            max_vertices = self.config.max_vertices_per_batch,
            "Batched element meshes"
        );

        Ok(batches)
    }
}

fn is_u32_tag_channel(tags: &AttributeChannel) -> bool {
    tags.item_size() == 1 && matches!(tags.data(), AttributeData::U32(_))
}
