// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ray picking against batched meshes
//!
//! [`PickResolver::resolve`] runs a fixed sequence of stages:
//!
//! 1. intersect the ray with every candidate batch
//! 2. drop hits outside the requested model
//! 3. vote over the element tags of the nearest tagged triangle
//! 4. otherwise recover the element from the batch's source ranges
//!
//! A miss, or a hit that cannot be attributed to an element, resolves to
//! `Ok(None)`. Only structural corruption is an error.

use crate::batch::BatchedMesh;
use crate::error::{Error, Result};
use crate::ray::PickRay;
use ifc_pick_core::{ElementId, ModelId};
use nalgebra::Point3;
use smallvec::SmallVec;

/// How the element of a pick was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// All three vertices of the hit triangle carry the same tag
    Exact,
    /// Majority vote over disagreeing tags, or recovered from source ranges
    Fallback,
}

/// Where in the candidate list a pick landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRef {
    pub batch_index: usize,
    /// Source mesh within the batch, when groups were tracked
    pub source_index: Option<usize>,
}

/// Resolved pick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    pub element_id: ElementId,
    pub confidence: Confidence,
    pub triangle_index: usize,
    pub source: SourceRef,
    pub distance: f64,
    pub point: Point3<f64>,
}

/// A single ray-triangle intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub batch_index: usize,
    pub triangle_index: usize,
    pub distance: f64,
}

/// Picking tolerances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickConfig {
    /// Determinant and distance tolerance of the triangle test
    pub epsilon: f64,
    /// Hits further along the ray are ignored
    pub max_distance: f64,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            max_distance: f64::INFINITY,
        }
    }
}

#[derive(Debug)]
enum Stage {
    Intersect,
    FilterModel(Vec<Hit>),
    Primary(Vec<Hit>),
    Fallback(Vec<Hit>),
    Done(Option<PickResult>),
}

/// Resolves a pick ray to an element
#[derive(Debug, Clone, Default)]
pub struct PickResolver {
    config: PickConfig,
}

impl PickResolver {
    pub fn new(config: PickConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PickConfig {
        &self.config
    }

    /// Resolve the element under a ray.
    ///
    /// With `model_filter` set, only batches stamped with that model count.
    pub fn resolve(
        &self,
        ray: &PickRay,
        candidates: &[BatchedMesh],
        model_filter: Option<ModelId>,
    ) -> Result<Option<PickResult>> {
        let mut stage = Stage::Intersect;
        loop {
            stage = match stage {
                Stage::Intersect => {
                    let hits = self.intersect(ray, candidates)?;
                    if hits.is_empty() {
                        tracing::trace!(candidates = candidates.len(), "Pick ray missed");
                        Stage::Done(None)
                    } else {
                        Stage::FilterModel(hits)
                    }
                }
                Stage::FilterModel(hits) => {
                    let hits = filter_model(hits, candidates, model_filter);
                    if hits.is_empty() {
                        tracing::trace!(?model_filter, "No hits in the active model");
                        Stage::Done(None)
                    } else {
                        Stage::Primary(hits)
                    }
                }
                Stage::Primary(hits) => match resolve_tagged(ray, &hits, candidates) {
                    Some(result) => Stage::Done(Some(result)),
                    None => Stage::Fallback(hits),
                },
                Stage::Fallback(hits) => {
                    let result = resolve_from_sources(ray, &hits, candidates);
                    if result.is_none() {
                        tracing::debug!(
                            batch = hits[0].batch_index,
                            triangle = hits[0].triangle_index,
                            "Hit carries no element identity"
                        );
                    }
                    Stage::Done(result)
                }
                Stage::Done(result) => return Ok(result),
            };
        }
    }

    /// Every hit of the ray, nearest first.
    ///
    /// Batches are pruned by bounding sphere and box before their triangles
    /// are tested. Equal distances keep candidate order, then triangle order.
    pub fn intersect(&self, ray: &PickRay, candidates: &[BatchedMesh]) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();

        for (batch_index, batch) in candidates.iter().enumerate() {
            if let Some(sphere) = batch.bounding_sphere() {
                if !sphere.intersects_ray(ray) {
                    continue;
                }
            }
            match batch.bounding_box().map(|aabb| aabb.intersect_ray(ray)) {
                Some(Some(entry)) if entry > self.config.max_distance => continue,
                Some(None) => continue,
                _ => {}
            }

            let mesh = batch.mesh();
            for triangle_index in 0..mesh.triangle_count() {
                let [i0, i1, i2] = mesh.triangle(triangle_index).ok_or_else(|| {
                    Error::CorruptIndexBuffer(format!(
                        "triangle {} missing in batch {}",
                        triangle_index, batch_index
                    ))
                })?;
                let vertex = |i: u32| {
                    mesh.position(i).ok_or_else(|| {
                        Error::CorruptIndexBuffer(format!(
                            "index {} out of range in batch {}",
                            i, batch_index
                        ))
                    })
                };
                let (v0, v1, v2) = (vertex(i0)?, vertex(i1)?, vertex(i2)?);

                if let Some(distance) = ray_triangle_distance(ray, &v0, &v1, &v2, self.config.epsilon) {
                    if distance <= self.config.max_distance {
                        hits.push(Hit {
                            batch_index,
                            triangle_index,
                            distance,
                        });
                    }
                }
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }
}

/// Keep hits whose batch belongs to `model`; all hits when no filter is set
pub fn filter_model(hits: Vec<Hit>, candidates: &[BatchedMesh], model: Option<ModelId>) -> Vec<Hit> {
    let Some(model) = model else {
        return hits;
    };
    hits.into_iter()
        .filter(|hit| {
            candidates
                .get(hit.batch_index)
                .is_some_and(|batch| batch.model() == Some(model))
        })
        .collect()
}

/// Element of the nearest hit with at least one tagged vertex.
///
/// Vertices holding a sentinel are left out of the vote, so a partly tagged
/// surface still resolves to its own element instead of one behind it.
pub fn resolve_tagged(ray: &PickRay, hits: &[Hit], candidates: &[BatchedMesh]) -> Option<PickResult> {
    hits.iter().find_map(|hit| {
        let batch = candidates.get(hit.batch_index)?;
        let mesh = batch.mesh();
        let tags: SmallVec<[ElementId; 3]> = mesh
            .triangle(hit.triangle_index)?
            .into_iter()
            .filter_map(|vertex| mesh.element_tag(vertex))
            .collect();
        let (element_id, confidence) = vote(&tags)?;
        Some(result_for(ray, hit, batch, element_id, confidence))
    })
}

/// Element recovered from the source range of the nearest hit
pub fn resolve_from_sources(ray: &PickRay, hits: &[Hit], candidates: &[BatchedMesh]) -> Option<PickResult> {
    let hit = hits.first()?;
    let batch = candidates.get(hit.batch_index)?;
    let element_id = batch.element_for_triangle(hit.triangle_index)?;
    Some(result_for(ray, hit, batch, element_id, Confidence::Fallback))
}

/// Majority vote over the valid tags of one triangle.
///
/// Three equal tags are `Exact`; anything else, including a triangle with
/// untagged vertices, is `Fallback`. Ties go to the earliest tag. `None` when
/// no vertex is tagged.
pub fn vote(tags: &[ElementId]) -> Option<(ElementId, Confidence)> {
    let first = *tags.first()?;
    if tags.len() == 3 && tags.iter().all(|&tag| tag == first) {
        return Some((first, Confidence::Exact));
    }

    let mut counts: SmallVec<[(ElementId, usize); 3]> = SmallVec::new();
    for &tag in tags {
        match counts.iter_mut().find(|(id, _)| *id == tag) {
            Some((_, count)) => *count += 1,
            None => counts.push((tag, 1)),
        }
    }

    // max_by_key keeps the last maximum; scan in reverse so the earliest wins
    let winner = counts
        .iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map_or(first, |(id, _)| *id);
    Some((winner, Confidence::Fallback))
}

fn result_for(
    ray: &PickRay,
    hit: &Hit,
    batch: &BatchedMesh,
    element_id: ElementId,
    confidence: Confidence,
) -> PickResult {
    PickResult {
        element_id,
        confidence,
        triangle_index: hit.triangle_index,
        source: SourceRef {
            batch_index: hit.batch_index,
            source_index: batch
                .source_for_triangle(hit.triangle_index)
                .map(|range| range.source_index),
        },
        distance: hit.distance,
        point: ray.at(hit.distance),
    }
}

/// Möller–Trumbore ray-triangle intersection.
///
/// Returns the distance along the ray to the hit, if the triangle is hit in
/// front of the ray origin. Both faces count.
pub fn ray_triangle_distance(
    ray: &PickRay,
    v0: &Point3<f64>,
    v1: &Point3<f64>,
    v2: &Point3<f64>,
    epsilon: f64,
) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(&edge2);
    let a = edge1.dot(&h);

    if a.abs() < epsilon {
        return None; // ray parallel to triangle
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray.direction.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > epsilon).then_some(t)
}
