// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures
//!
//! A [`Mesh`] stores its per-vertex data in a fixed table of channels
//! ([`Channel`]), each slot either absent or holding an [`AttributeChannel`].
//! Position is the only channel every renderable mesh must carry.

use crate::bounds::Aabb;
use crate::error::{Error, Result};
use ifc_pick_core::ElementId;
use nalgebra::Point3;
use std::fmt;

/// Named vertex attribute channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Position,
    Normal,
    Uv,
    /// Per-vertex express ID of the originating element
    ElementTag,
}

impl Channel {
    pub const COUNT: usize = 4;

    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::Position,
        Channel::Normal,
        Channel::Uv,
        Channel::ElementTag,
    ];

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Position => "position",
            Channel::Normal => "normal",
            Channel::Uv => "uv",
            Channel::ElementTag => "elementTag",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric element width of a channel's backing buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    F32,
    U32,
    U16,
}

/// Backing buffer of an attribute channel.
///
/// Vertices that carry no data for a channel hold a sentinel: NaN for float
/// buffers, `MAX` for integer buffers.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    F32(Vec<f32>),
    U32(Vec<u32>),
    U16(Vec<u16>),
}

impl AttributeData {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            AttributeData::F32(v) => v.len(),
            AttributeData::U32(v) => v.len(),
            AttributeData::U16(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn component_type(&self) -> ComponentType {
        match self {
            AttributeData::F32(_) => ComponentType::F32,
            AttributeData::U32(_) => ComponentType::U32,
            AttributeData::U16(_) => ComponentType::U16,
        }
    }

    /// Component at a flat buffer index, or `None` for sentinels and out of
    /// range reads
    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            AttributeData::F32(v) => v.get(index).filter(|x| !x.is_nan()).map(|&x| f64::from(x)),
            AttributeData::U32(v) => v.get(index).filter(|&&x| x != u32::MAX).map(|&x| f64::from(x)),
            AttributeData::U16(v) => v.get(index).filter(|&&x| x != u16::MAX).map(|&x| f64::from(x)),
        }
    }

    pub(crate) fn with_capacity(component_type: ComponentType, capacity: usize) -> Self {
        match component_type {
            ComponentType::F32 => AttributeData::F32(Vec::with_capacity(capacity)),
            ComponentType::U32 => AttributeData::U32(Vec::with_capacity(capacity)),
            ComponentType::U16 => AttributeData::U16(Vec::with_capacity(capacity)),
        }
    }

    /// Append another buffer of the same component type.
    ///
    /// Returns `false` (and appends nothing) when the component types differ.
    pub(crate) fn extend_from(&mut self, other: &AttributeData) -> bool {
        match (self, other) {
            (AttributeData::F32(dst), AttributeData::F32(src)) => dst.extend_from_slice(src),
            (AttributeData::U32(dst), AttributeData::U32(src)) => dst.extend_from_slice(src),
            (AttributeData::U16(dst), AttributeData::U16(src)) => dst.extend_from_slice(src),
            _ => return false,
        }
        true
    }

    pub(crate) fn extend_sentinel(&mut self, count: usize) {
        match self {
            AttributeData::F32(v) => v.resize(v.len() + count, f32::NAN),
            AttributeData::U32(v) => v.resize(v.len() + count, u32::MAX),
            AttributeData::U16(v) => v.resize(v.len() + count, u16::MAX),
        }
    }
}

/// Item size and component type of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelShape {
    pub item_size: usize,
    pub component_type: ComponentType,
}

/// One vertex attribute: a flat buffer read in items of `item_size` components
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChannel {
    item_size: usize,
    data: AttributeData,
}

impl AttributeChannel {
    pub(crate) fn empty(shape: ChannelShape, item_capacity: usize) -> Self {
        Self {
            item_size: shape.item_size,
            data: AttributeData::with_capacity(shape.component_type, item_capacity * shape.item_size),
        }
    }

    #[inline]
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    #[inline]
    pub fn item_count(&self) -> usize {
        self.data.len() / self.item_size
    }

    #[inline]
    pub fn data(&self) -> &AttributeData {
        &self.data
    }

    #[inline]
    pub fn shape(&self) -> ChannelShape {
        ChannelShape {
            item_size: self.item_size,
            component_type: self.data.component_type(),
        }
    }

    /// First component of an item
    #[inline]
    pub fn scalar(&self, item: usize) -> Option<f64> {
        self.data.get(item * self.item_size)
    }

    pub(crate) fn extend_from(&mut self, other: &AttributeChannel) -> bool {
        self.item_size == other.item_size && self.data.extend_from(&other.data)
    }

    pub(crate) fn extend_sentinel(&mut self, items: usize) {
        self.data.extend_sentinel(items * self.item_size);
    }
}

/// Triangle mesh
///
/// Invariants, checked by every builder method:
/// - all present channels hold the same number of items (the vertex count)
/// - the position channel, when present, is 3 x f32
/// - the index buffer length is a multiple of 3 and every index is in range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    channels: [Option<AttributeChannel>; Channel::COUNT],
    indices: Option<Vec<u32>>,
}

impl Mesh {
    /// Create a new empty mesh with no channels
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a non-indexed mesh from flat `[x, y, z, ...]` positions
    pub fn from_positions(positions: Vec<f32>) -> Result<Self> {
        Self::new().with_channel(Channel::Position, 3, AttributeData::F32(positions))
    }

    pub(crate) fn from_parts(
        channels: [Option<AttributeChannel>; Channel::COUNT],
        indices: Option<Vec<u32>>,
    ) -> Self {
        Self { channels, indices }
    }

    /// Set (or replace) a channel
    pub fn with_channel(mut self, channel: Channel, item_size: usize, data: AttributeData) -> Result<Self> {
        if item_size == 0 || data.len() % item_size != 0 {
            return Err(Error::AttributeShapeMismatch(channel));
        }
        if channel == Channel::Position
            && (item_size != 3 || data.component_type() != ComponentType::F32)
        {
            return Err(Error::AttributeShapeMismatch(channel));
        }

        let attribute = AttributeChannel { item_size, data };
        let actual = attribute.item_count();
        let expected = self
            .channels
            .iter()
            .enumerate()
            .filter(|(slot, _)| *slot != channel.slot())
            .find_map(|(_, existing)| existing.as_ref().map(AttributeChannel::item_count));

        match expected {
            Some(expected) if expected != actual => {
                return Err(Error::ChannelLengthMismatch {
                    channel,
                    expected,
                    actual,
                });
            }
            Some(_) => {}
            None => {
                if let Some(indices) = &self.indices {
                    check_indices(indices, actual)?;
                }
            }
        }

        self.channels[channel.slot()] = Some(attribute);
        Ok(self)
    }

    pub fn with_normals(self, normals: Vec<f32>) -> Result<Self> {
        self.with_channel(Channel::Normal, 3, AttributeData::F32(normals))
    }

    pub fn with_uvs(self, uvs: Vec<f32>) -> Result<Self> {
        self.with_channel(Channel::Uv, 2, AttributeData::F32(uvs))
    }

    /// Set explicit per-vertex element tags
    pub fn with_element_tags(self, tags: AttributeData) -> Result<Self> {
        self.with_channel(Channel::ElementTag, 1, tags)
    }

    /// Tag every vertex with the same element ID
    pub fn with_element_tag(self, id: ElementId) -> Result<Self> {
        let count = self.vertex_count();
        self.with_element_tags(AttributeData::U32(vec![id.get(); count]))
    }

    /// Rewrite the tag channel as one `u32` per vertex.
    ///
    /// Tags round to the nearest integer; sentinels and values outside `u32`
    /// become the `u32` sentinel. A mesh without tags is returned unchanged.
    pub fn with_widened_element_tags(self) -> Result<Self> {
        if !self.has_channel(Channel::ElementTag) {
            return Ok(self);
        }
        let tags: Vec<u32> = (0..self.vertex_count() as u32)
            .map(|vertex| self.element_tag(vertex).map_or(u32::MAX, ElementId::get))
            .collect();
        self.with_element_tags(AttributeData::U32(tags))
    }

    /// Set the triangle index buffer
    pub fn with_indices(mut self, indices: Vec<u32>) -> Result<Self> {
        check_indices(&indices, self.vertex_count())?;
        self.indices = Some(indices);
        Ok(self)
    }

    /// Get a channel, if present
    #[inline]
    pub fn channel(&self, channel: Channel) -> Option<&AttributeChannel> {
        self.channels[channel.slot()].as_ref()
    }

    #[inline]
    pub fn has_channel(&self, channel: Channel) -> bool {
        self.channels[channel.slot()].is_some()
    }

    /// Flat `[x, y, z, ...]` positions
    #[inline]
    pub fn positions(&self) -> Option<&[f32]> {
        match self.channel(Channel::Position).map(AttributeChannel::data) {
            Some(AttributeData::F32(positions)) => Some(positions),
            _ => None,
        }
    }

    #[inline]
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.channel(Channel::Position)
            .or_else(|| self.channels.iter().flatten().next())
            .map_or(0, AttributeChannel::item_count)
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.vertex_count() / 3,
        }
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }

    /// Vertex indices of a triangle
    #[inline]
    pub fn triangle(&self, triangle: usize) -> Option<[u32; 3]> {
        let start = triangle.checked_mul(3)?;
        match &self.indices {
            Some(indices) => indices
                .get(start..start + 3)
                .map(|t| [t[0], t[1], t[2]]),
            None if start + 3 <= self.vertex_count() => {
                let base = start as u32;
                Some([base, base + 1, base + 2])
            }
            None => None,
        }
    }

    /// Position of a vertex, widened to f64
    #[inline]
    pub fn position(&self, vertex: u32) -> Option<Point3<f64>> {
        let start = (vertex as usize).checked_mul(3)?;
        let p = self.positions()?.get(start..start + 3)?;
        Some(Point3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2])))
    }

    /// Element ID carried by a vertex's tag channel.
    ///
    /// `None` when the mesh has no tag channel or the vertex holds a sentinel.
    #[inline]
    pub fn element_tag(&self, vertex: u32) -> Option<ElementId> {
        self.channel(Channel::ElementTag)?
            .scalar(vertex as usize)
            .and_then(ElementId::from_tag)
    }

    /// Calculate bounds, `None` for a mesh without positions
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_positions(self.positions()?)
    }
}

fn check_indices(indices: &[u32], vertex_count: usize) -> Result<()> {
    if indices.len() % 3 != 0 {
        return Err(Error::CorruptIndexBuffer(format!(
            "index count {} is not a multiple of 3",
            indices.len()
        )));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(Error::CorruptIndexBuffer(format!(
            "index {} out of range for {} vertices",
            bad, vertex_count
        )));
    }
    Ok(())
}
