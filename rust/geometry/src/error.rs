// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::mesh::Channel;
use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Structural errors raised while building, merging or picking meshes.
///
/// All of these abort the single operation that raised them. A pick that
/// simply misses is not an error; see [`crate::PickResolver::resolve`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Cannot merge an empty list of meshes")]
    EmptyInput,

    #[error("Mesh {0} has no position channel")]
    MissingPosition(usize),

    #[error("Attribute '{0}' has a different item size or component type across meshes")]
    AttributeShapeMismatch(Channel),

    #[error("Attribute '{channel}' has {actual} items, expected {expected}")]
    ChannelLengthMismatch {
        channel: Channel,
        expected: usize,
        actual: usize,
    },

    #[error("Corrupt index buffer: {0}")]
    CorruptIndexBuffer(String),

    #[error("Batch of {vertices} vertices exceeds the 32-bit index range")]
    BatchTooLarge { vertices: usize },
}
