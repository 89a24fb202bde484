// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Picking configuration loaded from environment variables.

use crate::highlight::HighlightStyle;
use ifc_pick_geometry::{BatchConfig, PickConfig};

/// Selection configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Batching of element meshes on model load.
    pub batch: BatchConfig,
    /// Ray picking tolerances.
    pub pick: PickConfig,
    /// Highlight color and opacity.
    pub highlight: HighlightStyle,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup (environment, settings map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let batch = BatchConfig::default();
        let pick = PickConfig::default();

        Self {
            batch: BatchConfig {
                track_groups: lookup("IFC_PICK_TRACK_GROUPS")
                    .and_then(|v| parse_bool(&v))
                    .unwrap_or(batch.track_groups),
                max_vertices_per_batch: lookup("IFC_PICK_MAX_BATCH_VERTICES")
                    .and_then(|v| v.trim().parse().ok())
                    .filter(|&n: &usize| n > 0)
                    .unwrap_or(batch.max_vertices_per_batch),
            },
            pick: PickConfig {
                epsilon: lookup("IFC_PICK_EPSILON")
                    .and_then(|v| v.trim().parse().ok())
                    .filter(|&e: &f64| e.is_finite() && e > 0.0)
                    .unwrap_or(pick.epsilon),
                max_distance: lookup("IFC_PICK_MAX_DISTANCE")
                    .and_then(|v| v.trim().parse().ok())
                    .filter(|&d: &f64| d > 0.0)
                    .unwrap_or(pick.max_distance),
            },
            highlight: HighlightStyle {
                color: lookup("IFC_PICK_HIGHLIGHT_COLOR")
                    .and_then(|v| parse_hex_color(&v))
                    .unwrap_or(HighlightStyle::DEFAULT_COLOR),
                opacity: lookup("IFC_PICK_HIGHLIGHT_OPACITY")
                    .and_then(|v| v.trim().parse().ok())
                    .filter(|o: &f32| (0.0..=1.0).contains(o))
                    .unwrap_or(HighlightStyle::DEFAULT_OPACITY),
            },
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `rrggbb`, optionally prefixed with `#` or `0x`
fn parse_hex_color(value: &str) -> Option<u32> {
    let value = value.trim();
    let digits = value
        .strip_prefix('#')
        .or_else(|| value.strip_prefix("0x"))
        .unwrap_or(value);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}
