// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element kinds
//!
//! The parser stamps every element record with an explicit kind, so callers
//! never have to guess what an element is from the shape of its properties.

use std::fmt;

/// Kind of building element, as reported by the model parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    Wall,
    Slab,
    Beam,
    Column,
    Roof,
    Stair,
    Railing,
    CurtainWall,
    Plate,
    Member,
    Covering,
    Door,
    Window,
    Space,
    Furnishing,
    /// Any other entity type, keyed by its upper-case type name
    Other(String),
    #[default]
    Unknown,
}

impl ElementKind {
    /// Parse an element kind from a schema type name.
    ///
    /// Accepts both the STEP spelling (`IFCWALL`) and the schema spelling
    /// (`IfcWall`). Standard-case and element-type variants collapse onto
    /// their base kind.
    pub fn from_type_name(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        if upper.is_empty() {
            return Self::Unknown;
        }

        match upper.as_str() {
            "IFCWALL" | "IFCWALLSTANDARDCASE" | "IFCWALLELEMENTEDCASE" => Self::Wall,
            "IFCSLAB" | "IFCSLABSTANDARDCASE" | "IFCSLABELEMENTEDCASE" => Self::Slab,
            "IFCBEAM" | "IFCBEAMSTANDARDCASE" => Self::Beam,
            "IFCCOLUMN" | "IFCCOLUMNSTANDARDCASE" => Self::Column,
            "IFCROOF" => Self::Roof,
            "IFCSTAIR" | "IFCSTAIRFLIGHT" => Self::Stair,
            "IFCRAILING" => Self::Railing,
            "IFCCURTAINWALL" => Self::CurtainWall,
            "IFCPLATE" | "IFCPLATESTANDARDCASE" => Self::Plate,
            "IFCMEMBER" | "IFCMEMBERSTANDARDCASE" => Self::Member,
            "IFCCOVERING" => Self::Covering,
            "IFCDOOR" | "IFCDOORSTANDARDCASE" => Self::Door,
            "IFCWINDOW" | "IFCWINDOWSTANDARDCASE" => Self::Window,
            "IFCSPACE" => Self::Space,
            "IFCFURNISHINGELEMENT" | "IFCFURNITURE" => Self::Furnishing,
            _ => Self::Other(upper),
        }
    }

    /// Schema type name of the kind (STEP spelling)
    pub fn as_str(&self) -> &str {
        match self {
            Self::Wall => "IFCWALL",
            Self::Slab => "IFCSLAB",
            Self::Beam => "IFCBEAM",
            Self::Column => "IFCCOLUMN",
            Self::Roof => "IFCROOF",
            Self::Stair => "IFCSTAIR",
            Self::Railing => "IFCRAILING",
            Self::CurtainWall => "IFCCURTAINWALL",
            Self::Plate => "IFCPLATE",
            Self::Member => "IFCMEMBER",
            Self::Covering => "IFCCOVERING",
            Self::Door => "IFCDOOR",
            Self::Window => "IFCWINDOW",
            Self::Space => "IFCSPACE",
            Self::Furnishing => "IFCFURNISHINGELEMENT",
            Self::Other(name) => name,
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Check if this kind is a physical building element
    pub fn is_building_element(&self) -> bool {
        !matches!(self, Self::Space | Self::Other(_) | Self::Unknown)
    }

    /// Check if this kind fills an opening (doors and windows)
    pub fn is_filling(&self) -> bool {
        matches!(self, Self::Door | Self::Window)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_type_name() {
        assert_eq!(ElementKind::from_type_name("IFCWALL"), ElementKind::Wall);
        assert_eq!(ElementKind::from_type_name("IfcWallStandardCase"), ElementKind::Wall);
        assert_eq!(ElementKind::from_type_name("IfcDoor"), ElementKind::Door);
        assert_eq!(ElementKind::from_type_name("  "), ElementKind::Unknown);
    }

    #[test]
    fn test_unknown_type_kept_by_name() {
        let kind = ElementKind::from_type_name("IfcFlowTerminal");
        assert_eq!(kind, ElementKind::Other("IFCFLOWTERMINAL".to_string()));
        assert_eq!(kind.as_str(), "IFCFLOWTERMINAL");
        assert!(!kind.is_building_element());
    }

    #[test]
    fn test_classification() {
        assert!(ElementKind::Beam.is_building_element());
        assert!(!ElementKind::Space.is_building_element());
        assert!(ElementKind::Window.is_filling());
        assert!(!ElementKind::Wall.is_filling());
    }
}
