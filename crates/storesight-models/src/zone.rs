//! Store zone layout and zone location.
//!
//! A layout is an ordered list of labelled rectangles in frame pixel
//! coordinates. Location is a first-match scan in declaration order, so
//! earlier zones win where rectangles overlap. Bounds are inclusive on all
//! four edges: a person standing exactly on a zone border is inside it.

use std::fmt;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Labels for the five monitored store zones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum ZoneLabel {
    A,
    B,
    C,
    D,
    E,
}

impl ZoneLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneLabel::A => "A",
            ZoneLabel::B => "B",
            ZoneLabel::C => "C",
            ZoneLabel::D => "D",
            ZoneLabel::E => "E",
        }
    }

    /// All labels in snapshot order.
    pub fn all() -> [ZoneLabel; 5] {
        [
            ZoneLabel::A,
            ZoneLabel::B,
            ZoneLabel::C,
            ZoneLabel::D,
            ZoneLabel::E,
        ]
    }
}

impl fmt::Display for ZoneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled zone rectangle with inclusive pixel bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Zone {
    pub label: ZoneLabel,
    /// Left edge x-coordinate
    pub x1: f64,
    /// Top edge y-coordinate
    pub y1: f64,
    /// Right edge x-coordinate (inclusive)
    pub x2: f64,
    /// Bottom edge y-coordinate (inclusive)
    pub y2: f64,
}

impl Zone {
    pub fn new(label: ZoneLabel, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { label, x1, y1, x2, y2 }
    }

    /// Inclusive containment test.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x1 && px <= self.x2 && py >= self.y1 && py <= self.y2
    }
}

/// Error raised when loading a zone layout from disk.
#[derive(Debug, thiserror::Error)]
pub enum ZoneLayoutError {
    #[error("failed to read zone layout file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse zone layout: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("zone layout is empty")]
    Empty,

    #[error("duplicate zone label {0}")]
    DuplicateLabel(ZoneLabel),
}

/// An ordered set of zones covering (part of) the camera frame.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ZoneLayout {
    zones: Vec<Zone>,
}

impl ZoneLayout {
    /// Build a layout from an ordered zone list. Order is priority order.
    pub fn new(zones: Vec<Zone>) -> Result<Self, ZoneLayoutError> {
        if zones.is_empty() {
            return Err(ZoneLayoutError::Empty);
        }
        for (i, zone) in zones.iter().enumerate() {
            if zones[..i].iter().any(|z| z.label == zone.label) {
                return Err(ZoneLayoutError::DuplicateLabel(zone.label));
            }
        }
        Ok(Self { zones })
    }

    /// The default storefront layout for a 1280x960 camera frame.
    ///
    /// Five disjoint aisle columns; the 601..879 span between D and E is
    /// unzoned walkway. Declaration order is the location scan order.
    pub fn storefront() -> Self {
        Self {
            zones: vec![
                Zone::new(ZoneLabel::A, 0.0, 0.0, 200.0, 959.0),
                Zone::new(ZoneLabel::B, 1079.0, 0.0, 1279.0, 959.0),
                Zone::new(ZoneLabel::C, 201.0, 0.0, 400.0, 959.0),
                Zone::new(ZoneLabel::D, 401.0, 0.0, 600.0, 959.0),
                Zone::new(ZoneLabel::E, 879.0, 0.0, 1078.0, 959.0),
            ],
        }
    }

    /// Load a layout override from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ZoneLayoutError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ZoneLayoutError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let zones: Vec<Zone> = serde_json::from_str(&raw)?;
        Self::new(zones)
    }

    /// Locate a point: first zone in priority order whose inclusive bounds
    /// contain it, or `None` when the point is outside every zone.
    pub fn locate(&self, px: f64, py: f64) -> Option<ZoneLabel> {
        self.zones
            .iter()
            .find(|z| z.contains(px, py))
            .map(|z| z.label)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_corner() {
        let layout = ZoneLayout::storefront();
        // Exact corner of zone A
        assert_eq!(layout.locate(200.0, 959.0), Some(ZoneLabel::A));
        assert_eq!(layout.locate(0.0, 0.0), Some(ZoneLabel::A));
    }

    #[test]
    fn test_inclusive_edge() {
        let layout = ZoneLayout::storefront();
        // Left edge of zone C
        assert_eq!(layout.locate(201.0, 480.0), Some(ZoneLabel::C));
        // Right edge of zone E
        assert_eq!(layout.locate(1078.0, 0.0), Some(ZoneLabel::E));
    }

    #[test]
    fn test_outside_all_zones() {
        let layout = ZoneLayout::storefront();
        // Gap between D (ends 600) and E (starts 879)
        assert_eq!(layout.locate(700.0, 480.0), None);
        assert_eq!(layout.locate(200.5, 480.0), None);
    }

    #[test]
    fn test_adjacent_columns_share_no_point() {
        let layout = ZoneLayout::storefront();
        // E ends at 1078 and B starts at 1079; the columns touch but no
        // point belongs to both.
        assert_eq!(layout.locate(1078.0, 100.0), Some(ZoneLabel::E));
        assert_eq!(layout.locate(1079.0, 100.0), Some(ZoneLabel::B));
        assert_eq!(layout.locate(1078.5, 100.0), None);
    }

    #[test]
    fn test_custom_overlap_first_match() {
        let layout = ZoneLayout::new(vec![
            Zone::new(ZoneLabel::A, 0.0, 0.0, 100.0, 100.0),
            Zone::new(ZoneLabel::B, 50.0, 0.0, 150.0, 100.0),
        ])
        .unwrap();
        assert_eq!(layout.locate(75.0, 50.0), Some(ZoneLabel::A));
        assert_eq!(layout.locate(120.0, 50.0), Some(ZoneLabel::B));
    }

    #[test]
    fn test_empty_layout_rejected() {
        assert!(matches!(
            ZoneLayout::new(vec![]),
            Err(ZoneLayoutError::Empty)
        ));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let result = ZoneLayout::new(vec![
            Zone::new(ZoneLabel::A, 0.0, 0.0, 10.0, 10.0),
            Zone::new(ZoneLabel::A, 20.0, 0.0, 30.0, 10.0),
        ]);
        assert!(matches!(
            result,
            Err(ZoneLayoutError::DuplicateLabel(ZoneLabel::A))
        ));
    }

    #[test]
    fn test_layout_json_round_trip() {
        let layout = ZoneLayout::storefront();
        let json = serde_json::to_string(&layout).unwrap();
        let back: ZoneLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(back.zones(), layout.zones());
    }
}
