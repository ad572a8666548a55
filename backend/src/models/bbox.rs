//! Geographic bounding boxes.
//!
//! A [`BoundingBox`] is an axis-aligned box in WGS84 degrees. Boxes are built
//! from two arbitrary map points and normalized so that `west <= east` and
//! `south <= north`; range and size checks happen later in
//! [`crate::services::validation`].

use std::fmt;
use std::str::FromStr;

use geojson::{Feature, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};

/// Default number of decimals used when displaying coordinates.
pub const DEFAULT_DECIMALS: usize = 6;

/// A point on the map, longitude/latitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<(f64, f64)> for LonLat {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self { lon, lat }
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Create a box from explicit edges. No normalization is applied, so a box
    /// typed in by hand can still be rejected by the validator.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Build the canonical box spanned by two arbitrary points.
    ///
    /// The result does not depend on argument order. Two equal points give a
    /// zero-area box.
    pub fn from_points(p1: impl Into<LonLat>, p2: impl Into<LonLat>) -> Self {
        let (p1, p2) = (p1.into(), p2.into());
        Self {
            west: p1.lon.min(p2.lon),
            south: p1.lat.min(p2.lat),
            east: p1.lon.max(p2.lon),
            north: p1.lat.max(p2.lat),
        }
    }

    /// Build a box from the `[west, south, east, north]` wire layout.
    pub fn from_coords(coords: [f64; 4]) -> Self {
        let [west, south, east, north] = coords;
        Self::new(west, south, east, north)
    }

    /// The `[west, south, east, north]` wire layout.
    pub fn to_coords(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    pub fn width_deg(&self) -> f64 {
        (self.east - self.west).abs()
    }

    pub fn height_deg(&self) -> f64 {
        (self.north - self.south).abs()
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    /// Closed exterior ring: (w,s) → (e,s) → (e,n) → (w,n) → (w,s).
    pub fn ring(&self) -> [[f64; 2]; 5] {
        [
            [self.west, self.south],
            [self.east, self.south],
            [self.east, self.north],
            [self.west, self.north],
            [self.west, self.south],
        ]
    }

    /// GeoJSON polygon geometry for this box.
    pub fn to_polygon(&self) -> Geometry {
        let ring = self.ring().iter().map(|p| p.to_vec()).collect();
        Geometry::new(Value::Polygon(vec![ring]))
    }

    /// GeoJSON feature wrapping [`Self::to_polygon`] with empty properties,
    /// ready to be pushed into a map source.
    pub fn to_feature(&self) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(self.to_polygon()),
            id: None,
            properties: Some(JsonObject::new()),
            foreign_members: None,
        }
    }

    /// Render as `[w, s, e, n]` with a fixed number of decimals.
    pub fn format_coordinates(&self, decimals: usize) -> String {
        format!(
            "[{:.*}, {:.*}, {:.*}, {:.*}]",
            decimals, self.west, decimals, self.south, decimals, self.east, decimals, self.north
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_coordinates(DEFAULT_DECIMALS))
    }
}

/// Errors raised when reading a `[w, s, e, n]` string back.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BboxParseError {
    #[error("coordinates must be enclosed in brackets")]
    MissingBrackets,
    #[error("expected 4 coordinates, found {0}")]
    WrongArity(usize),
    #[error("invalid coordinate '{0}'")]
    InvalidNumber(String),
}

/// Parse the bracketed form produced by [`BoundingBox::format_coordinates`].
pub fn parse_coordinates(input: &str) -> Result<BoundingBox, BboxParseError> {
    let inner = input
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or(BboxParseError::MissingBrackets)?;

    let values = inner
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<f64>()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match values.as_slice() {
        [west, south, east, north] => Ok(BoundingBox::new(*west, *south, *east, *north)),
        other => Err(BboxParseError::WrongArity(other.len())),
    }
}

impl FromStr for BoundingBox {
    type Err = BboxParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_coordinates(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_points_normalizes_corners() {
        let bbox = BoundingBox::from_points((-122.0, 37.9), (-122.5, 37.7));
        assert_eq!(bbox, BoundingBox::new(-122.5, 37.7, -122.0, 37.9));
    }

    #[test]
    fn test_equal_points_give_zero_area() {
        let bbox = BoundingBox::from_points((10.0, 20.0), (10.0, 20.0));
        assert_eq!(bbox.width_deg(), 0.0);
        assert_eq!(bbox.height_deg(), 0.0);
    }

    #[test]
    fn test_polygon_ring_order() {
        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        let geometry = bbox.to_polygon();
        match geometry.value {
            Value::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(
                    rings[0],
                    vec![
                        vec![1.0, 2.0],
                        vec![3.0, 2.0],
                        vec![3.0, 4.0],
                        vec![1.0, 4.0],
                        vec![1.0, 2.0],
                    ]
                );
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_feature_serializes_as_geojson() {
        let feature = BoundingBox::new(1.0, 2.0, 3.0, 4.0).to_feature();
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["geometry"]["type"], "Polygon");
        assert_eq!(json["properties"], serde_json::json!({}));
    }

    #[test]
    fn test_format_coordinates() {
        let bbox = BoundingBox::new(-122.52, 37.7, -122.15, 37.9);
        assert_eq!(
            bbox.format_coordinates(2),
            "[-122.52, 37.70, -122.15, 37.90]"
        );
        assert_eq!(
            bbox.to_string(),
            "[-122.520000, 37.700000, -122.150000, 37.900000]"
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            parse_coordinates("1, 2, 3, 4"),
            Err(BboxParseError::MissingBrackets)
        );
        assert_eq!(
            parse_coordinates("[1, 2, 3]"),
            Err(BboxParseError::WrongArity(3))
        );
        assert_eq!(
            parse_coordinates("[1, x, 3, 4]"),
            Err(BboxParseError::InvalidNumber("x".to_string()))
        );
    }

    #[test]
    fn test_center() {
        let c = BoundingBox::new(-10.0, -4.0, 10.0, 6.0).center();
        assert_eq!(c, LonLat::new(0.0, 1.0));
    }

    proptest! {
        #[test]
        fn prop_from_points_is_ordered_and_symmetric(
            x1 in -180.0f64..180.0, y1 in -90.0f64..90.0,
            x2 in -180.0f64..180.0, y2 in -90.0f64..90.0,
        ) {
            let a = BoundingBox::from_points((x1, y1), (x2, y2));
            let b = BoundingBox::from_points((x2, y2), (x1, y1));
            prop_assert!(a.west <= a.east);
            prop_assert!(a.south <= a.north);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_format_round_trips_within_precision(
            w in -180.0f64..180.0, s in -90.0f64..90.0,
            e in -180.0f64..180.0, n in -90.0f64..90.0,
            decimals in 0usize..9,
        ) {
            let bbox = BoundingBox::new(w, s, e, n);
            let parsed = parse_coordinates(&bbox.format_coordinates(decimals)).unwrap();
            let tolerance = 0.5 * 10f64.powi(-(decimals as i32)) + 1e-9;
            prop_assert!((parsed.west - w).abs() <= tolerance);
            prop_assert!((parsed.south - s).abs() <= tolerance);
            prop_assert!((parsed.east - e).abs() <= tolerance);
            prop_assert!((parsed.north - n).abs() <= tolerance);
        }
    }
}
