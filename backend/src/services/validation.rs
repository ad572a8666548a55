//! Request validation.
//!
//! Checks a candidate analysis request before it is dispatched. All checks run
//! and every violation is collected so the form can show them together.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::bbox::BoundingBox;
use crate::models::request::{DataSource, DATE_FORMAT};

/// Largest accepted width or height, in degrees.
pub const MAX_SPAN_DEG: f64 = 10.0;
/// Smallest accepted width or height, in degrees.
pub const MIN_SPAN_DEG: f64 = 0.001;

/// Collected validation messages. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Messages joined for single-line display.
    pub fn joined(&self) -> String {
        self.errors.join("; ")
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn in_range(bbox: &BoundingBox) -> bool {
    let lon_ok = |v: f64| (-180.0..=180.0).contains(&v);
    let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);
    lon_ok(bbox.west) && lat_ok(bbox.south) && lon_ok(bbox.east) && lat_ok(bbox.north)
}

/// Validate a bounding box, a date range and a data source identifier.
pub fn validate(bbox: &BoundingBox, start: &str, end: &str, data_source: &str) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !in_range(bbox) {
        report.push(
            "Coordinates out of range. Longitude must be between -180 and 180, latitude between -90 and 90.",
        );
    }

    let width = bbox.width_deg();
    let height = bbox.height_deg();

    if width > MAX_SPAN_DEG || height > MAX_SPAN_DEG {
        report.push(format!(
            "Bounding box too large: {:.2}° x {:.2}°. Please select a smaller area (max: 10° x 10°).",
            width, height
        ));
    }

    if width < MIN_SPAN_DEG || height < MIN_SPAN_DEG {
        report.push(format!(
            "Bounding box too small: {:.6}° x {:.6}°. Please select a larger area (min: 0.001° x 0.001°).",
            width, height
        ));
    }

    if data_source.parse::<DataSource>().is_err() {
        report.push(format!(
            "Invalid data source. Must be one of: {}",
            DataSource::valid_names()
        ));
    }

    let start_date = parse_date(start);
    let end_date = parse_date(end);
    if start_date.is_none() {
        report.push(format!("Invalid start date: {}", start));
    }
    if end_date.is_none() {
        report.push(format!("Invalid end date: {}", end));
    }
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            report.push("Start date must be on or before end date");
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "2025-06-01";
    const END: &str = "2025-06-30";

    fn check(bbox: BoundingBox) -> ValidationReport {
        validate(&bbox, START, END, "sentinel2")
    }

    #[test]
    fn test_accepts_one_degree_box() {
        let report = check(BoundingBox::new(-122.0, 37.0, -121.0, 38.0));
        assert!(report.is_valid(), "{}", report);
    }

    #[test]
    fn test_rejects_too_large() {
        let report = check(BoundingBox::new(0.0, 0.0, 15.0, 1.0));
        assert_eq!(
            report.errors(),
            ["Bounding box too large: 15.00° x 1.00°. Please select a smaller area (max: 10° x 10°)."]
        );
    }

    #[test]
    fn test_rejects_too_small() {
        let report = check(BoundingBox::new(0.0, 0.0, 0.0001, 1.0));
        assert_eq!(
            report.errors(),
            ["Bounding box too small: 0.000100° x 1.000000°. Please select a larger area (min: 0.001° x 0.001°)."]
        );
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        assert!(check(BoundingBox::new(0.0, 0.0, 10.0, 10.0)).is_valid());
        assert!(check(BoundingBox::new(0.0, 0.0, 0.001, 0.001)).is_valid());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let report = check(BoundingBox::new(179.5, 10.0, 180.5, 11.0));
        assert_eq!(report.errors().len(), 1);
        assert!(report.errors()[0].starts_with("Coordinates out of range."));

        let report = check(BoundingBox::new(0.0, 89.5, 1.0, 90.5));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_nan_is_out_of_range() {
        let report = check(BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0));
        assert!(report.errors()[0].starts_with("Coordinates out of range."));
    }

    #[test]
    fn test_data_sources() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        for source in DataSource::ALL {
            assert!(validate(&bbox, START, END, source.as_str()).is_valid());
        }
        let report = validate(&bbox, START, END, "foo");
        assert_eq!(
            report.errors(),
            ["Invalid data source. Must be one of: sentinel2, sentinel2_l1c, landsat8, landsat8_l1, landsat7, landsat5, hls, modis"]
        );
    }

    #[test]
    fn test_rejects_start_after_end() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let report = validate(&bbox, "2025-07-01", "2025-06-01", "sentinel2");
        assert_eq!(report.errors(), ["Start date must be on or before end date"]);
        assert!(validate(&bbox, "2025-06-01", "2025-06-01", "sentinel2").is_valid());
    }

    #[test]
    fn test_rejects_unparseable_dates() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let report = validate(&bbox, "yesterday", "2025-02-30", "sentinel2");
        assert_eq!(
            report.errors(),
            ["Invalid start date: yesterday", "Invalid end date: 2025-02-30"]
        );
    }

    #[test]
    fn test_collects_all_violations() {
        let bbox = BoundingBox::new(-200.0, 0.0, 0.0, 0.0);
        let report = validate(&bbox, "2025-07-01", "2025-06-01", "foo");
        assert_eq!(report.errors().len(), 5);
        assert_eq!(report.joined().matches("; ").count(), 4);
    }
}
