//! Analysis request types.
//!
//! [`AnalysisRequestBody`] is the JSON shape exchanged between the dispatch
//! client and the gateway. [`AnalysisRequest`] is its validated, typed form and
//! can only be obtained through the validator.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bbox::BoundingBox;
use crate::services::validation::{self, ValidationReport};

/// Date format used on the wire (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Satellite collection the analysis scripts can read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataSource {
    #[default]
    #[serde(rename = "sentinel2")]
    Sentinel2,
    #[serde(rename = "sentinel2_l1c")]
    Sentinel2L1c,
    #[serde(rename = "landsat8")]
    Landsat8,
    #[serde(rename = "landsat8_l1")]
    Landsat8L1,
    #[serde(rename = "landsat7")]
    Landsat7,
    #[serde(rename = "landsat5")]
    Landsat5,
    #[serde(rename = "hls")]
    Hls,
    #[serde(rename = "modis")]
    Modis,
}

impl DataSource {
    pub const ALL: [DataSource; 8] = [
        DataSource::Sentinel2,
        DataSource::Sentinel2L1c,
        DataSource::Landsat8,
        DataSource::Landsat8L1,
        DataSource::Landsat7,
        DataSource::Landsat5,
        DataSource::Hls,
        DataSource::Modis,
    ];

    /// Identifier used on the wire and by the analysis scripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Sentinel2 => "sentinel2",
            DataSource::Sentinel2L1c => "sentinel2_l1c",
            DataSource::Landsat8 => "landsat8",
            DataSource::Landsat8L1 => "landsat8_l1",
            DataSource::Landsat7 => "landsat7",
            DataSource::Landsat5 => "landsat5",
            DataSource::Hls => "hls",
            DataSource::Modis => "modis",
        }
    }

    /// Human readable product name.
    pub fn display_name(&self) -> &'static str {
        match self {
            DataSource::Sentinel2 => "Sentinel-2 L2A",
            DataSource::Sentinel2L1c => "Sentinel-2 L1C",
            DataSource::Landsat8 => "Landsat 8/9 L2",
            DataSource::Landsat8L1 => "Landsat 8/9 L1",
            DataSource::Landsat7 => "Landsat 7 ETM+",
            DataSource::Landsat5 => "Landsat 4-5 TM",
            DataSource::Hls => "Harmonized Landsat Sentinel",
            DataSource::Modis => "MODIS",
        }
    }

    /// Comma separated list of every accepted identifier.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data source '{0}'")]
pub struct UnknownDataSource(pub String);

impl FromStr for DataSource {
    type Err = UnknownDataSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| UnknownDataSource(s.to_string()))
    }
}

/// Inclusive date range of imagery to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeInterval {
    pub fn to_strings(&self) -> [String; 2] {
        [
            self.start.format(DATE_FORMAT).to_string(),
            self.end.format(DATE_FORMAT).to_string(),
        ]
    }
}

/// A validated analysis request. Built at submit time and dropped after
/// dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub bbox: BoundingBox,
    pub time_interval: TimeInterval,
    pub data_source: DataSource,
}

impl AnalysisRequest {
    /// Validate raw form values and build the typed request.
    ///
    /// Every violation is reported, not just the first one.
    pub fn build(
        bbox: BoundingBox,
        start: &str,
        end: &str,
        data_source: &str,
    ) -> Result<Self, ValidationReport> {
        let report = validation::validate(&bbox, start, end, data_source);
        if !report.is_valid() {
            return Err(report);
        }

        // The validator has checked all three conversions.
        match (
            validation::parse_date(start),
            validation::parse_date(end),
            data_source.parse::<DataSource>(),
        ) {
            (Some(start), Some(end), Ok(data_source)) => Ok(Self {
                bbox,
                time_interval: TimeInterval { start, end },
                data_source,
            }),
            _ => Err(report),
        }
    }

    pub fn to_body(&self) -> AnalysisRequestBody {
        AnalysisRequestBody {
            bbox_coords: self.bbox.to_coords(),
            time_interval: self.time_interval.to_strings(),
            data_source: Some(self.data_source.as_str().to_string()),
        }
    }
}

/// JSON body of `POST /api/water-quality`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequestBody {
    /// `[west, south, east, north]`
    #[serde(rename = "bboxCoords")]
    pub bbox_coords: [f64; 4],
    /// `[startDate, endDate]`
    #[serde(rename = "timeInterval")]
    pub time_interval: [String; 2],
    /// Defaults to `sentinel2` when absent or blank.
    #[serde(rename = "dataSource", default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}

impl AnalysisRequestBody {
    pub fn data_source_or_default(&self) -> &str {
        self.data_source
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DataSource::default().as_str())
    }

    /// Validate the body and convert it into a typed request.
    pub fn into_request(self) -> Result<AnalysisRequest, ValidationReport> {
        let [start, end] = &self.time_interval;
        AnalysisRequest::build(
            BoundingBox::from_coords(self.bbox_coords),
            start,
            end,
            self.data_source_or_default(),
        )
    }
}
