//! Result tab selection and display formatting.

use serde::{Deserialize, Serialize};

use crate::models::request::DataSource;
use crate::models::result::{AnalysisMetrics, AnalysisOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultTab {
    #[default]
    Parameters,
    Ndwi,
    Ml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageTab {
    #[default]
    Analysis,
    Rgb,
    Ndwi,
}

impl ImageTab {
    pub const ALL: [ImageTab; 3] = [ImageTab::Analysis, ImageTab::Rgb, ImageTab::Ndwi];

    pub fn label(&self) -> &'static str {
        match self {
            ImageTab::Analysis => "NDWI Analysis",
            ImageTab::Rgb => "True Color",
            ImageTab::Ndwi => "Detailed NDWI",
        }
    }

    pub fn url<'a>(&self, metrics: &'a AnalysisMetrics) -> Option<&'a str> {
        match self {
            ImageTab::Analysis => Some(metrics.image_url.as_str()).filter(|u| !u.is_empty()),
            ImageTab::Rgb => metrics.rgb_image_url.as_deref(),
            ImageTab::Ndwi => metrics.detailed_ndwi_url.as_deref(),
        }
    }
}

/// Which result tab and image sub-tab are showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultView {
    pub tab: ResultTab,
    pub image_tab: ImageTab,
}

impl ResultView {
    pub fn select_tab(&mut self, tab: ResultTab) {
        self.tab = tab;
    }

    pub fn select_image(&mut self, image_tab: ImageTab) {
        self.image_tab = image_tab;
    }

    /// React to a fresh outcome: a success moves the user off the
    /// parameters form onto the NDWI results.
    pub fn on_outcome(&mut self, outcome: &AnalysisOutcome) {
        if outcome.is_success() && self.tab == ResultTab::Parameters {
            self.tab = ResultTab::Ndwi;
        }
        self.image_tab = ImageTab::Analysis;
    }

    pub fn image_url<'a>(&self, metrics: &'a AnalysisMetrics) -> Option<&'a str> {
        self.image_tab.url(metrics)
    }
}

/// Image tabs that have something to show.
pub fn visible_image_tabs(metrics: &AnalysisMetrics) -> Vec<ImageTab> {
    ImageTab::ALL
        .into_iter()
        .filter(|tab| tab.url(metrics).is_some())
        .collect()
}

pub fn ml_tab_available(metrics: &AnalysisMetrics) -> bool {
    metrics.ml_analysis_available && metrics.ml_analysis.is_some()
}

/// Product name for the source the metrics were computed from. Unknown
/// identifiers are shown as reported.
pub fn data_source_label(metrics: &AnalysisMetrics) -> Option<String> {
    let name = metrics.data_source.as_deref()?;
    Some(match name.parse::<DataSource>() {
        Ok(source) => source.display_name().to_string(),
        Err(_) => name.to_string(),
    })
}

/// Metric card text, `0%` when the value is missing.
pub fn format_percent(value: Option<f64>) -> String {
    format!("{}%", value.unwrap_or(0.0))
}
