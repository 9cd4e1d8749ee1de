use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub type AttributionId = String;

/// All attributions of one dataset, keyed by attribution id.
pub type Attributions = HashMap<AttributionId, PackageAttribution>;

/// A single package attribution as stored in the input/output files.
///
/// Field names follow the camelCase convention of the attribution JSON
/// format, so these structs round-trip through serde without a mapping layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageAttribution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Confidence in percent (0-100) reported by the detecting tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution_confidence: Option<f64>,
    pub pre_selected: bool,
    pub first_party: bool,
    pub exclude_from_notice: bool,
    pub follow_up: bool,
}

impl PackageAttribution {
    /// Display label for list rows: "name, version" with fallbacks.
    pub fn display_label(&self) -> String {
        match (&self.package_name, &self.package_version) {
            (Some(name), Some(version)) => format!("{}, {}", name, version),
            (Some(name), None) => name.clone(),
            (None, _) => "<unnamed>".to_string(),
        }
    }
}

/// Summary counts over a set of attributions, shown in the header line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributionCounts {
    pub total: usize,
    pub follow_up: usize,
    pub pre_selected: usize,
    pub first_party: usize,
}

impl AttributionCounts {
    pub fn from_attributions(attributions: &Attributions) -> Self {
        let mut counts = Self::default();
        for attribution in attributions.values() {
            counts.total += 1;
            if attribution.follow_up {
                counts.follow_up += 1;
            }
            if attribution.pre_selected {
                counts.pre_selected += 1;
            }
            if attribution.first_party {
                counts.first_party += 1;
            }
        }
        counts
    }
}
