//! Render and extraction settings.
//!
//! Both structs deserialize from camelCase JSON with every field optional,
//! so a config file only needs the keys it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Options for turning descriptors into plot configs.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub min_bubble_radius: f64,
    pub max_bubble_radius: f64,
    /// Radius when sizes are missing or all equal
    pub default_bubble_radius: f64,
    /// Decimal places in histogram bucket labels
    pub histogram_label_precision: usize,
    pub show_legend: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            canvas_width: 420,
            canvas_height: 260,
            min_bubble_radius: 3.0,
            max_bubble_radius: 18.0,
            default_bubble_radius: 6.0,
            histogram_label_precision: 2,
            show_legend: true,
        }
    }
}

/// Options for a whole chart session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractOptions {
    /// Charts rendered per sheet; the rest are reported as truncated
    pub chart_limit: usize,
    pub render: RenderOptions,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            chart_limit: 12,
            render: RenderOptions::default(),
        }
    }
}

impl ExtractOptions {
    /// Parse options from JSON.
    ///
    /// # Errors
    /// [`XlchartError::Config`](crate::error::XlchartError::Config) on
    /// malformed JSON or a field of the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read options from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::error::XlchartError;

    #[test]
    fn test_defaults() {
        let options = ExtractOptions::default();
        assert_eq!(options.chart_limit, 12);
        assert_eq!(options.render.canvas_width, 420);
        assert_eq!(options.render.canvas_height, 260);
        assert_eq!(options.render.default_bubble_radius, 6.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options =
            ExtractOptions::from_json(r#"{"chartLimit": 3, "render": {"maxBubbleRadius": 30}}"#)
                .unwrap();
        assert_eq!(options.chart_limit, 3);
        assert_eq!(options.render.max_bubble_radius, 30.0);
        assert_eq!(options.render.min_bubble_radius, 3.0);
        assert_eq!(options.render.histogram_label_precision, 2);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        assert!(matches!(
            ExtractOptions::from_json(r#"{"chartLimit": "many"}"#),
            Err(XlchartError::Config(_))
        ));
    }
}
