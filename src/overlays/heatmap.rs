use super::point_position;
use crate::config::HeatmapConfig;
use crate::data::Dataset;
use crate::style::numeric_property;
use crate::types::Color;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapOptions {
    pub radius: f64,
    pub blur: f64,
    pub max_zoom: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_opacity: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub gradient: BTreeMap<String, Color>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapOverlay {
    pub points: Vec<HeatPoint>,
    pub options: HeatmapOptions,
}

impl HeatmapOverlay {
    /// Intensities are passed through as-is; the renderer normalizes them.
    pub fn build(dataset: &Dataset, config: &HeatmapConfig) -> Self {
        let mut points = Vec::with_capacity(dataset.len());
        let mut skipped = 0usize;

        for feature in &dataset.features {
            let Some(position) = feature.geometry.as_ref().and_then(point_position) else {
                skipped += 1;
                continue;
            };
            let intensity = config
                .weight_properties
                .iter()
                .find_map(|key| numeric_property(feature, key))
                .unwrap_or(1.0);
            points.push(HeatPoint {
                lat: position.lat,
                lng: position.lng,
                intensity,
            });
        }

        if skipped > 0 {
            warn!(source = %dataset.source, skipped, "heatmap ignores non-point features");
        }

        Self {
            points,
            options: HeatmapOptions {
                radius: config.radius,
                blur: config.blur,
                max_zoom: config.max_zoom,
                min_opacity: config.min_opacity,
                gradient: config.gradient.clone(),
            },
        }
    }
}
