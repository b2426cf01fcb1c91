use super::{display_value, escape_html, geometry_bounds, StyledFeature};
use crate::config::DistrictsConfig;
use crate::data::Dataset;
use crate::types::PathStyle;
use serde::Serialize;
use tracing::debug;

/// District polygons filled from a categorical palette.
#[derive(Debug, Clone, Serialize)]
pub struct DistrictsOverlay {
    pub pane: Option<String>,
    pub features: Vec<StyledFeature>,
}

impl DistrictsOverlay {
    pub fn build(dataset: &Dataset, config: &DistrictsConfig) -> Self {
        let palette = config.palette.scale();
        let mut features = Vec::with_capacity(dataset.len());

        for feature in &dataset.features {
            let Some(geometry) = &feature.geometry else {
                debug!(source = %dataset.source, "skipping district without geometry");
                continue;
            };

            let style = PathStyle {
                fill_color: palette.color_for_property(feature, &config.id_property).clone(),
                fill_opacity: config.fill_opacity,
                weight: config.weight,
                opacity: config.opacity,
                color: config.stroke.clone(),
            };

            let name = feature
                .property(&config.name_property)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty());
            let popup = match name {
                Some(name) => escape_html(name),
                None => match display_value(feature.property(&config.id_property)) {
                    Some(id) => format!("District {id}"),
                    None => "District".to_string(),
                },
            };

            features.push(StyledFeature {
                geometry: geometry.clone(),
                style,
                popup: Some(popup),
                bounds: geometry_bounds(geometry),
            });
        }

        Self {
            pane: config.pane.clone(),
            features,
        }
    }
}
