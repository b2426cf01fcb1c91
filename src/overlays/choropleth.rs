use super::{display_value, geometry_bounds, StyledFeature};
use crate::config::ChoroplethConfig;
use crate::data::Dataset;
use crate::types::{Bounds, BrowserEngine, PathStyle, StyleOverride};
use serde::{Deserialize, Serialize};

/// Pointer events a choropleth polygon reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureEvent {
    MouseOver,
    MouseOut,
    Click,
}

/// What the renderer should do in response to a [`FeatureEvent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FeatureAction {
    SetStyle(PathStyle),
    BringToFront,
    ResetStyle,
    FitBounds(Bounds),
}

/// Districts colored by a value on a threshold scale, with hover highlight
/// and click-to-zoom.
#[derive(Debug, Clone, Serialize)]
pub struct ChoroplethOverlay {
    pub pane: Option<String>,
    pub features: Vec<StyledFeature>,
    pub highlight: StyleOverride,
}

impl ChoroplethOverlay {
    pub fn build(dataset: &Dataset, config: &ChoroplethConfig) -> Self {
        let features = dataset
            .features
            .iter()
            .filter_map(|feature| {
                let geometry = feature.geometry.as_ref()?;
                let style = PathStyle {
                    fill_color: config
                        .scale
                        .color_for_property(feature, &config.value_property)
                        .clone(),
                    fill_opacity: config.fill_opacity,
                    weight: config.weight,
                    opacity: config.opacity,
                    color: config.stroke.clone(),
                };
                let name = display_value(feature.property(&config.name_property))
                    .unwrap_or_else(|| "Unknown".to_string());
                let value = display_value(feature.property(&config.value_property))
                    .unwrap_or_else(|| "Unknown".to_string());

                Some(StyledFeature {
                    geometry: geometry.clone(),
                    style,
                    popup: Some(format!(
                        "<strong>District:</strong> {name}<br><strong>Value:</strong> {value}"
                    )),
                    bounds: geometry_bounds(geometry),
                })
            })
            .collect();

        Self {
            pane: config.pane.clone(),
            features,
            highlight: config.highlight.clone(),
        }
    }

    /// Actions for `event` on feature `index`, or `None` if there is no such
    /// feature.
    pub fn respond(
        &self,
        index: usize,
        event: FeatureEvent,
        engine: BrowserEngine,
    ) -> Option<Vec<FeatureAction>> {
        let feature = self.features.get(index)?;
        let actions = match event {
            FeatureEvent::MouseOver => {
                let mut actions = vec![FeatureAction::SetStyle(feature.style.apply(&self.highlight))];
                // raising a path on legacy engines swallows its mouseout
                if engine.supports_bring_to_front() {
                    actions.push(FeatureAction::BringToFront);
                }
                actions
            }
            FeatureEvent::MouseOut => vec![FeatureAction::ResetStyle],
            FeatureEvent::Click => feature
                .bounds
                .map(FeatureAction::FitBounds)
                .into_iter()
                .collect(),
        };
        Some(actions)
    }
}
