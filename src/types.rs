use serde::{Deserialize, Serialize};
use std::fmt;

/// A CSS color token as handed to the renderer ("#800026", "grey", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(token: impl Into<String>) -> Self {
        Color(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Color {
    fn from(token: &str) -> Self {
        Color::new(token)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

/// Full path style of a polygon or circle marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    pub fill_color: Color,
    pub fill_opacity: f64,
    pub weight: f64,
    pub opacity: f64,
    pub color: Color,
}

/// Partial style applied on top of a [`PathStyle`] (hover highlight).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOverride {
    pub weight: Option<f64>,
    pub color: Option<Color>,
    pub fill_opacity: Option<f64>,
}

impl PathStyle {
    pub fn apply(&self, patch: &StyleOverride) -> PathStyle {
        PathStyle {
            fill_color: self.fill_color.clone(),
            fill_opacity: patch.fill_opacity.unwrap_or(self.fill_opacity),
            weight: patch.weight.unwrap_or(self.weight),
            opacity: self.opacity,
            color: patch.color.clone().unwrap_or_else(|| self.color.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Identity of each overlay the controller manages. Event bindings match on
/// this, never on the display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayId {
    Districts,
    Choropleth,
    Heatmap,
    Markers,
}

impl OverlayId {
    /// Layer-control order.
    pub const ALL: [OverlayId; 4] = [
        OverlayId::Districts,
        OverlayId::Choropleth,
        OverlayId::Heatmap,
        OverlayId::Markers,
    ];
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverlayId::Districts => "districts",
            OverlayId::Choropleth => "choropleth",
            OverlayId::Heatmap => "heatmap",
            OverlayId::Markers => "markers",
        };
        f.write_str(name)
    }
}

/// Lifecycle of one overlay: `Unloaded -> Loading -> {Ready | Failed}`, then
/// `Ready -> Visible <-> Hidden`. `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayState {
    Unloaded,
    Loading,
    Ready,
    Failed,
    Visible,
    Hidden,
}

impl OverlayState {
    pub fn is_loaded(self) -> bool {
        matches!(self, OverlayState::Ready | OverlayState::Visible | OverlayState::Hidden)
    }
}

/// Rendering engine of the host page. Legacy engines cannot raise a hovered
/// path to the front without breaking its event handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrowserEngine {
    #[default]
    Modern,
    InternetExplorer,
    Opera,
    LegacyEdge,
}

impl BrowserEngine {
    pub fn supports_bring_to_front(self) -> bool {
        matches!(self, BrowserEngine::Modern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_keeps_unset_fields() {
        let base = PathStyle {
            fill_color: "#FEB24C".into(),
            fill_opacity: 0.7,
            weight: 1.0,
            opacity: 1.0,
            color: "white".into(),
        };
        let patch = StyleOverride {
            weight: Some(3.0),
            color: Some("#666".into()),
            fill_opacity: None,
        };
        let highlighted = base.apply(&patch);
        assert_eq!(highlighted.weight, 3.0);
        assert_eq!(highlighted.color.as_str(), "#666");
        assert_eq!(highlighted.fill_opacity, 0.7);
        assert_eq!(highlighted.fill_color, base.fill_color);
    }

    #[test]
    fn only_modern_engine_raises_to_front() {
        assert!(BrowserEngine::Modern.supports_bring_to_front());
        assert!(!BrowserEngine::InternetExplorer.supports_bring_to_front());
        assert!(!BrowserEngine::Opera.supports_bring_to_front());
        assert!(!BrowserEngine::LegacyEdge.supports_bring_to_front());
    }
}
