//! Overlay builders: each turns one loaded [`Dataset`](crate::data::Dataset)
//! into a renderable layer.

pub mod choropleth;
pub mod districts;
pub mod heatmap;
pub mod markers;

pub use choropleth::{ChoroplethOverlay, FeatureAction, FeatureEvent};
pub use districts::DistrictsOverlay;
pub use heatmap::{HeatPoint, HeatmapOptions, HeatmapOverlay};
pub use markers::{Cluster, Marker, MarkerClusterOverlay};

use crate::types::{Bounds, LatLng, OverlayId, PathStyle};
use geo::BoundingRect;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OverlayLayer {
    Districts(DistrictsOverlay),
    Choropleth(ChoroplethOverlay),
    Heatmap(HeatmapOverlay),
    Markers(MarkerClusterOverlay),
}

impl OverlayLayer {
    pub fn id(&self) -> OverlayId {
        match self {
            OverlayLayer::Districts(_) => OverlayId::Districts,
            OverlayLayer::Choropleth(_) => OverlayId::Choropleth,
            OverlayLayer::Heatmap(_) => OverlayId::Heatmap,
            OverlayLayer::Markers(_) => OverlayId::Markers,
        }
    }

    /// Rendered features, heat samples or markers.
    pub fn len(&self) -> usize {
        match self {
            OverlayLayer::Districts(o) => o.features.len(),
            OverlayLayer::Choropleth(o) => o.features.len(),
            OverlayLayer::Heatmap(o) => o.points.len(),
            OverlayLayer::Markers(o) => o.markers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A polygon feature with its resolved style and popup.
#[derive(Debug, Clone, Serialize)]
pub struct StyledFeature {
    pub geometry: geojson::Geometry,
    pub style: PathStyle,
    pub popup: Option<String>,
    pub bounds: Option<Bounds>,
}

pub(crate) fn geometry_bounds(geometry: &geojson::Geometry) -> Option<Bounds> {
    let geom: geo::Geometry<f64> = geometry.value.clone().try_into().ok()?;
    let rect = geom.bounding_rect()?;
    Some(Bounds {
        south_west: LatLng::new(rect.min().y, rect.min().x),
        north_east: LatLng::new(rect.max().y, rect.max().x),
    })
}

/// GeoJSON positions are `[lng, lat]`.
pub(crate) fn point_position(geometry: &geojson::Geometry) -> Option<LatLng> {
    match &geometry.value {
        geojson::Value::Point(coords) if coords.len() >= 2 => Some(LatLng::new(coords[1], coords[0])),
        _ => None,
    }
}

/// Popup text for a property value. Null and empty strings count as absent.
pub(crate) fn display_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(escape_html(s)),
        Value::Number(n) => Some(n.to_string()),
        other => Some(escape_html(&other.to_string())),
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
