use crate::legend::LegendSpec;
use crate::style::{PaletteName, ThresholdScale};
use crate::types::{BrowserEngine, Color, ControlPosition, LatLng, PathStyle, StyleOverride};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const DISTRICTS_GEOJSON: &str = "geojson/tartu_city_districts_edu.geojson";
const CELLTOWERS_GEOJSON: &str = "geojson/tartu_city_celltowers_edu.geojson";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub map: MapConfig,
    pub base_layers: Vec<TileProvider>,
    pub overlays: OverlaysConfig,
    pub legend: LegendSpec,
    pub controls: ControlsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: u8,
    pub panes: Vec<PaneConfig>,
    pub engine: BrowserEngine,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: LatLng::new(58.373523, 26.716045),
            zoom: 12,
            panes: vec![PaneConfig {
                name: "customDistrictsPane".to_string(),
                z_index: 390,
            }],
            engine: BrowserEngine::Modern,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PaneConfig {
    pub name: String,
    pub z_index: i32,
}

/// A slippy-map tile service.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TileProvider {
    pub name: String,
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
    #[serde(default)]
    pub default: bool,
}

impl TileProvider {
    pub fn defaults() -> Vec<TileProvider> {
        vec![
            TileProvider {
                name: "OpenStreetMap".to_string(),
                url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
                attribution: "OpenStreetMap contributors".to_string(),
                max_zoom: 19,
                default: true,
            },
            TileProvider {
                name: "Satellite".to_string(),
                url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}".to_string(),
                attribution: "Esri, Maxar, Earthstar Geographics, and the GIS community".to_string(),
                max_zoom: 19,
                default: false,
            },
            TileProvider {
                name: "Topographic".to_string(),
                url_template: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png".to_string(),
                attribution: "Map data: &copy; OpenStreetMap contributors, SRTM | Map style: &copy; OpenTopoMap (CC-BY-SA)".to_string(),
                max_zoom: 17,
                default: false,
            },
        ]
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct OverlaysConfig {
    pub districts: DistrictsConfig,
    pub choropleth: ChoroplethConfig,
    pub heatmap: HeatmapConfig,
    pub markers: MarkersConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DistrictsConfig {
    pub label: String,
    pub source: String,
    pub pane: Option<String>,
    pub visible_on_start: bool,
    pub id_property: String,
    pub name_property: String,
    pub palette: PaletteName,
    pub fill_opacity: f64,
    pub weight: f64,
    pub opacity: f64,
    pub stroke: Color,
}

impl Default for DistrictsConfig {
    fn default() -> Self {
        Self {
            label: "Tartu districts".to_string(),
            source: DISTRICTS_GEOJSON.to_string(),
            pane: Some("customDistrictsPane".to_string()),
            visible_on_start: true,
            id_property: "OBJECTID".to_string(),
            name_property: "NIMI".to_string(),
            palette: PaletteName::Tartu,
            fill_opacity: 0.5,
            weight: 1.0,
            opacity: 1.0,
            stroke: Color::from("grey"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ChoroplethConfig {
    pub label: String,
    pub source: String,
    pub pane: Option<String>,
    pub visible_on_start: bool,
    pub value_property: String,
    pub name_property: String,
    pub scale: ThresholdScale,
    pub fill_opacity: f64,
    pub weight: f64,
    pub opacity: f64,
    pub stroke: Color,
    pub highlight: StyleOverride,
}

impl Default for ChoroplethConfig {
    fn default() -> Self {
        Self {
            label: "Choropleth layer".to_string(),
            source: DISTRICTS_GEOJSON.to_string(),
            pane: Some("customDistrictsPane".to_string()),
            visible_on_start: false,
            value_property: "OBJECTID".to_string(),
            name_property: "NIMI".to_string(),
            scale: ThresholdScale::district_values(),
            fill_opacity: 0.7,
            weight: 1.0,
            opacity: 1.0,
            stroke: Color::from("white"),
            highlight: StyleOverride {
                weight: Some(3.0),
                color: Some(Color::from("#666")),
                fill_opacity: Some(0.7),
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HeatmapConfig {
    pub label: String,
    pub source: String,
    pub visible_on_start: bool,
    /// Checked in order; the first numeric one is the intensity.
    pub weight_properties: Vec<String>,
    pub radius: f64,
    pub blur: f64,
    pub max_zoom: u8,
    pub min_opacity: Option<f64>,
    /// Stop ("0.4") to color.
    pub gradient: BTreeMap<String, Color>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            label: "Heatmap".to_string(),
            source: CELLTOWERS_GEOJSON.to_string(),
            visible_on_start: false,
            weight_properties: vec!["area".to_string()],
            radius: 20.0,
            blur: 15.0,
            max_zoom: 17,
            min_opacity: None,
            gradient: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MarkersConfig {
    pub label: String,
    pub source: String,
    pub visible_on_start: bool,
    pub popup_property: String,
    pub popup_title: String,
    pub popup_label: String,
    pub radius: f64,
    pub style: PathStyle,
    pub max_cluster_radius: f64,
}

impl Default for MarkersConfig {
    fn default() -> Self {
        Self {
            label: "Markers".to_string(),
            source: CELLTOWERS_GEOJSON.to_string(),
            visible_on_start: false,
            popup_property: "area".to_string(),
            popup_title: "Cell Tower".to_string(),
            popup_label: "Area".to_string(),
            radius: 5.0,
            style: PathStyle {
                fill_color: Color::from("red"),
                fill_opacity: 0.5,
                weight: 1.0,
                opacity: 1.0,
                color: Color::from("red"),
            },
            max_cluster_radius: 80.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    pub layers_position: ControlPosition,
    pub layers_collapsed: bool,
    pub zoom_position: ControlPosition,
    pub scale_position: ControlPosition,
    pub scale_imperial: bool,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            layers_position: ControlPosition::TopLeft,
            layers_collapsed: false,
            zoom_position: ControlPosition::TopRight,
            scale_position: ControlPosition::BottomRight,
            scale_imperial: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub scene_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            scene_path: PathBuf::from("scene.json"),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Base layers, falling back to the three stock providers.
    pub fn tile_providers(&self) -> Vec<TileProvider> {
        if self.base_layers.is_empty() {
            TileProvider::defaults()
        } else {
            self.base_layers.clone()
        }
    }
}
