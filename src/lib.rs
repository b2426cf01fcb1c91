//! Multi-layer GIS map composition: a base map with selectable tile
//! providers, GeoJSON overlays (districts, choropleth, heatmap, marker
//! clusters), a layer control and a choropleth legend.

pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod legend;
pub mod overlays;
pub mod render;
pub mod style;
pub mod types;

pub use config::AppConfig;
pub use controller::{InitReport, MapCompositionController, MapEvent, MapEventKind};
pub use data::{DatasetFetcher, HttpFetcher};
pub use render::{MapRenderer, Scene, SceneRenderer};
