//! The rendering collaborator seam.
//!
//! [`MapRenderer`] is the capability set the controller drives; the actual
//! map library sits behind it. [`SceneRenderer`] records every call into a
//! serializable [`Scene`] that can be written to disk.

use crate::config::{MapConfig, PaneConfig, TileProvider};
use crate::legend::LegendFragment;
use crate::overlays::OverlayLayer;
use crate::types::{Bounds, ControlPosition, LatLng, OverlayId, PathStyle};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
    /// The stock zoom control is replaced by one placed through [`MapControl`].
    pub zoom_control: bool,
}

impl From<&MapConfig> for MapView {
    fn from(config: &MapConfig) -> Self {
        Self {
            center: config.center,
            zoom: config.zoom,
            zoom_control: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerControlEntry {
    pub id: OverlayId,
    pub label: String,
}

/// The layer-selection control: radio buttons for base layers, checkboxes for
/// overlays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerControl {
    pub base_layers: Vec<String>,
    pub overlays: Vec<LayerControlEntry>,
    pub collapsed: bool,
    pub position: ControlPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MapControl {
    Zoom { position: ControlPosition },
    Scale { position: ControlPosition, imperial: bool },
}

pub trait MapRenderer {
    fn create_map(&mut self, view: &MapView);
    fn create_pane(&mut self, pane: &PaneConfig);
    fn set_view(&mut self, view: &MapView);
    fn add_base_layer(&mut self, provider: &TileProvider);
    fn remove_base_layer(&mut self, name: &str);
    fn add_overlay(&mut self, id: OverlayId, layer: &OverlayLayer);
    fn remove_overlay(&mut self, id: OverlayId);
    fn add_layer_control(&mut self, control: &LayerControl);
    fn add_control(&mut self, control: &MapControl);
    fn add_legend(&mut self, legend: &LegendFragment);
    fn remove_legend(&mut self);
    fn set_feature_style(&mut self, id: OverlayId, index: usize, style: &PathStyle);
    fn reset_feature_style(&mut self, id: OverlayId, index: usize);
    fn bring_to_front(&mut self, id: OverlayId, index: usize);
    fn fit_bounds(&mut self, bounds: &Bounds);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateMap,
    CreatePane { name: String },
    SetView,
    AddBaseLayer { name: String },
    RemoveBaseLayer { name: String },
    AddOverlay { id: OverlayId },
    RemoveOverlay { id: OverlayId },
    AddLayerControl,
    AddControl { control: MapControl },
    AddLegend,
    RemoveLegend,
    SetFeatureStyle { id: OverlayId, index: usize },
    ResetFeatureStyle { id: OverlayId, index: usize },
    BringToFront { id: OverlayId, index: usize },
    FitBounds { bounds: Bounds },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureStyle {
    pub id: OverlayId,
    pub index: usize,
    pub style: PathStyle,
}

/// Everything currently on the map, plus the call log that produced it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Scene {
    pub view: Option<MapView>,
    pub panes: Vec<PaneConfig>,
    pub base_layers: Vec<TileProvider>,
    pub overlays: BTreeMap<OverlayId, OverlayLayer>,
    pub layer_control: Option<LayerControl>,
    pub controls: Vec<MapControl>,
    pub legends: Vec<LegendFragment>,
    pub feature_styles: Vec<FeatureStyle>,
    pub raised: Vec<(OverlayId, usize)>,
    pub fitted_bounds: Option<Bounds>,
    pub commands: Vec<Command>,
}

impl Scene {
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create scene file: {:?}", path))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write scene to {:?}", path))?;
        info!(path = %path.display(), overlays = self.overlays.len(), "scene written");
        Ok(())
    }

    pub fn count(&self, matches: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| matches(*c)).count()
    }
}

/// Renderer that keeps the composed map in memory.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    scene: Scene,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn into_scene(self) -> Scene {
        self.scene
    }
}

impl MapRenderer for SceneRenderer {
    fn create_map(&mut self, view: &MapView) {
        self.scene.view = Some(view.clone());
        self.scene.commands.push(Command::CreateMap);
    }

    fn create_pane(&mut self, pane: &PaneConfig) {
        self.scene.panes.push(pane.clone());
        self.scene.commands.push(Command::CreatePane {
            name: pane.name.clone(),
        });
    }

    fn set_view(&mut self, view: &MapView) {
        self.scene.view = Some(view.clone());
        self.scene.fitted_bounds = None;
        self.scene.commands.push(Command::SetView);
    }

    fn add_base_layer(&mut self, provider: &TileProvider) {
        if !self.scene.base_layers.iter().any(|p| p.name == provider.name) {
            self.scene.base_layers.push(provider.clone());
        }
        self.scene.commands.push(Command::AddBaseLayer {
            name: provider.name.clone(),
        });
    }

    fn remove_base_layer(&mut self, name: &str) {
        self.scene.base_layers.retain(|p| p.name != name);
        self.scene.commands.push(Command::RemoveBaseLayer {
            name: name.to_string(),
        });
    }

    fn add_overlay(&mut self, id: OverlayId, layer: &OverlayLayer) {
        self.scene.overlays.insert(id, layer.clone());
        self.scene.commands.push(Command::AddOverlay { id });
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        self.scene.overlays.remove(&id);
        self.scene.feature_styles.retain(|s| s.id != id);
        self.scene.raised.retain(|(raised, _)| *raised != id);
        self.scene.commands.push(Command::RemoveOverlay { id });
    }

    fn add_layer_control(&mut self, control: &LayerControl) {
        self.scene.layer_control = Some(control.clone());
        self.scene.commands.push(Command::AddLayerControl);
    }

    fn add_control(&mut self, control: &MapControl) {
        self.scene.controls.push(control.clone());
        self.scene.commands.push(Command::AddControl {
            control: control.clone(),
        });
    }

    fn add_legend(&mut self, legend: &LegendFragment) {
        self.scene.legends.push(legend.clone());
        self.scene.commands.push(Command::AddLegend);
    }

    fn remove_legend(&mut self) {
        self.scene.legends.pop();
        self.scene.commands.push(Command::RemoveLegend);
    }

    fn set_feature_style(&mut self, id: OverlayId, index: usize, style: &PathStyle) {
        self.scene.feature_styles.retain(|s| !(s.id == id && s.index == index));
        self.scene.feature_styles.push(FeatureStyle {
            id,
            index,
            style: style.clone(),
        });
        self.scene.commands.push(Command::SetFeatureStyle { id, index });
    }

    fn reset_feature_style(&mut self, id: OverlayId, index: usize) {
        self.scene.feature_styles.retain(|s| !(s.id == id && s.index == index));
        self.scene.commands.push(Command::ResetFeatureStyle { id, index });
    }

    fn bring_to_front(&mut self, id: OverlayId, index: usize) {
        self.scene.raised.retain(|r| *r != (id, index));
        self.scene.raised.push((id, index));
        self.scene.commands.push(Command::BringToFront { id, index });
    }

    fn fit_bounds(&mut self, bounds: &Bounds) {
        self.scene.fitted_bounds = Some(*bounds);
        self.scene.commands.push(Command::FitBounds { bounds: *bounds });
    }
}
