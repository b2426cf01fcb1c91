//! Composition of the multi-layer map: loads every overlay, then builds the
//! layer control and wires the legend to the choropleth's visibility.

use crate::config::{AppConfig, TileProvider};
use crate::data::{load_overlay, DatasetFetcher};
use crate::error::ControlError;
use crate::legend::{build_legend, LegendFragment};
use crate::overlays::{
    ChoroplethOverlay, DistrictsOverlay, FeatureAction, FeatureEvent, HeatmapOverlay,
    MarkerClusterOverlay, OverlayLayer,
};
use crate::render::{LayerControl, LayerControlEntry, MapControl, MapRenderer, MapView};
use crate::types::{BrowserEngine, OverlayId, OverlayState};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEventKind {
    OverlayAdd,
    OverlayRemove,
}

/// A map-level event, identified by overlay rather than by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEvent {
    pub kind: MapEventKind,
    pub overlay: OverlayId,
}

impl MapEvent {
    pub fn overlay_add(overlay: OverlayId) -> Self {
        Self {
            kind: MapEventKind::OverlayAdd,
            overlay,
        }
    }

    pub fn overlay_remove(overlay: OverlayId) -> Self {
        Self {
            kind: MapEventKind::OverlayRemove,
            overlay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingAction {
    AttachLegend,
    DetachLegend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventBinding {
    pub kind: MapEventKind,
    pub overlay: OverlayId,
    pub action: BindingAction,
}

#[derive(Debug)]
struct OverlaySlot {
    label: String,
    state: OverlayState,
    layer: Option<OverlayLayer>,
}

/// Outcome of [`MapCompositionController::initialize`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InitReport {
    pub loaded: Vec<OverlayId>,
    pub failed: Vec<OverlayId>,
}

pub struct MapCompositionController<R: MapRenderer> {
    config: AppConfig,
    renderer: R,
    providers: Vec<TileProvider>,
    active_base: Option<String>,
    overlays: BTreeMap<OverlayId, OverlaySlot>,
    legend: Option<LegendFragment>,
    legend_attached: bool,
    bindings: Vec<EventBinding>,
    engine: BrowserEngine,
}

impl<R: MapRenderer> MapCompositionController<R> {
    /// Creates the map view and its panes. Nothing is loaded yet.
    pub fn new(config: AppConfig, mut renderer: R) -> Self {
        renderer.create_map(&MapView::from(&config.map));
        for pane in &config.map.panes {
            renderer.create_pane(pane);
        }

        let overlays = OverlayId::ALL
            .into_iter()
            .map(|id| {
                let slot = OverlaySlot {
                    label: overlay_label(&config, id).to_string(),
                    state: OverlayState::Unloaded,
                    layer: None,
                };
                (id, slot)
            })
            .collect();

        Self {
            providers: config.tile_providers(),
            engine: config.map.engine,
            config,
            renderer,
            active_base: None,
            overlays,
            legend: None,
            legend_attached: false,
            bindings: Vec::new(),
        }
    }

    /// Loads all overlays concurrently, waits for every one to settle, then
    /// assembles the controls and the startup view in one step.
    ///
    /// Runs once per controller; a failed overlay stays failed.
    pub async fn initialize(
        &mut self,
        fetcher: &dyn DatasetFetcher,
    ) -> Result<InitReport, ControlError> {
        if self
            .overlays
            .values()
            .any(|slot| slot.state != OverlayState::Unloaded)
        {
            warn!("initialize called on an already composed map");
            return Err(ControlError::AlreadyInitialized);
        }
        for slot in self.overlays.values_mut() {
            slot.state = OverlayState::Loading;
        }

        let overlays = &self.config.overlays;
        let (districts, choropleth, heatmap, markers) = tokio::join!(
            load_overlay(fetcher, OverlayId::Districts, &overlays.districts.source, |d| {
                OverlayLayer::Districts(DistrictsOverlay::build(d, &overlays.districts))
            }),
            load_overlay(fetcher, OverlayId::Choropleth, &overlays.choropleth.source, |d| {
                OverlayLayer::Choropleth(ChoroplethOverlay::build(d, &overlays.choropleth))
            }),
            load_overlay(fetcher, OverlayId::Heatmap, &overlays.heatmap.source, |d| {
                OverlayLayer::Heatmap(HeatmapOverlay::build(d, &overlays.heatmap))
            }),
            load_overlay(fetcher, OverlayId::Markers, &overlays.markers.source, |d| {
                OverlayLayer::Markers(MarkerClusterOverlay::build(d, &overlays.markers))
            }),
        );

        let mut report = InitReport::default();
        for (id, layer) in [
            (OverlayId::Districts, districts),
            (OverlayId::Choropleth, choropleth),
            (OverlayId::Heatmap, heatmap),
            (OverlayId::Markers, markers),
        ] {
            let Some(slot) = self.overlays.get_mut(&id) else {
                continue;
            };
            match layer {
                Some(layer) => {
                    info!(overlay = %id, items = layer.len(), "overlay ready");
                    slot.state = OverlayState::Ready;
                    slot.layer = Some(layer);
                    report.loaded.push(id);
                }
                None => {
                    slot.state = OverlayState::Failed;
                    report.failed.push(id);
                }
            }
        }

        if report.loaded.contains(&OverlayId::Choropleth) {
            match build_legend(&self.config.legend) {
                Ok(legend) => self.legend = Some(legend),
                Err(e) => warn!("legend disabled: {e}"),
            }
        }

        self.build_controls();
        self.show_startup_layers();
        Ok(report)
    }

    fn build_controls(&mut self) {
        let control = LayerControl {
            base_layers: self.providers.iter().map(|p| p.name.clone()).collect(),
            overlays: self
                .overlays
                .iter()
                .filter(|(_, slot)| slot.state.is_loaded())
                .map(|(id, slot)| LayerControlEntry {
                    id: *id,
                    label: slot.label.clone(),
                })
                .collect(),
            collapsed: self.config.controls.layers_collapsed,
            position: self.config.controls.layers_position,
        };
        self.renderer.add_layer_control(&control);

        self.bind(MapEventKind::OverlayAdd, OverlayId::Choropleth, BindingAction::AttachLegend);
        self.bind(MapEventKind::OverlayRemove, OverlayId::Choropleth, BindingAction::DetachLegend);

        let controls = &self.config.controls;
        self.renderer.add_control(&MapControl::Zoom {
            position: controls.zoom_position,
        });
        self.renderer.add_control(&MapControl::Scale {
            position: controls.scale_position,
            imperial: controls.scale_imperial,
        });
    }

    fn show_startup_layers(&mut self) {
        if let Some(base) = self
            .providers
            .iter()
            .find(|p| p.default)
            .or_else(|| self.providers.first())
        {
            self.renderer.add_base_layer(base);
            self.active_base = Some(base.name.clone());
        }

        for id in OverlayId::ALL {
            if !self.overlay_state(id).is_loaded() {
                continue;
            }
            if visible_on_start(&self.config, id) {
                self.show(id);
                self.dispatch(MapEvent::overlay_add(id));
            } else if let Some(slot) = self.overlays.get_mut(&id) {
                slot.state = OverlayState::Hidden;
            }
        }
    }

    /// Registers `action` to run when `kind` fires for exactly `overlay`.
    pub fn bind(&mut self, kind: MapEventKind, overlay: OverlayId, action: BindingAction) {
        let binding = EventBinding {
            kind,
            overlay,
            action,
        };
        if !self.bindings.contains(&binding) {
            self.bindings.push(binding);
        }
    }

    /// User toggle from the layer control.
    pub fn set_overlay_visible(&mut self, id: OverlayId, visible: bool) -> Result<(), ControlError> {
        match (self.overlay_state(id), visible) {
            (OverlayState::Visible, true) | (OverlayState::Hidden, false) => Ok(()),
            (OverlayState::Ready | OverlayState::Hidden, true) => {
                self.show(id);
                self.dispatch(MapEvent::overlay_add(id));
                Ok(())
            }
            (OverlayState::Visible | OverlayState::Ready, false) => {
                self.hide(id);
                self.dispatch(MapEvent::overlay_remove(id));
                Ok(())
            }
            _ => Err(ControlError::Unavailable(id)),
        }
    }

    fn show(&mut self, id: OverlayId) {
        if let Some(slot) = self.overlays.get_mut(&id) {
            if let Some(layer) = &slot.layer {
                self.renderer.add_overlay(id, layer);
                slot.state = OverlayState::Visible;
            }
        }
    }

    fn hide(&mut self, id: OverlayId) {
        if let Some(slot) = self.overlays.get_mut(&id) {
            if slot.state == OverlayState::Visible {
                self.renderer.remove_overlay(id);
            }
            slot.state = OverlayState::Hidden;
        }
    }

    /// Runs every binding registered for this exact event and overlay.
    pub fn dispatch(&mut self, event: MapEvent) {
        let actions: Vec<BindingAction> = self
            .bindings
            .iter()
            .filter(|b| b.kind == event.kind && b.overlay == event.overlay)
            .map(|b| b.action)
            .collect();
        debug!(?event, handlers = actions.len(), "map event");

        for action in actions {
            match action {
                BindingAction::AttachLegend => self.attach_legend(),
                BindingAction::DetachLegend => self.detach_legend(),
            }
        }
    }

    fn attach_legend(&mut self) {
        if self.legend_attached {
            return;
        }
        if let Some(legend) = &self.legend {
            self.renderer.add_legend(legend);
            self.legend_attached = true;
        }
    }

    fn detach_legend(&mut self) {
        if self.legend_attached {
            self.renderer.remove_legend();
            self.legend_attached = false;
        }
    }

    /// Returns the view to the configured center and zoom.
    pub fn reset_view(&mut self) {
        let view = MapView::from(&self.config.map);
        debug!(center = ?view.center, zoom = view.zoom, "resetting view");
        self.renderer.set_view(&view);
    }

    pub fn select_base_layer(&mut self, name: &str) -> Result<(), ControlError> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ControlError::UnknownBaseLayer(name.to_string()))?;

        if self.active_base.as_deref() == Some(name) {
            return Ok(());
        }
        if let Some(current) = self.active_base.take() {
            self.renderer.remove_base_layer(&current);
        }
        self.renderer.add_base_layer(provider);
        self.active_base = Some(provider.name.clone());
        Ok(())
    }

    /// Pointer interaction on one feature of a visible overlay.
    pub fn handle_feature_event(
        &mut self,
        id: OverlayId,
        index: usize,
        event: FeatureEvent,
    ) -> Result<(), ControlError> {
        let slot = self.overlays.get(&id).ok_or(ControlError::Unavailable(id))?;
        if slot.state != OverlayState::Visible {
            return Err(if slot.state.is_loaded() {
                ControlError::NotVisible(id)
            } else {
                ControlError::Unavailable(id)
            });
        }
        let Some(OverlayLayer::Choropleth(choropleth)) = &slot.layer else {
            return Err(ControlError::NotInteractive(id));
        };

        let actions = choropleth
            .respond(index, event, self.engine)
            .ok_or(ControlError::UnknownFeature { overlay: id, index })?;

        for action in actions {
            match action {
                FeatureAction::SetStyle(style) => self.renderer.set_feature_style(id, index, &style),
                FeatureAction::BringToFront => self.renderer.bring_to_front(id, index),
                FeatureAction::ResetStyle => self.renderer.reset_feature_style(id, index),
                FeatureAction::FitBounds(bounds) => self.renderer.fit_bounds(&bounds),
            }
        }
        Ok(())
    }

    pub fn overlay_state(&self, id: OverlayId) -> OverlayState {
        self.overlays
            .get(&id)
            .map(|slot| slot.state)
            .unwrap_or(OverlayState::Unloaded)
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&OverlayLayer> {
        self.overlays.get(&id).and_then(|slot| slot.layer.as_ref())
    }

    pub fn legend(&self) -> Option<&LegendFragment> {
        self.legend.as_ref()
    }

    pub fn legend_attached(&self) -> bool {
        self.legend_attached
    }

    pub fn active_base_layer(&self) -> Option<&str> {
        self.active_base.as_deref()
    }

    pub fn bindings(&self) -> &[EventBinding] {
        &self.bindings
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }
}

fn overlay_label(config: &AppConfig, id: OverlayId) -> &str {
    let overlays = &config.overlays;
    match id {
        OverlayId::Districts => &overlays.districts.label,
        OverlayId::Choropleth => &overlays.choropleth.label,
        OverlayId::Heatmap => &overlays.heatmap.label,
        OverlayId::Markers => &overlays.markers.label,
    }
}

fn visible_on_start(config: &AppConfig, id: OverlayId) -> bool {
    let overlays = &config.overlays;
    match id {
        OverlayId::Districts => overlays.districts.visible_on_start,
        OverlayId::Choropleth => overlays.choropleth.visible_on_start,
        OverlayId::Heatmap => overlays.heatmap.visible_on_start,
        OverlayId::Markers => overlays.markers.visible_on_start,
    }
}
