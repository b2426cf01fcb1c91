use axum::Router;
use map_compose::config::AppConfig;
use map_compose::data::{load_overlay, Dataset};
use map_compose::overlays::{DistrictsOverlay, OverlayLayer};
use map_compose::render::Command;
use map_compose::types::{OverlayId, OverlayState};
use map_compose::{HttpFetcher, MapCompositionController, SceneRenderer};
use std::fs;
use std::net::SocketAddr;
use tempfile::TempDir;
use tower_http::services::ServeDir;

const DISTRICTS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        { "type": "Feature", "properties": { "OBJECTID": 1, "NIMI": "Kesklinn" },
          "geometry": { "type": "Polygon", "coordinates": [[[26.70,58.37],[26.72,58.37],[26.72,58.38],[26.70,58.37]]] } },
        { "type": "Feature", "properties": { "OBJECTID": 9, "NIMI": "Karlova" },
          "geometry": { "type": "Polygon", "coordinates": [[[26.73,58.36],[26.75,58.36],[26.75,58.37],[26.73,58.36]]] } }
    ]
}"#;

const TOWERS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        { "type": "Feature", "properties": { "area": 120 },
          "geometry": { "type": "Point", "coordinates": [26.72, 58.38] } },
        { "type": "Feature", "properties": {},
          "geometry": { "type": "Point", "coordinates": [26.73, 58.37] } }
    ]
}"#;

/// Serves a temp directory of GeoJSON files over HTTP; missing files are 404.
async fn serve_fixtures(files: &[(&str, &str)]) -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    for (name, body) in files {
        fs::write(dir.path().join(name), body).unwrap();
    }

    let app = Router::new().nest_service("/geojson", ServeDir::new(dir.path()));
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (dir, format!("http://{addr}/geojson"))
}

fn config_for(base: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.overlays.districts.source = format!("{base}/districts.geojson");
    config.overlays.choropleth.source = format!("{base}/districts.geojson");
    config.overlays.heatmap.source = format!("{base}/celltowers.geojson");
    config.overlays.markers.source = format!("{base}/celltowers.geojson");
    config
}

#[tokio::test]
async fn two_feature_collection_renders_two_popups() {
    let (_dir, base) = serve_fixtures(&[("districts.geojson", DISTRICTS)]).await;
    let config = AppConfig::default();
    let fetcher = HttpFetcher::default();

    let layer = load_overlay(
        &fetcher,
        OverlayId::Districts,
        &format!("{base}/districts.geojson"),
        |d: &Dataset| DistrictsOverlay::build(d, &config.overlays.districts),
    )
    .await
    .expect("districts load");

    assert_eq!(layer.features.len(), 2);
    let popups: Vec<&str> = layer
        .features
        .iter()
        .filter_map(|f| f.popup.as_deref())
        .collect();
    assert_eq!(popups, vec!["Kesklinn", "Karlova"]);
}

#[tokio::test]
async fn http_404_does_not_block_sibling_loader() {
    let (_dir, base) = serve_fixtures(&[("districts.geojson", DISTRICTS)]).await;
    let fetcher = HttpFetcher::default();
    let missing_url = format!("{base}/nope.geojson");
    let present_url = format!("{base}/districts.geojson");

    let (missing, present) = tokio::join!(
        load_overlay(&fetcher, OverlayId::Heatmap, &missing_url, |d: &Dataset| d.len()),
        load_overlay(&fetcher, OverlayId::Districts, &present_url, |d: &Dataset| d.len()),
    );
    assert_eq!(missing, None);
    assert_eq!(present, Some(2));
}

#[tokio::test]
async fn full_composition_over_http() {
    let (_dir, base) = serve_fixtures(&[
        ("districts.geojson", DISTRICTS),
        ("celltowers.geojson", TOWERS),
    ])
    .await;

    let mut controller = MapCompositionController::new(config_for(&base), SceneRenderer::new());
    let report = controller.initialize(&HttpFetcher::default()).await.unwrap();
    assert_eq!(report.loaded, OverlayId::ALL.to_vec());
    assert!(report.failed.is_empty());

    match controller.overlay(OverlayId::Heatmap) {
        Some(OverlayLayer::Heatmap(heat)) => {
            let weights: Vec<f64> = heat.points.iter().map(|p| p.intensity).collect();
            assert_eq!(weights, vec![120.0, 1.0]);
        }
        other => panic!("unexpected heatmap layer: {other:?}"),
    }
    match controller.overlay(OverlayId::Markers) {
        Some(OverlayLayer::Markers(markers)) => {
            assert_eq!(
                markers.markers[1].popup.as_deref(),
                Some("Cell Tower<br>Area: Unknown")
            );
        }
        other => panic!("unexpected marker layer: {other:?}"),
    }

    controller
        .set_overlay_visible(OverlayId::Choropleth, true)
        .unwrap();
    controller
        .set_overlay_visible(OverlayId::Markers, true)
        .unwrap();
    assert!(controller.legend_attached());

    let scene = controller.into_renderer().into_scene();
    assert_eq!(scene.overlays.len(), 3);
    assert_eq!(scene.legends.len(), 1);
    assert_eq!(scene.legends[0].entries.last().unwrap().label, "10+");
    assert_eq!(scene.count(|c| *c == Command::AddLayerControl), 1);
}

#[tokio::test]
async fn missing_datasets_degrade_to_absent_overlays() {
    let (_dir, base) = serve_fixtures(&[("celltowers.geojson", "{ broken")]).await;

    let mut controller = MapCompositionController::new(config_for(&base), SceneRenderer::new());
    let report = controller.initialize(&HttpFetcher::default()).await.unwrap();
    assert!(report.loaded.is_empty());
    assert_eq!(report.failed.len(), 4);

    for id in OverlayId::ALL {
        assert_eq!(controller.overlay_state(id), OverlayState::Failed);
    }
    let scene = controller.renderer().scene();
    assert!(scene.layer_control.as_ref().unwrap().overlays.is_empty());
    assert_eq!(scene.base_layers.len(), 1);
}
