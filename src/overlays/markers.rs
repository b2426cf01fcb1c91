use super::{display_value, point_position};
use crate::config::MarkersConfig;
use crate::data::Dataset;
use crate::types::{LatLng, PathStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::f64::consts::PI;
use tracing::warn;

const TILE_SIZE: f64 = 256.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: LatLng,
    pub radius: f64,
    pub style: PathStyle,
    pub popup: Option<String>,
}

/// Markers that share a grid cell at some zoom level. A cluster of one is a
/// lone marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub center: LatLng,
    pub count: usize,
    pub members: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerClusterOverlay {
    pub markers: Vec<Marker>,
    pub max_cluster_radius: f64,
}

impl MarkerClusterOverlay {
    pub fn build(dataset: &Dataset, config: &MarkersConfig) -> Self {
        let mut markers = Vec::with_capacity(dataset.len());
        let mut skipped = 0usize;

        for feature in &dataset.features {
            let Some(position) = feature.geometry.as_ref().and_then(point_position) else {
                skipped += 1;
                continue;
            };
            let popup = feature.properties.as_ref().map(|_| {
                let value = display_value(feature.property(&config.popup_property))
                    .unwrap_or_else(|| "Unknown".to_string());
                format!("{}<br>{}: {}", config.popup_title, config.popup_label, value)
            });
            markers.push(Marker {
                position,
                radius: config.radius,
                style: config.style.clone(),
                popup,
            });
        }

        if skipped > 0 {
            warn!(source = %dataset.source, skipped, "marker layer ignores non-point features");
        }

        Self {
            markers,
            max_cluster_radius: config.max_cluster_radius,
        }
    }

    /// Groups markers into square cells of `max_cluster_radius` pixels in
    /// Web Mercator pixel space at `zoom`. Clusters come out in order of their
    /// first member.
    pub fn clusters_at(&self, zoom: u8) -> Vec<Cluster> {
        let cell = self.max_cluster_radius.max(1.0);
        let mut by_cell: HashMap<(i64, i64), usize> = HashMap::new();
        let mut clusters: Vec<Cluster> = Vec::new();

        for (i, marker) in self.markers.iter().enumerate() {
            let (px, py) = world_pixel(marker.position, zoom);
            let key = ((px / cell).floor() as i64, (py / cell).floor() as i64);
            match by_cell.get(&key) {
                Some(&slot) => {
                    let cluster = &mut clusters[slot];
                    cluster.members.push(i);
                    cluster.count += 1;
                }
                None => {
                    by_cell.insert(key, clusters.len());
                    clusters.push(Cluster {
                        center: marker.position,
                        count: 1,
                        members: vec![i],
                    });
                }
            }
        }

        for cluster in &mut clusters {
            let n = cluster.count as f64;
            let (lat, lng) = cluster.members.iter().fold((0.0, 0.0), |(lat, lng), &m| {
                let p = self.markers[m].position;
                (lat + p.lat, lng + p.lng)
            });
            cluster.center = LatLng::new(lat / n, lng / n);
        }

        clusters
    }
}

/// Global pixel coordinates of a position at `zoom` (256px tiles).
fn world_pixel(position: LatLng, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32) * TILE_SIZE;
    let x = (position.lng + 180.0) / 360.0 * n;
    let lat_rad = position.lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() / PI) / 2.0 * n;
    (x, y)
}
