use crate::error::LoadError;
use crate::types::OverlayId;
use async_trait::async_trait;
use geojson::{Feature, GeoJson};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Where a dataset comes from. HTTP(S) URLs are fetched; anything else is a
/// local GeoJSON file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Http(String),
    File(PathBuf),
}

impl DatasetSource {
    pub fn parse(location: &str) -> Result<Self, LoadError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(DatasetSource::Http(location.to_string()));
        }

        let path = PathBuf::from(location.strip_prefix("file://").unwrap_or(location));
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .ok_or_else(|| LoadError::UnsupportedFormat(location.to_string()))?;

        match extension.as_str() {
            "json" | "geojson" => Ok(DatasetSource::File(path)),
            _ => Err(LoadError::UnsupportedFormat(extension)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DatasetSource::Http(url) => url.clone(),
            DatasetSource::File(path) => path.display().to_string(),
        }
    }
}

/// Retrieves the raw bytes behind a [`DatasetSource`].
#[async_trait]
pub trait DatasetFetcher: Send + Sync {
    async fn fetch(&self, source: &DatasetSource) -> Result<Vec<u8>, LoadError>;
}

/// Default fetcher: reqwest for HTTP, tokio::fs for local files.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let request_error = |source: reqwest::Error| LoadError::Request {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        Ok(body.to_vec())
    }

    async fn fetch_file(&self, path: &Path) -> Result<Vec<u8>, LoadError> {
        tokio::fs::read(path).await.map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

#[async_trait]
impl DatasetFetcher for HttpFetcher {
    async fn fetch(&self, source: &DatasetSource) -> Result<Vec<u8>, LoadError> {
        match source {
            DatasetSource::Http(url) => self.fetch_url(url).await,
            DatasetSource::File(path) => self.fetch_file(path).await,
        }
    }
}

/// Features of one GeoJSON FeatureCollection, in document order.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: String,
    pub features: Vec<Feature>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

pub fn parse_dataset(source_name: &str, bytes: &[u8]) -> Result<Dataset, LoadError> {
    let geojson = GeoJson::from_reader(bytes).map_err(|source| LoadError::Json {
        source_name: source_name.to_string(),
        source,
    })?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(LoadError::NotFeatureCollection(source_name.to_string())),
    };

    Ok(Dataset {
        source: source_name.to_string(),
        features: collection.features,
    })
}

pub async fn load_dataset(
    fetcher: &dyn DatasetFetcher,
    source: &DatasetSource,
) -> Result<Dataset, LoadError> {
    let name = source.describe();
    debug!(source = %name, "fetching dataset");
    let bytes = fetcher.fetch(source).await?;
    let dataset = parse_dataset(&name, &bytes)?;
    info!(source = %name, features = dataset.len(), "dataset loaded");
    Ok(dataset)
}

/// Loads `location` and hands the dataset to `build`. Any failure is logged
/// and turns into `None`; it never reaches the caller as an error.
pub async fn load_overlay<T, F>(
    fetcher: &dyn DatasetFetcher,
    overlay: OverlayId,
    location: &str,
    build: F,
) -> Option<T>
where
    F: FnOnce(&Dataset) -> T,
{
    let result = match DatasetSource::parse(location) {
        Ok(source) => load_dataset(fetcher, &source).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(dataset) => Some(build(&dataset)),
        Err(e) => {
            error!(%overlay, source = location, kind = ?e.kind(), "error loading overlay: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::collections::HashMap;
    use std::io::Write;

    const TWO_DISTRICTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "OBJECTID": 1, "NIMI": "Kesklinn" },
              "geometry": { "type": "Polygon", "coordinates": [[[26.7,58.37],[26.72,58.37],[26.72,58.38],[26.7,58.37]]] } },
            { "type": "Feature", "properties": { "OBJECTID": 2, "NIMI": "Karlova" },
              "geometry": { "type": "Polygon", "coordinates": [[[26.73,58.36],[26.75,58.36],[26.75,58.37],[26.73,58.36]]] } }
        ]
    }"#;

    /// Serves canned bodies by location; unknown locations answer 404.
    struct StaticFetcher(HashMap<String, String>);

    #[async_trait]
    impl DatasetFetcher for StaticFetcher {
        async fn fetch(&self, source: &DatasetSource) -> Result<Vec<u8>, LoadError> {
            let key = source.describe();
            self.0
                .get(&key)
                .map(|body| body.clone().into_bytes())
                .ok_or(LoadError::Status { url: key, status: 404 })
        }
    }

    #[test]
    fn parses_sources() {
        assert_eq!(
            DatasetSource::parse("https://example.org/a.geojson").unwrap(),
            DatasetSource::Http("https://example.org/a.geojson".into())
        );
        assert_eq!(
            DatasetSource::parse("file:///data/a.json").unwrap(),
            DatasetSource::File(PathBuf::from("/data/a.json"))
        );
        assert_eq!(
            DatasetSource::parse("geojson/districts.GeoJSON").unwrap(),
            DatasetSource::File(PathBuf::from("geojson/districts.GeoJSON"))
        );
        assert!(matches!(
            DatasetSource::parse("districts.shp"),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            DatasetSource::parse("districts"),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn parses_feature_collection() {
        let dataset = parse_dataset("districts", TWO_DISTRICTS.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.features[1].property("NIMI").and_then(|v| v.as_str()),
            Some("Karlova")
        );
    }

    #[test]
    fn rejects_malformed_and_non_collections() {
        let err = parse_dataset("bad", b"{ not json").unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
        assert_eq!(err.kind(), FailureKind::Parse);

        let point = r#"{ "type": "Point", "coordinates": [26.7, 58.3] }"#;
        let err = parse_dataset("point", point.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::NotFeatureCollection(_)));
    }

    #[tokio::test]
    async fn reads_local_files() {
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        file.write_all(TWO_DISTRICTS.as_bytes()).unwrap();
        let location = file.path().to_str().unwrap().to_string();

        let source = DatasetSource::parse(&location).unwrap();
        let dataset = load_dataset(&HttpFetcher::default(), &source).await.unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_network_failure() {
        let source = DatasetSource::File(PathBuf::from("/nonexistent/districts.geojson"));
        let err = load_dataset(&HttpFetcher::default(), &source).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Network);
    }

    #[tokio::test]
    async fn failed_overlay_does_not_stop_sibling() {
        let fetcher = StaticFetcher(HashMap::from([(
            "https://example.org/ok.geojson".to_string(),
            TWO_DISTRICTS.to_string(),
        )]));

        let (missing, present) = tokio::join!(
            load_overlay(
                &fetcher,
                OverlayId::Heatmap,
                "https://example.org/missing.geojson",
                |d: &Dataset| d.len()
            ),
            load_overlay(
                &fetcher,
                OverlayId::Districts,
                "https://example.org/ok.geojson",
                |d: &Dataset| d.len()
            ),
        );
        assert_eq!(missing, None);
        assert_eq!(present, Some(2));
    }

    #[tokio::test]
    async fn unsupported_location_yields_none() {
        let fetcher = StaticFetcher(HashMap::new());
        let result = load_overlay(&fetcher, OverlayId::Markers, "towers.csv", |d: &Dataset| {
            d.len()
        })
        .await;
        assert_eq!(result, None);
    }

    #[test]
    fn empty_collection_is_valid() {
        let dataset =
            parse_dataset("empty", br#"{ "type": "FeatureCollection", "features": [] }"#).unwrap();
        assert!(dataset.is_empty());
    }
}
