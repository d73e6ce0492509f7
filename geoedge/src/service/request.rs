//! Request and response documents.

use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::visualization::VisualizationConfig;

/// Status reported with a successful response.
pub const STATUS_OK: u16 = 200;
/// Status reported with any failure.
pub const STATUS_NOT_FOUND: u16 = 404;

/// A composite request as received from a caller.
///
/// ```
/// use geoedge::service::CompositeRequest;
///
/// let request: CompositeRequest = serde_json::from_str(r#"{
///     "date": ["2021-01-01", "2021-06-01"],
///     "satellite": "landsat",
///     "geojson": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]},
///     "visualization": {"bands": ["B4", "B3", "B2"]}
/// }"#).unwrap();
/// assert_eq!(request.satellite, "landsat");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRequest {
    /// `[start, end]` dates.
    #[serde(alias = "dateRange")]
    pub date: Vec<String>,
    pub satellite: String,
    /// GeoJSON Feature, FeatureCollection, Polygon or MultiPolygon.
    #[serde(alias = "region")]
    pub geojson: serde_json::Value,
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

/// The response document: a tile URL template or an error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeResponse {
    Tile(String),
    Error(String),
}

impl CompositeResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            CompositeResponse::Tile(_) => STATUS_OK,
            CompositeResponse::Error(_) => STATUS_NOT_FOUND,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CompositeResponse::Tile(_))
    }
}

impl From<Result<String, PipelineError>> for CompositeResponse {
    fn from(result: Result<String, PipelineError>) -> Self {
        match result {
            Ok(url) => CompositeResponse::Tile(url),
            Err(e) => CompositeResponse::Error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_aliases_are_accepted() {
        let request: CompositeRequest = serde_json::from_value(json!({
            "dateRange": ["2021-01-01", "2021-06-01"],
            "satellite": "sentinel2",
            "region": {"type": "Polygon", "coordinates": []},
            "visualization": {"bands": "B8,B4,B3"}
        }))
        .unwrap();
        assert_eq!(request.date, vec!["2021-01-01", "2021-06-01"]);
        assert_eq!(request.geojson["type"], "Polygon");
        assert_eq!(request.visualization.band_names(), vec!["B8", "B4", "B3"]);
    }

    #[test]
    fn test_response_documents() {
        let ok = CompositeResponse::Tile("https://t/{z}/{x}/{y}".to_string());
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"tile": "https://t/{z}/{x}/{y}"}));
        assert_eq!(ok.status_code(), 200);

        let err = CompositeResponse::from(Err::<String, _>(PipelineError::InvalidRequest(
            "no bands".to_string(),
        )));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"error": "Invalid request: no bands"})
        );
        assert_eq!(err.status_code(), 404);
        assert!(!err.is_success());
    }
}
