//! `geoedge composite` - build a composite and print the response document.

use clap::Args;
use geoedge::service::{CompositeRequest, CompositeResponse, NameList, OneOrMany, VisualizationConfig};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the composite command.
///
/// Either `--request` or the full set of `--satellite`, `--start`, `--end`,
/// `--region` and `--bands` must be given.
#[derive(Debug, Args)]
pub struct CompositeArgs {
    /// JSON request document ({date, satellite, geojson, visualization})
    #[arg(long, conflicts_with_all = ["satellite", "start", "end", "region", "bands"])]
    pub request: Option<PathBuf>,

    /// Satellite source: landsat or sentinel2
    #[arg(long)]
    pub satellite: Option<String>,

    /// First acquisition date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub start: Option<String>,

    /// End of the date window (YYYY-MM-DD, exclusive)
    #[arg(long)]
    pub end: Option<String>,

    /// GeoJSON file with the region of interest
    #[arg(long)]
    pub region: Option<PathBuf>,

    /// Comma-separated bands, e.g. B4,B3,B2
    #[arg(long)]
    pub bands: Option<String>,

    /// Display minimum (one value, or one per band)
    #[arg(long, value_delimiter = ',')]
    pub min: Vec<f64>,

    /// Display maximum (one value, or one per band)
    #[arg(long, value_delimiter = ',')]
    pub max: Vec<f64>,

    /// Gamma correction (one value, or one per band)
    #[arg(long, value_delimiter = ',')]
    pub gamma: Vec<f64>,

    /// Comma-separated hex colors for single-band rendering
    #[arg(long)]
    pub palette: Option<String>,

    /// Layer opacity in [0, 1]
    #[arg(long)]
    pub opacity: Option<f64>,

    /// Engine base URL, overriding the [engine] url setting
    #[arg(long)]
    pub engine_url: Option<String>,
}

/// Run the composite command.
///
/// The response document is printed to stdout in every case; a failed
/// composite also exits non-zero.
pub fn run(args: CompositeArgs, config_path: Option<&Path>, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, debug)?;
    runner.log_startup("composite");

    let request = build_request(&args)?;
    let service = runner.create_service(args.engine_url.as_deref())?;
    let engine_url = args.engine_url.as_deref().unwrap_or(&runner.config().engine.url);
    info!(engine = engine_url, satellite = %request.satellite, "Submitting composite request");

    let runtime = tokio::runtime::Runtime::new().map_err(|e| CliError::Runtime(e.to_string()))?;
    let result = runtime
        .block_on(service.run(&request))
        .map(|output| output.tile);

    match &result {
        Ok(tile) => info!(map_id = %tile.map_id, "Composite rendered"),
        Err(e) => warn!(kind = e.kind(), retryable = e.is_retryable(), error = %e, "Composite failed"),
    }
    let response = CompositeResponse::from(result.clone().map(|tile| tile.url_template));
    print_response(&response)?;

    result.map(|_| ()).map_err(CliError::from)
}

fn print_response(response: &CompositeResponse) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| CliError::InvalidRequest(format!("cannot encode response: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Assemble the request from `--request` or from the individual flags.
fn build_request(args: &CompositeArgs) -> Result<CompositeRequest, CliError> {
    if let Some(path) = &args.request {
        let text = read_file(path)?;
        return serde_json::from_str(&text).map_err(|e| {
            CliError::InvalidRequest(format!("{} is not a valid request: {}", path.display(), e))
        });
    }

    let satellite = required(&args.satellite, "--satellite")?;
    let start = required(&args.start, "--start")?;
    let end = required(&args.end, "--end")?;
    let bands = required(&args.bands, "--bands")?;
    let region_path = args
        .region
        .as_ref()
        .ok_or_else(|| CliError::InvalidRequest("--region is required without --request".to_string()))?;

    let geojson = serde_json::from_str(&read_file(region_path)?).map_err(|e| {
        CliError::InvalidRequest(format!("{} is not valid JSON: {}", region_path.display(), e))
    })?;

    Ok(CompositeRequest {
        date: vec![start.to_string(), end.to_string()],
        satellite: satellite.to_string(),
        geojson,
        visualization: VisualizationConfig {
            bands: NameList::Joined(bands.to_string()),
            min: one_or_many(&args.min),
            max: one_or_many(&args.max),
            gamma: one_or_many(&args.gamma),
            palette: args.palette.clone().map(NameList::Joined),
            opacity: args.opacity,
        },
    })
}

fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str, CliError> {
    value
        .as_deref()
        .ok_or_else(|| CliError::InvalidRequest(format!("{} is required without --request", flag)))
}

fn one_or_many(values: &[f64]) -> Option<OneOrMany> {
    match values {
        [] => None,
        [one] => Some(OneOrMany::One(*one)),
        many => Some(OneOrMany::Many(many.to_vec())),
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: path.display().to_string(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args() -> CompositeArgs {
        CompositeArgs {
            request: None,
            satellite: None,
            start: None,
            end: None,
            region: None,
            bands: None,
            min: Vec::new(),
            max: Vec::new(),
            gamma: Vec::new(),
            palette: None,
            opacity: None,
            engine_url: None,
        }
    }

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_request_from_flags() {
        let region = write_temp(r#"{"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}"#);
        let args = CompositeArgs {
            satellite: Some("landsat".to_string()),
            start: Some("2021-01-01".to_string()),
            end: Some("2021-06-01".to_string()),
            region: Some(region.path().to_path_buf()),
            bands: Some("B4,B3,B2".to_string()),
            max: vec![0.9],
            gamma: vec![1.0, 1.1, 1.2],
            ..args()
        };

        let request = build_request(&args).unwrap();
        assert_eq!(request.date, vec!["2021-01-01", "2021-06-01"]);
        assert_eq!(request.geojson["type"], "Polygon");
        assert_eq!(request.visualization.band_names(), vec!["B4", "B3", "B2"]);
        assert_eq!(request.visualization.min, None);
        assert_eq!(request.visualization.max, Some(OneOrMany::One(0.9)));
        assert_eq!(
            request.visualization.gamma,
            Some(OneOrMany::Many(vec![1.0, 1.1, 1.2]))
        );
    }

    #[test]
    fn test_request_from_file() {
        let file = write_temp(
            r#"{"date": ["2022-05-01", "2022-09-01"], "satellite": "sentinel2",
                "geojson": {"type": "Polygon", "coordinates": []},
                "visualization": {"bands": ["B8", "B4", "B3"], "min": 0, "max": 0.4}}"#,
        );
        let args = CompositeArgs {
            request: Some(file.path().to_path_buf()),
            ..args()
        };

        let request = build_request(&args).unwrap();
        assert_eq!(request.satellite, "sentinel2");
        assert_eq!(request.visualization.max, Some(OneOrMany::One(0.4)));
    }

    #[test]
    fn test_missing_flag_is_reported() {
        let args = CompositeArgs {
            satellite: Some("landsat".to_string()),
            ..args()
        };
        let err = build_request(&args).unwrap_err();
        assert!(err.to_string().contains("--start"));
    }

    #[test]
    fn test_unreadable_region_file() {
        let args = CompositeArgs {
            satellite: Some("landsat".to_string()),
            start: Some("2021-01-01".to_string()),
            end: Some("2021-06-01".to_string()),
            bands: Some("B4".to_string()),
            region: Some(PathBuf::from("/nonexistent/region.geojson")),
            ..args()
        };
        assert!(matches!(build_request(&args).unwrap_err(), CliError::FileRead { .. }));
    }
}
