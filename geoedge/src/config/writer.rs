//! `ConfigFile` → commented INI, as written by `save_to` and shown by the CLI.

use super::settings::ConfigFile;

pub fn to_config_string(config: &ConfigFile) -> String {
    let access_token = config.engine.access_token.as_deref().unwrap_or("");

    format!(
        r#"[engine]
; Base URL of the raster computation service
url = {}
; Bearer token issued by the session bootstrap (may also come from
; the GEOEDGE_ACCESS_TOKEN environment variable)
access_token = {}
; Deadline in seconds for each percentile reduction / tile request (default: 120)
timeout = {}

[region]
; Error margin in meters used when bounding the region for filtering (default: 10000)
error_margin = {}

[stretch]
; Percentiles mapped to 0 and 1 in the rendered composite (default: 2 / 98)
low_percentile = {}
high_percentile = {}
; Sampling resolution for percentile statistics in meters per pixel (default: 30)
scale = {}
; Maximum number of pixels a single reduction may consider (default: 1e13)
max_pixels = {}

[logging]
; Session log file, truncated at startup
file = {}
"#,
        config.engine.url,
        access_token,
        config.engine.timeout,
        config.region.error_margin,
        config.stretch.low_percentile,
        config.stretch.high_percentile,
        config.stretch.scale,
        config.stretch.max_pixels,
        config.logging.file.to_string_lossy(),
    )
}
