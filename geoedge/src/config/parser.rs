//! INI → `ConfigFile`.
//!
//! Starts from defaults and overlays every key present in the file.

use ini::{Ini, Properties};
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("engine")) {
        if let Some(v) = non_empty(section, "url") {
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid("engine", "url", v, "must start with http:// or https://"));
            }
            config.engine.url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty(section, "access_token") {
            config.engine.access_token = Some(v.to_string());
        }
        if let Some(v) = section.get("timeout") {
            config.engine.timeout = parse_positive_u64(v)
                .ok_or_else(|| invalid("engine", "timeout", v, "must be a positive integer (seconds)"))?;
        }
    }

    if let Some(section) = ini.section(Some("region")) {
        if let Some(v) = section.get("error_margin") {
            config.region.error_margin = parse_positive_f64(v)
                .ok_or_else(|| invalid("region", "error_margin", v, "must be a positive number (meters)"))?;
        }
    }

    if let Some(section) = ini.section(Some("stretch")) {
        if let Some(v) = section.get("low_percentile") {
            config.stretch.low_percentile = parse_percentile(v)
                .ok_or_else(|| invalid("stretch", "low_percentile", v, "must be an integer between 0 and 100"))?;
        }
        if let Some(v) = section.get("high_percentile") {
            config.stretch.high_percentile = parse_percentile(v)
                .ok_or_else(|| invalid("stretch", "high_percentile", v, "must be an integer between 0 and 100"))?;
        }
        if config.stretch.low_percentile >= config.stretch.high_percentile {
            return Err(invalid(
                "stretch",
                "high_percentile",
                &config.stretch.high_percentile.to_string(),
                "must be greater than low_percentile",
            ));
        }
        if let Some(v) = section.get("scale") {
            config.stretch.scale = parse_positive_f64(v)
                .ok_or_else(|| invalid("stretch", "scale", v, "must be a positive number (meters per pixel)"))?;
        }
        if let Some(v) = section.get("max_pixels") {
            config.stretch.max_pixels = parse_pixel_budget(v)
                .ok_or_else(|| invalid("stretch", "max_pixels", v, "must be a positive number such as 1e13"))?;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_positive_u64(v: &str) -> Option<u64> {
    v.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

fn parse_positive_f64(v: &str) -> Option<f64> {
    v.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
}

fn parse_percentile(v: &str) -> Option<u8> {
    v.trim().parse::<u8>().ok().filter(|p| *p <= 100)
}

/// Accepts plain integers as well as scientific notation (`1e13`).
fn parse_pixel_budget(v: &str) -> Option<u64> {
    let v = v.trim();
    if let Ok(n) = v.parse::<u64>() {
        return (n > 0).then_some(n);
    }
    parse_positive_f64(v)
        .filter(|n| *n >= 1.0 && *n <= u64::MAX as f64)
        .map(|n| n as u64)
}

/// Expand a leading `~` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
