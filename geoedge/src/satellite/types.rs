//! Supported sensors and their static acquisition profiles.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::mask::{
    ClassRange, CloudMask, MaskRule, Scaling, CIRRUS_BIT, CLOUD_BIT, CLOUD_SHADOW_BIT,
    DILATED_CLOUD_BIT, SCL_CLOUD_MEDIUM_PROBABILITY, SCL_CLOUD_SHADOW, SCL_THIN_CIRRUS,
};

/// Satellite family a composite is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SatelliteSource {
    Landsat,
    Sentinel2,
}

/// The requested satellite name is not one of the supported sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Satellite '{0}' is not supported (expected 'landsat' or 'sentinel2')")]
pub struct UnsupportedSatellite(pub String);

impl SatelliteSource {
    pub const ALL: [SatelliteSource; 2] = [SatelliteSource::Landsat, SatelliteSource::Sentinel2];

    pub fn name(&self) -> &'static str {
        match self {
            SatelliteSource::Landsat => "landsat",
            SatelliteSource::Sentinel2 => "sentinel2",
        }
    }

    pub fn profile(&self) -> &'static SensorProfile {
        match self {
            SatelliteSource::Landsat => &LANDSAT,
            SatelliteSource::Sentinel2 => &SENTINEL2,
        }
    }
}

impl FromStr for SatelliteSource {
    type Err = UnsupportedSatellite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        SatelliteSource::ALL
            .into_iter()
            .find(|source| source.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnsupportedSatellite(s.to_string()))
    }
}

impl fmt::Display for SatelliteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the pipeline needs to know about one sensor family.
#[derive(Debug)]
pub struct SensorProfile {
    /// Primary archive identifier.
    pub archive: &'static str,
    /// Further archives merged after the primary one.
    pub extra_archives: &'static [&'static str],
    /// Prefix of the stored optical band names (`SR_B4` for `B4`).
    pub storage_prefix: &'static str,
    /// Logical optical band names a request may ask for.
    pub bands: &'static [&'static str],
    pub cloud_mask: CloudMask,
}

impl SensorProfile {
    /// All archive identifiers, primary first.
    pub fn archives(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.archive).chain(self.extra_archives.iter().copied())
    }

    pub fn supports_band(&self, band: &str) -> bool {
        self.bands.contains(&band)
    }

    pub fn storage_name(&self, band: &str) -> String {
        format!("{}{}", self.storage_prefix, band)
    }
}

const OPTICAL_BANDS: &str = "^B.*";

pub static LANDSAT: SensorProfile = SensorProfile {
    archive: "LANDSAT/LC08/C02/T1_L2",
    extra_archives: &["LANDSAT/LC09/C02/T1_L2"],
    storage_prefix: "SR_",
    bands: &["B1", "B2", "B3", "B4", "B5", "B6", "B7"],
    cloud_mask: CloudMask {
        rule: MaskRule::QaBits {
            band: Cow::Borrowed("QA_PIXEL"),
            bits: Cow::Borrowed(&[DILATED_CLOUD_BIT, CIRRUS_BIT, CLOUD_BIT, CLOUD_SHADOW_BIT]),
        },
        optical_bands: Cow::Borrowed(OPTICAL_BANDS),
        scaling: Scaling::Affine {
            scale: 0.0000275,
            offset: -0.2,
        },
    },
};

pub static SENTINEL2: SensorProfile = SensorProfile {
    archive: "COPERNICUS/S2_SR_HARMONIZED",
    extra_archives: &[],
    storage_prefix: "",
    bands: &[
        "B1", "B2", "B3", "B4", "B5", "B6", "B7", "B8", "B8A", "B9", "B11", "B12",
    ],
    cloud_mask: CloudMask {
        rule: MaskRule::ExcludeClasses {
            band: Cow::Borrowed("SCL"),
            classes: Cow::Borrowed(&[
                ClassRange::single(SCL_CLOUD_SHADOW),
                ClassRange::inclusive(SCL_CLOUD_MEDIUM_PROBABILITY, SCL_THIN_CIRRUS),
            ]),
        },
        optical_bands: Cow::Borrowed(OPTICAL_BANDS),
        scaling: Scaling::Divide { divisor: 10_000.0 },
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("landsat".parse::<SatelliteSource>().unwrap(), SatelliteSource::Landsat);
        assert_eq!("Sentinel2".parse::<SatelliteSource>().unwrap(), SatelliteSource::Sentinel2);
        assert_eq!(" LANDSAT ".parse::<SatelliteSource>().unwrap(), SatelliteSource::Landsat);
    }

    #[test]
    fn test_unknown_satellite_is_rejected() {
        let err = "modis".parse::<SatelliteSource>().unwrap_err();
        assert_eq!(err, UnsupportedSatellite("modis".to_string()));
        assert!(err.to_string().contains("modis"));
        assert!("sentinel-2".parse::<SatelliteSource>().is_err());
        assert!("".parse::<SatelliteSource>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for source in SatelliteSource::ALL {
            assert_eq!(source.to_string().parse::<SatelliteSource>().unwrap(), source);
        }
    }

    #[test]
    fn test_landsat_profile() {
        let profile = SatelliteSource::Landsat.profile();
        assert_eq!(
            profile.archives().collect::<Vec<_>>(),
            vec!["LANDSAT/LC08/C02/T1_L2", "LANDSAT/LC09/C02/T1_L2"]
        );
        assert_eq!(profile.storage_name("B4"), "SR_B4");
        assert_eq!(profile.cloud_mask.aux_band(), "QA_PIXEL");
        assert!(profile.supports_band("B7"));
        assert!(!profile.supports_band("B8"));
    }

    #[test]
    fn test_sentinel2_profile() {
        let profile = SatelliteSource::Sentinel2.profile();
        assert_eq!(profile.archives().count(), 1);
        assert_eq!(profile.storage_name("B8A"), "B8A");
        assert_eq!(profile.cloud_mask.aux_band(), "SCL");
        assert!(profile.supports_band("B12"));
        assert!(!profile.supports_band("B10"));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_string(&SatelliteSource::Sentinel2).unwrap(),
            "\"sentinel2\""
        );
    }
}
