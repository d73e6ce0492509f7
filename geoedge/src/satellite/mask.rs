//! Per-sensor pixel validity rules and physical-unit scaling.
//!
//! Rules are plain data so they can travel inside an expression graph and be
//! evaluated by whichever engine materializes it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::SatelliteSource;

/// Landsat `QA_PIXEL` bit positions (0-based).
pub const DILATED_CLOUD_BIT: u8 = 1;
pub const CIRRUS_BIT: u8 = 2;
pub const CLOUD_BIT: u8 = 3;
pub const CLOUD_SHADOW_BIT: u8 = 4;

/// Sentinel-2 scene classification values treated as invalid.
pub const SCL_CLOUD_SHADOW: u16 = 3;
pub const SCL_CLOUD_MEDIUM_PROBABILITY: u16 = 8;
pub const SCL_THIN_CIRRUS: u16 = 10;

/// Inclusive range of classification values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRange {
    pub start: u16,
    pub end: u16,
}

impl ClassRange {
    pub const fn single(class: u16) -> Self {
        Self {
            start: class,
            end: class,
        }
    }

    pub const fn inclusive(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, class: u64) -> bool {
        u64::from(self.start) <= class && class <= u64::from(self.end)
    }
}

/// How the auxiliary band decides pixel validity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaskRule {
    /// Valid iff none of `bits` is set in the integer bitfield.
    QaBits {
        band: Cow<'static, str>,
        bits: Cow<'static, [u8]>,
    },
    /// Valid iff the class value falls in none of `classes`.
    ExcludeClasses {
        band: Cow<'static, str>,
        classes: Cow<'static, [ClassRange]>,
    },
}

impl MaskRule {
    /// Name of the auxiliary band the rule reads.
    pub fn band(&self) -> &str {
        match self {
            MaskRule::QaBits { band, .. } | MaskRule::ExcludeClasses { band, .. } => band,
        }
    }

    /// Whether a pixel with auxiliary value `value` is usable.
    ///
    /// Non-finite, negative or out-of-range values are never valid.
    pub fn is_valid(&self, value: f64) -> bool {
        let Some(raw) = as_unsigned(value) else {
            return false;
        };
        match self {
            MaskRule::QaBits { bits, .. } => bits
                .iter()
                .all(|bit| *bit >= 64 || raw & (1u64 << bit) == 0),
            MaskRule::ExcludeClasses { classes, .. } => {
                !classes.iter().any(|range| range.contains(raw))
            }
        }
    }
}

fn as_unsigned(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value <= u64::MAX as f64).then(|| value.trunc() as u64)
}

/// Conversion from digital counts to surface reflectance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaling {
    /// `raw * scale + offset`
    Affine { scale: f64, offset: f64 },
    /// `raw / divisor`
    Divide { divisor: f64 },
}

impl Scaling {
    pub fn apply(&self, raw: f64) -> f64 {
        match *self {
            Scaling::Affine { scale, offset } => raw * scale + offset,
            Scaling::Divide { divisor } => raw / divisor,
        }
    }

    /// Equivalent `(scale, offset)` pair.
    pub fn scale_offset(&self) -> (f64, f64) {
        match *self {
            Scaling::Affine { scale, offset } => (scale, offset),
            Scaling::Divide { divisor } => (1.0 / divisor, 0.0),
        }
    }
}

/// Element-wise cloud masking step for one sensor.
///
/// Reads [`MaskRule::band`], drops invalid pixels, keeps only the bands whose
/// names match `optical_bands`, and converts them with `scaling`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudMask {
    pub rule: MaskRule,
    pub optical_bands: Cow<'static, str>,
    pub scaling: Scaling,
}

impl CloudMask {
    pub fn for_source(source: SatelliteSource) -> Self {
        source.profile().cloud_mask.clone()
    }

    pub fn aux_band(&self) -> &str {
        self.rule.band()
    }

    pub fn is_valid(&self, aux_value: f64) -> bool {
        self.rule.is_valid(aux_value)
    }

    pub fn to_reflectance(&self, raw: f64) -> f64 {
        self.scaling.apply(raw)
    }

    /// Compiled band-name pattern selecting the optical bands.
    pub fn optical_matcher(&self) -> Result<Regex, regex::Error> {
        Regex::new(&self.optical_bands)
    }
}
