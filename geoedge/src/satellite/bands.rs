//! Requested band sets and their mapping onto stored band names.

use thiserror::Error;

use super::mask::Scaling;
use super::SatelliteSource;

/// Problems with the requested band list itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BandSetError {
    #[error("At least one band must be requested")]
    Empty,

    #[error("Band names must not be blank")]
    Blank,
}

/// A requested band is not offered by the chosen sensor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Band '{band}' is not available for {satellite}")]
pub struct UnsupportedBand {
    pub band: String,
    pub satellite: SatelliteSource,
}

/// Ordered, de-duplicated, non-empty list of logical band names.
///
/// Names are upper-cased, so `b4` and `B4` refer to the same band. The first
/// occurrence fixes the position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSet(Vec<String>);

impl BandSet {
    pub fn new<I, S>(bands: I) -> Result<Self, BandSetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for band in bands {
            let name = band.as_ref().trim().to_ascii_uppercase();
            if name.is_empty() {
                return Err(BandSetError::Blank);
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }
        if names.is_empty() {
            return Err(BandSetError::Empty);
        }
        Ok(Self(names))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of [`resolve_bands`].
///
/// `storage[i]` is renamed to `renamed[i]`; the auxiliary band is last in both.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBands {
    pub storage: Vec<String>,
    pub renamed: Vec<String>,
    pub auxiliary: String,
    pub scaling: Scaling,
}

impl ResolvedBands {
    /// Logical optical bands, without the auxiliary band.
    pub fn optical(&self) -> &[String] {
        &self.renamed[..self.renamed.len() - 1]
    }
}

/// Map logical band names onto a sensor's stored names.
///
/// The first unsupported band, in request order, is reported.
pub fn resolve_bands(
    source: SatelliteSource,
    bands: &BandSet,
) -> Result<ResolvedBands, UnsupportedBand> {
    let profile = source.profile();
    let auxiliary = profile.cloud_mask.aux_band().to_string();

    let mut storage = Vec::with_capacity(bands.len() + 1);
    let mut renamed = Vec::with_capacity(bands.len() + 1);
    for band in bands.iter() {
        if !profile.supports_band(band) {
            return Err(UnsupportedBand {
                band: band.to_string(),
                satellite: source,
            });
        }
        storage.push(profile.storage_name(band));
        renamed.push(band.to_string());
    }
    storage.push(auxiliary.clone());
    renamed.push(auxiliary.clone());

    Ok(ResolvedBands {
        storage,
        renamed,
        auxiliary,
        scaling: profile.cloud_mask.scaling,
    })
}
