//! Assembles the masked, per-sensor image collection for a request.

use crate::date::DateRange;
use crate::engine::{CollectionExpr, ImageFunction};
use crate::geometry::Region;

use super::bands::{resolve_bands, BandSet, UnsupportedBand};
use super::filter::filter_archives;
use super::mask::CloudMask;
use super::SatelliteSource;

/// Builds the cloud-masked collection for one sensor.
///
/// The result is a lazy expression: filter every archive, merge, select and
/// rename bands (auxiliary band last), then map the sensor's cloud mask.
/// Each image of the result holds exactly the requested bands, in request
/// order, in reflectance units.
#[derive(Debug, Clone, Copy)]
pub struct CompositeBuilder {
    source: SatelliteSource,
}

impl CompositeBuilder {
    pub fn new(source: SatelliteSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> SatelliteSource {
        self.source
    }

    pub fn build(
        &self,
        region: &Region,
        dates: &DateRange,
        bands: &BandSet,
    ) -> Result<CollectionExpr, UnsupportedBand> {
        let resolved = resolve_bands(self.source, bands)?;
        let merged = filter_archives(self.source.profile(), region, dates);

        Ok(merged
            .select(resolved.storage, resolved.renamed)
            .map(ImageFunction::CloudMask(CloudMask::for_source(self.source))))
    }
}
