//! Sensor families and the masked image collections built from them.
//!
//! Each [`SatelliteSource`] has a static [`SensorProfile`]: which archives to
//! read, how logical band names map to stored ones, which auxiliary band
//! flags clouds, and how raw counts become reflectance.

mod bands;
mod builder;
mod filter;
mod mask;
mod types;

pub use bands::{resolve_bands, BandSet, BandSetError, ResolvedBands, UnsupportedBand};
pub use builder::CompositeBuilder;
pub use filter::{filter_archive, filter_archives, scene_matches};
pub use mask::{
    ClassRange, CloudMask, MaskRule, Scaling, CIRRUS_BIT, CLOUD_BIT, CLOUD_SHADOW_BIT,
    DILATED_CLOUD_BIT, SCL_CLOUD_MEDIUM_PROBABILITY, SCL_CLOUD_SHADOW, SCL_THIN_CIRRUS,
};
pub use types::{SatelliteSource, SensorProfile, UnsupportedSatellite, LANDSAT, SENTINEL2};
