//! Spatial and temporal filtering of source archives.

use chrono::NaiveDate;

use crate::date::DateRange;
use crate::engine::CollectionExpr;
use crate::geometry::{BoundingBox, Region};

use super::SensorProfile;

/// Filter every archive of a sensor to the region and date window, then
/// merge them into one collection.
pub fn filter_archives(
    profile: &SensorProfile,
    region: &Region,
    dates: &DateRange,
) -> CollectionExpr {
    profile
        .extra_archives
        .iter()
        .fold(filter_archive(profile.archive, region, dates), |merged, archive| {
            merged.merge(filter_archive(archive, region, dates))
        })
}

pub fn filter_archive(archive: &str, region: &Region, dates: &DateRange) -> CollectionExpr {
    CollectionExpr::archive(archive)
        .filter_bounds(region.bounds())
        .filter_date(dates)
}

/// Whether a scene with this footprint and acquisition date survives
/// [`filter_archive`].
pub fn scene_matches(
    footprint: &BoundingBox,
    acquired: NaiveDate,
    region: &Region,
    dates: &DateRange,
) -> bool {
    footprint.intersects(&region.bounds()) && dates.contains(acquired)
}
