//! Temporal reduction of a masked collection into one composite image.

use crate::engine::{CollectionExpr, ImageExpr};
use crate::geometry::Region;

/// Per-pixel, per-band median across the collection, clipped to the
/// region polygon.
///
/// Masked pixels do not contribute. A pixel masked in every image has no
/// data in the result, as does every pixel whose center lies outside the
/// region.
pub fn temporal_median(collection: CollectionExpr, region: &Region) -> ImageExpr {
    collection.median().clip(region.geometry().clone())
}
