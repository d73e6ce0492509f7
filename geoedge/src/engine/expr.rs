//! Lazy raster expression graph.
//!
//! Building an expression never touches pixels. Only a [`RasterEngine`]
//! materializes one, through `reduce_percentiles` or `get_map`. Both node
//! types serialize to tagged JSON, which is the body the HTTP engine sends.
//!
//! [`RasterEngine`]: super::RasterEngine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::DateRange;
use crate::geometry::{BoundingBox, Geometry};
use crate::satellite::CloudMask;

/// A set of images, one per acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CollectionExpr {
    /// Every scene of a named archive.
    Archive { id: String },
    /// Scenes whose footprint intersects `bounds`.
    FilterBounds {
        input: Box<CollectionExpr>,
        bounds: BoundingBox,
    },
    /// Scenes acquired in `[start, end)`.
    FilterDate {
        input: Box<CollectionExpr>,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Union of two collections.
    Merge {
        left: Box<CollectionExpr>,
        right: Box<CollectionExpr>,
    },
    /// Keep `bands` in order, renamed to `rename`.
    Select {
        input: Box<CollectionExpr>,
        bands: Vec<String>,
        rename: Vec<String>,
    },
    /// Apply a per-image function.
    Map {
        input: Box<CollectionExpr>,
        function: ImageFunction,
    },
}

/// Per-image functions a collection can be mapped over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum ImageFunction {
    CloudMask(CloudMask),
}

/// Per-pixel reduction across a collection's time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Median,
}

/// A single multi-band image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ImageExpr {
    Reduce {
        collection: Box<CollectionExpr>,
        reducer: Reducer,
    },
    /// Mask every pixel outside `geometry`.
    Clip {
        input: Box<ImageExpr>,
        geometry: Geometry,
    },
    Select {
        input: Box<ImageExpr>,
        bands: Vec<String>,
    },
    Clamp {
        input: Box<ImageExpr>,
        low: f64,
        high: f64,
    },
    /// Linear map of `[low, high]` onto `[0, 1]`.
    UnitScale {
        input: Box<ImageExpr>,
        low: f64,
        high: f64,
    },
    /// Replace every unmasked value with `value`.
    Fill { input: Box<ImageExpr>, value: f64 },
    /// Concatenate the bands of several images.
    Stack { images: Vec<ImageExpr> },
}

impl CollectionExpr {
    pub fn archive(id: impl Into<String>) -> Self {
        CollectionExpr::Archive { id: id.into() }
    }

    pub fn filter_bounds(self, bounds: BoundingBox) -> Self {
        CollectionExpr::FilterBounds {
            input: Box::new(self),
            bounds,
        }
    }

    pub fn filter_date(self, range: &DateRange) -> Self {
        CollectionExpr::FilterDate {
            input: Box::new(self),
            start: range.start(),
            end: range.end(),
        }
    }

    pub fn merge(self, other: CollectionExpr) -> Self {
        CollectionExpr::Merge {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn select(self, bands: Vec<String>, rename: Vec<String>) -> Self {
        CollectionExpr::Select {
            input: Box::new(self),
            bands,
            rename,
        }
    }

    pub fn map(self, function: ImageFunction) -> Self {
        CollectionExpr::Map {
            input: Box::new(self),
            function,
        }
    }

    pub fn reduce(self, reducer: Reducer) -> ImageExpr {
        ImageExpr::Reduce {
            collection: Box::new(self),
            reducer,
        }
    }

    pub fn median(self) -> ImageExpr {
        self.reduce(Reducer::Median)
    }

    /// Archive identifiers this collection reads, left to right.
    pub fn archives(&self) -> Vec<&str> {
        match self {
            CollectionExpr::Archive { id } => vec![id.as_str()],
            CollectionExpr::Merge { left, right } => {
                let mut ids = left.archives();
                ids.extend(right.archives());
                ids
            }
            CollectionExpr::FilterBounds { input, .. }
            | CollectionExpr::FilterDate { input, .. }
            | CollectionExpr::Select { input, .. }
            | CollectionExpr::Map { input, .. } => input.archives(),
        }
    }
}

impl ImageExpr {
    pub fn clip(self, geometry: Geometry) -> Self {
        ImageExpr::Clip {
            input: Box::new(self),
            geometry,
        }
    }

    pub fn select<S: Into<String>>(self, bands: impl IntoIterator<Item = S>) -> Self {
        ImageExpr::Select {
            input: Box::new(self),
            bands: bands.into_iter().map(Into::into).collect(),
        }
    }

    pub fn clamp(self, low: f64, high: f64) -> Self {
        ImageExpr::Clamp {
            input: Box::new(self),
            low,
            high,
        }
    }

    pub fn unit_scale(self, low: f64, high: f64) -> Self {
        ImageExpr::UnitScale {
            input: Box::new(self),
            low,
            high,
        }
    }

    pub fn fill(self, value: f64) -> Self {
        ImageExpr::Fill {
            input: Box::new(self),
            value,
        }
    }

    pub fn stack(images: Vec<ImageExpr>) -> Self {
        ImageExpr::Stack { images }
    }
}
