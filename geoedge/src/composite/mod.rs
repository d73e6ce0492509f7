//! Composite construction: temporal median, then percentile stretch.

mod reducer;
mod stretch;

pub use reducer::temporal_median;
pub use stretch::{BandStretch, StretchConfig, StretchEngine, StretchError, StretchParams};
