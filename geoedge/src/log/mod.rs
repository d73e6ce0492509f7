//! Logging abstraction layer.
//!
//! Pipeline components log through the [`Logger`] trait instead of calling
//! `tracing` directly, so a composite run can be observed (or silenced) by
//! whoever constructs it.
//!
//! - [`TracingLogger`]: forwards to the `tracing` crate (production)
//! - [`NoOpLogger`]: discards everything
//! - [`MemoryLogger`]: keeps records in memory for assertions in tests
//!
//! ```
//! use geoedge::log::{Logger, NoOpLogger};
//! use geoedge::log_info;
//! use std::sync::Arc;
//!
//! let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
//! log_info!(logger, "compositing {} bands", 3);
//! ```

mod adapters;
mod logger;

pub use adapters::{MemoryLogger, NoOpLogger, TracingLogger};
pub use logger::{LogLevel, Logger};
