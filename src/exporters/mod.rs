//! Exporter implementations

pub mod background;
pub mod json_lines;
pub mod memory;

#[cfg(feature = "file")]
pub mod file;

pub use background::{BackgroundExporter, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT};
pub use json_lines::JsonLinesExporter;
pub use memory::{MemoryExporter, MemoryHandle};

#[cfg(feature = "file")]
pub use file::{JsonFileExporter, RotationPolicy};

pub use crate::core::Exporter;
