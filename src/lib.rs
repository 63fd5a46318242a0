// src/lib.rs
pub mod error;
pub mod header;
pub mod logging;
pub mod pipeline;
pub mod projector;
pub mod timestamp;

pub use error::*;
pub use pipeline::*;

pub use header::{FieldLayout, HeaderKind, HeaderState, OutputIndex, Separators};
pub use projector::{ProjectedLine, RowProjector};
pub use timestamp::{TimeConversion, TimeZoneMode, DEFAULT_TIME_FORMAT, TIME_FORMAT_ENV};
