pub mod config;
pub mod context;
pub mod stream;

pub use config::{ColumnSelector, CutConfig, ErrorStrategy, HeaderVisibility};
pub use context::{BlockState, ProcessingStats, RunState};
pub use stream::CutPipeline;
