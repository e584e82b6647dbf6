pub mod config;
pub mod invoke;
pub mod main;
pub mod merge;
pub mod validate;
pub use config::{ConfigError, PipelineConfig, ToolStep};
pub use invoke::{ExternalPipeline, ExternalToolError, Step};
pub use main::{PrepareCommand, PrepareError};
pub use merge::{MergeSummary, merge_files, merge_records};
pub use validate::{ValidationError, check_inputs};
