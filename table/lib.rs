#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(unused_variables)]

pub mod flatten;
pub mod pipeline;
pub mod progress;
pub mod resolve;
pub mod types;
pub mod update;
pub mod writer;
#[path = "../shared/files.rs"]
pub mod shared_files;
pub mod shared {
    pub use super::shared_files as files;
}

#[path = "../prepare/mod.rs"]
pub mod prepare;

pub use pipeline::{ExtractOptions, TableError, extract_annotations};
pub use resolve::GeneResolver;
pub use types::{Cell, OutputRow, Table};
