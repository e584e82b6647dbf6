use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use super::config::{ConfigError, PipelineConfig};
use super::invoke::{ExternalPipeline, ExternalToolError};
use super::merge::{MergeSummary, merge_files};
use super::validate::{ValidationError, check_inputs};
use crate::shared::files::VcfError;

/// Everything the prepare pipeline needs for one run.
#[derive(Debug, Clone)]
pub struct PrepareCommand {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub config: PipelineConfig,
}

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Vcf(#[from] VcfError),
    #[error(transparent)]
    ExternalTool(#[from] ExternalToolError),
    #[error("could not create working directory {path}: {source}")]
    WorkDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Validate, merge, rename, annotate. Any failure stops the run at that stage.
pub fn run(command: &PrepareCommand) -> Result<MergeSummary, PrepareError> {
    check_inputs(&command.inputs)?;

    let work_dir = &command.config.work_dir;
    fs::create_dir_all(work_dir).map_err(|source| PrepareError::WorkDir {
        path: work_dir.display().to_string(),
        source,
    })?;

    eprintln!("> Merging {} VCF files...", command.inputs.len());
    let merged = command.config.merged_path();
    let summary = merge_files(&command.inputs, &merged)?;

    ExternalPipeline::new(&command.config).run(&merged, &command.output)?;
    Ok(summary)
}
