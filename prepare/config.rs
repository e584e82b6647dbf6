//! Tool configuration for the prepare pipeline.
//!
//! The annotator and rename script locations used to be fixed paths. They are now read
//! from an optional TOML file; every field falls back to the historical invocation.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MERGED_FILE: &str = "merged.vcf.gz";
pub const DEFAULT_RENAMED_FILE: &str = "merged.renamed.vcf";
pub const DEFAULT_RENAME_PROGRAM: &str = "scripts/rename_vcf";
pub const DEFAULT_SNPEFF_JAR: &str = "snpEff/snpEff.jar";
pub const DEFAULT_SNPEFF_DATABASE: &str = "Mycobacterium_tuberculosis_h37rv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// One external program invocation. Step-specific operands (input and output paths)
/// are appended by the invoker after `args`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolStep {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the intermediate files. They are overwritten on every run.
    pub work_dir: PathBuf,
    pub merged_file: String,
    pub renamed_file: String,
    pub rename: ToolStep,
    pub annotate: ToolStep,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            merged_file: DEFAULT_MERGED_FILE.to_string(),
            renamed_file: DEFAULT_RENAMED_FILE.to_string(),
            rename: ToolStep {
                program: DEFAULT_RENAME_PROGRAM.to_string(),
                args: Vec::new(),
            },
            annotate: ToolStep {
                program: "java".to_string(),
                args: [
                    "-jar",
                    DEFAULT_SNPEFF_JAR,
                    "ann",
                    "-noLog",
                    "-noStats",
                    "-no-downstream",
                    "-no-upstream",
                    "-no-utr",
                    "-o",
                    "vcf",
                    DEFAULT_SNPEFF_DATABASE,
                ]
                .iter()
                .map(|arg| arg.to_string())
                .collect(),
            },
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: origin.clone(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: origin,
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merged_path(&self) -> PathBuf {
        self.work_dir.join(&self.merged_file)
    }

    pub fn renamed_path(&self) -> PathBuf {
        self.work_dir.join(&self.renamed_file)
    }
}
