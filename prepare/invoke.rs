// ========================================================================================
//
//                      EXTERNAL RENAME AND ANNOTATION SUBPROCESSES
//
// ========================================================================================

use log::debug;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

use super::config::{PipelineConfig, ToolStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Rename,
    Annotate,
}

impl Step {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Rename => "chromosome rename",
            Self::Annotate => "annotation",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Error)]
pub enum ExternalToolError {
    #[error("could not launch the {step} step ('{program}'): {source}")]
    Launch {
        step: Step,
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("the {step} step failed with {status}")]
    Failed { step: Step, status: ExitStatus },
    #[error("could not create the {step} step output {path}: {source}")]
    Output {
        step: Step,
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Runs the rename step and then the annotation step. The second step only starts after
/// the first has exited and its output file is complete.
pub struct ExternalPipeline<'a> {
    config: &'a PipelineConfig,
}

impl<'a> ExternalPipeline<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, merged: &Path, output: &Path) -> Result<(), ExternalToolError> {
        let renamed = self.config.renamed_path();
        eprintln!("> Renaming chromosomes...");
        self.rename(merged, &renamed)?;
        eprintln!("> Annotating VCF file...");
        self.annotate(&renamed, output)
    }

    /// `<program> <args..> <input> <output>`
    pub fn rename(&self, input: &Path, output: &Path) -> Result<(), ExternalToolError> {
        let step = &self.config.rename;
        let mut command = base_command(step);
        command.arg(input).arg(output);
        run_step(Step::Rename, step, command)
    }

    /// `<program> <args..> <input> > <output>`
    ///
    /// A failed run removes whatever the tool managed to write.
    pub fn annotate(&self, input: &Path, output: &Path) -> Result<(), ExternalToolError> {
        let step = &self.config.annotate;
        let file = File::create(output).map_err(|source| ExternalToolError::Output {
            step: Step::Annotate,
            path: output.display().to_string(),
            source,
        })?;
        let mut command = base_command(step);
        command.arg(input).stdout(Stdio::from(file));

        let result = run_step(Step::Annotate, step, command);
        if result.is_err() {
            if let Err(e) = fs::remove_file(output) {
                debug!("Could not remove partial output {}: {e}", output.display());
            }
        }
        result
    }
}

fn base_command(step: &ToolStep) -> Command {
    let mut command = Command::new(&step.program);
    command.args(&step.args);
    command
}

fn run_step(step: Step, tool: &ToolStep, mut command: Command) -> Result<(), ExternalToolError> {
    debug!("Running {step} step: {command:?}");
    let status = command.status().map_err(|source| ExternalToolError::Launch {
        step,
        program: tool.program.clone(),
        source,
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(ExternalToolError::Failed { step, status })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn config(work_dir: PathBuf, rename: &str, annotate: &str) -> PipelineConfig {
        PipelineConfig {
            work_dir,
            rename: ToolStep {
                program: rename.to_string(),
                args: Vec::new(),
            },
            annotate: ToolStep {
                program: annotate.to_string(),
                args: Vec::new(),
            },
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn steps_chain_through_intermediate_files() {
        let dir = tempdir().expect("temporary directory");
        let merged = dir.path().join("merged.vcf");
        fs::write(&merged, "##fileformat=VCFv4.2\n").expect("write merged");
        let output = dir.path().join("annotated.vcf");

        let config = config(dir.path().to_path_buf(), "cp", "cat");
        ExternalPipeline::new(&config)
            .run(&merged, &output)
            .expect("pipeline succeeds");

        assert!(config.renamed_path().exists());
        let annotated = fs::read_to_string(&output).expect("read output");
        assert_eq!(annotated, "##fileformat=VCFv4.2\n");
    }

    #[test]
    fn rename_failure_stops_before_annotation() {
        let dir = tempdir().expect("temporary directory");
        let merged = dir.path().join("merged.vcf");
        fs::write(&merged, "x").expect("write merged");
        let output = dir.path().join("annotated.vcf");

        let config = config(dir.path().to_path_buf(), "false", "cat");
        let err = ExternalPipeline::new(&config)
            .run(&merged, &output)
            .unwrap_err();
        assert!(matches!(err, ExternalToolError::Failed { step: Step::Rename, .. }), "{err:?}");
        assert!(!output.exists());
    }

    #[test]
    fn annotation_failure_leaves_no_output() {
        let dir = tempdir().expect("temporary directory");
        let merged = dir.path().join("merged.vcf");
        fs::write(&merged, "x").expect("write merged");
        let output = dir.path().join("annotated.vcf");

        let config = config(dir.path().to_path_buf(), "cp", "false");
        let err = ExternalPipeline::new(&config)
            .run(&merged, &output)
            .unwrap_err();
        assert!(matches!(err, ExternalToolError::Failed { step: Step::Annotate, .. }));
        assert!(!output.exists());
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let dir = tempdir().expect("temporary directory");
        let config = config(dir.path().to_path_buf(), "definitely-not-a-real-tool", "cat");
        let err = ExternalPipeline::new(&config)
            .rename(&dir.path().join("in"), &dir.path().join("out"))
            .unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-real-tool"));
    }
}
