use std::path::{Path, PathBuf};

use thiserror::Error;

/// The only input container the merge step accepts.
pub const VCF_GZ_SUFFIX: &str = ".vcf.gz";
/// Tabix index sidecar expected next to every input.
pub const INDEX_SUFFIX: &str = ".tbi";

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no input VCF files were given")]
    NoInputs,
    #[error("file {path} must have the .vcf.gz extension")]
    Format { path: String },
    #[error("file {path} was not found")]
    NotFound { path: String },
    #[error("index {index} was not found")]
    IndexNotFound { index: String },
}

/// Checks every input in order and stops at the first problem.
pub fn check_inputs(paths: &[PathBuf]) -> Result<(), ValidationError> {
    if paths.is_empty() {
        return Err(ValidationError::NoInputs);
    }
    for path in paths {
        check_input(path)?;
    }
    Ok(())
}

fn check_input(path: &Path) -> Result<(), ValidationError> {
    let display = path.display().to_string();
    if !display.ends_with(VCF_GZ_SUFFIX) {
        return Err(ValidationError::Format { path: display });
    }
    if !path.exists() {
        return Err(ValidationError::NotFound { path: display });
    }
    let index = index_path(path);
    if !index.exists() {
        return Err(ValidationError::IndexNotFound {
            index: index.display().to_string(),
        });
    }
    Ok(())
}

pub fn index_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(INDEX_SUFFIX);
    PathBuf::from(name)
}
