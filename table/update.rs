// ========================================================================================
//
//                  APPENDING PER-SAMPLE ALLELE COLUMNS TO AN EXISTING TABLE
//
// ========================================================================================
//
// Each VCF contributes one column named after the file, holding the ALT alleles that file
// calls at every position already present in the table. A VCF that cannot be read is
// reported and skipped so the remaining files still make it into the output.

use ahash::AHashMap;
use log::{error, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::pipeline::{TableError, build_pool};
use crate::progress::{ProgressStage, observer};
use crate::shared::files::{VcfError, VcfReader};
use crate::types::{Cell, POSITION_COLUMN, Table};
use crate::writer::{read_table, write_table};

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub threads: usize,
    pub show_progress: bool,
}

/// Alleles called by one VCF, keyed on position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleColumn {
    pub name: String,
    pub alleles: AHashMap<u64, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub applied: Vec<String>,
    pub failed: Vec<PathBuf>,
}

/// The file name up to its first dot: `sample1.ann.vcf.gz` becomes `sample1`.
pub fn column_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(str::to_string))
        .unwrap_or_default()
}

/// Reads every record's position and comma-joined ALT alleles. When a position occurs
/// more than once, the first record wins.
pub fn read_allele_column(path: &Path) -> Result<AlleleColumn, VcfError> {
    let mut alleles = AHashMap::new();
    for record in VcfReader::open(path)? {
        let record = record?;
        alleles
            .entry(record.position)
            .or_insert_with(|| record.allele_string());
    }
    Ok(AlleleColumn {
        name: column_name(path),
        alleles,
    })
}

/// Writes `column` into `table`, replacing an existing column of the same name.
pub fn apply_column(table: &mut Table, position_index: usize, column: &AlleleColumn) {
    let index = match table.column_index(&column.name) {
        Some(index) => index,
        None => {
            table.header.push(column.name.clone());
            table.header.len() - 1
        }
    };
    let width = table.header.len();

    for row in &mut table.rows {
        if row.len() < width {
            row.resize(width, Cell::Empty);
        }
        let value = row
            .get(position_index)
            .and_then(Cell::as_position)
            .and_then(|position| column.alleles.get(&position))
            .map(|allele| Cell::text(allele.clone()))
            .unwrap_or(Cell::Empty);
        row[index] = value;
    }
}

pub fn update_table_with_vcfs(
    vcfs: &[PathBuf],
    table_path: &Path,
    output: &Path,
    options: &UpdateOptions,
) -> Result<UpdateSummary, TableError> {
    let mut table = read_table(table_path)?;
    let position_index =
        table
            .column_index(POSITION_COLUMN)
            .ok_or_else(|| TableError::MissingColumn {
                path: table_path.display().to_string(),
                column: POSITION_COLUMN.to_string(),
            })?;

    let pool = build_pool(options.threads)?;
    let progress = observer(options.show_progress);
    let progress = progress.as_ref();

    progress.on_stage_start(ProgressStage::Files, vcfs.len());
    let results: Vec<Result<AlleleColumn, VcfError>> = pool.install(|| {
        vcfs.par_iter()
            .map(|path| {
                let result = read_allele_column(path);
                progress.on_stage_advance(ProgressStage::Files, 1);
                result
            })
            .collect()
    });
    progress.on_stage_finish(ProgressStage::Files);

    let mut summary = UpdateSummary::default();
    for (path, result) in vcfs.iter().zip(results) {
        match result {
            Ok(column) => {
                apply_column(&mut table, position_index, &column);
                summary.applied.push(column.name);
            }
            Err(e) => {
                error!("Failed to process {}: {e}", path.display());
                summary.failed.push(path.clone());
            }
        }
    }
    info!(
        "Added {} columns, skipped {} files",
        summary.applied.len(),
        summary.failed.len()
    );

    write_table(output, &table, progress)?;
    Ok(summary)
}
