// ========================================================================================
//
//                      PARALLEL EXTRACTION OF ONE VCF INTO A TABLE
//
// ========================================================================================
//
// Records are flattened on a bounded rayon pool. Flattening is a pure function of the
// record and the read-only resolver, so the pool's scheduling has no effect on results.
// Row order is fixed afterwards by a stable sort on position.

use log::info;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::flatten::flatten_record;
use crate::progress::{ProgressObserver, ProgressStage, observer};
use crate::resolve::{FeatureTableError, GeneResolver};
use crate::shared::files::{VariantRecord, VcfError, VcfReader};
use crate::types::{OutputRow, Table};
use crate::writer::write_table;

pub const DEFAULT_THREADS: usize = 4;
pub const DEFAULT_FEATURE_TABLE: &str = "tables/feature_table.tsv";

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Vcf(#[from] VcfError),
    #[error(transparent)]
    FeatureTable(#[from] FeatureTableError),
    #[error("the worker pool needs at least one thread")]
    NoThreads,
    #[error("could not build a worker pool: {0}")]
    ThreadPool(#[from] ThreadPoolBuildError),
    #[error("could not write spreadsheet {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("spreadsheet path {path} is not valid UTF-8")]
    NonUtf8Path { path: PathBuf },
    #[error("could not read spreadsheet {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: calamine::XlsxError,
    },
    #[error("spreadsheet {path} has no worksheet")]
    NoWorksheet { path: String },
    #[error("spreadsheet {path} has no '{column}' column")]
    MissingColumn { path: String, column: String },
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub threads: usize,
    pub show_progress: bool,
    pub feature_table: PathBuf,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            show_progress: false,
            feature_table: PathBuf::from(DEFAULT_FEATURE_TABLE),
        }
    }
}

/// A pool of exactly `threads` workers. Zero is rejected rather than handed to rayon,
/// which would size the pool from the CPU count.
pub fn build_pool(threads: usize) -> Result<ThreadPool, TableError> {
    if threads == 0 {
        return Err(TableError::NoThreads);
    }
    Ok(ThreadPoolBuilder::new().num_threads(threads).build()?)
}

/// Stable sort on position; rows sharing a position keep their relative order.
pub fn sort_rows(rows: &mut [OutputRow]) {
    rows.sort_by_key(|row| row.position);
}

/// Flattens every record on `pool` and returns the rows sorted by position.
pub fn flatten_records(
    records: &[VariantRecord],
    resolver: &GeneResolver,
    pool: &ThreadPool,
    progress: &dyn ProgressObserver,
) -> Vec<OutputRow> {
    progress.on_stage_start(ProgressStage::Records, records.len());
    let mut rows: Vec<OutputRow> = pool.install(|| {
        records
            .par_iter()
            .map(|record| {
                let row = flatten_record(record, resolver);
                progress.on_stage_advance(ProgressStage::Records, 1);
                row
            })
            .collect()
    });
    progress.on_stage_finish(ProgressStage::Records);

    sort_rows(&mut rows);
    rows
}

/// Reads `input`, flattens its annotations and writes the table to `output`.
/// Returns the number of rows written.
pub fn extract_annotations(
    input: &Path,
    output: &Path,
    options: &ExtractOptions,
) -> Result<usize, TableError> {
    let resolver = GeneResolver::load(&options.feature_table)?;
    let records = VcfReader::open(input)?.collect::<Result<Vec<_>, _>>()?;
    info!("Read {} records from {}", records.len(), input.display());

    let pool = build_pool(options.threads)?;
    let progress = observer(options.show_progress);
    let rows = flatten_records(&records, &resolver, &pool, progress.as_ref());
    drop(records);

    let table = Table::from_output_rows(rows);
    write_table(output, &table, progress.as_ref())?;
    Ok(table.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgress;

    #[test]
    fn sort_is_stable_for_equal_positions() {
        let row = |position: u64, allele: &str| OutputRow {
            position,
            allele: allele.to_string(),
            ..OutputRow::default()
        };
        let mut rows = vec![row(30, "a"), row(10, "b"), row(30, "c"), row(10, "d"), row(20, "e")];
        sort_rows(&mut rows);
        let order: Vec<_> = rows.iter().map(|r| (r.position, r.allele.as_str())).collect();
        assert_eq!(
            order,
            vec![(10, "b"), (10, "d"), (20, "e"), (30, "a"), (30, "c")]
        );
    }

    #[test]
    fn pool_size_is_exactly_the_requested_thread_count() {
        assert!(matches!(build_pool(0), Err(TableError::NoThreads)));
        let pool = build_pool(2).expect("pool");
        assert_eq!(pool.current_num_threads(), 2);
    }

    #[test]
    fn flattened_rows_come_back_sorted() {
        let records: Vec<VariantRecord> = (0..500u64)
            .rev()
            .map(|i| {
                VariantRecord::parse(&format!("chr\t{}\t.\tA\tT\t1\t.\tANN=T|e{i}|LOW", i * 3 + 1))
                    .expect("valid test record")
            })
            .collect();
        let pool = build_pool(3).expect("pool");
        let rows = flatten_records(&records, &GeneResolver::default(), &pool, &NoopProgress);

        assert_eq!(rows.len(), 500);
        assert!(rows.windows(2).all(|w| w[0].position <= w[1].position));
        assert_eq!(rows[0].position, 1);
        assert_eq!(rows[0].annotation, "e0");
    }
}
