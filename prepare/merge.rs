// ========================================================================================
//
//                              NAIVE VCF RECORD MERGING
//
// ========================================================================================
//
// Records are grouped by (chromosome, position, reference). A group of one passes through
// untouched. Larger groups keep the first record as the representative, take the union of
// alternate alleles and the best quality, and ignore every other disagreement between the
// inputs (INFO, FILTER and genotype columns come from the representative).

use ahash::AHashMap;
use itertools::Itertools;
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::shared::files::{VariantKey, VariantRecord, VcfError, VcfReader, VcfWriter};

const MISSING_QUALITY: &str = ".";

/// Counts reported back to the driver after a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    pub records_read: usize,
    pub records_written: usize,
    pub merged_groups: usize,
}

/// Merges records from several sources into one deduplicated list.
///
/// Output order follows the first occurrence of each key, walking the sources in the
/// order given.
pub fn merge_records<S>(sources: Vec<S>) -> Result<(Vec<VariantRecord>, MergeSummary), VcfError>
where
    S: IntoIterator<Item = Result<VariantRecord, VcfError>>,
{
    let mut slots: AHashMap<VariantKey, usize> = AHashMap::new();
    let mut groups: Vec<Vec<VariantRecord>> = Vec::new();
    let mut summary = MergeSummary::default();

    for source in sources {
        for record in source {
            let record = record?;
            summary.records_read += 1;
            match slots.get(&record.key()) {
                Some(&slot) => groups[slot].push(record),
                None => {
                    slots.insert(record.key(), groups.len());
                    groups.push(vec![record]);
                }
            }
        }
    }

    let mut merged = Vec::with_capacity(groups.len());
    for group in groups {
        if group.len() > 1 {
            summary.merged_groups += 1;
        }
        merged.push(combine_group(group));
    }
    summary.records_written = merged.len();
    Ok((merged, summary))
}

/// Collapses a non-empty group of records sharing one key.
fn combine_group(mut group: Vec<VariantRecord>) -> VariantRecord {
    if group.len() == 1 {
        return group.remove(0);
    }

    let alternates: Vec<String> = group
        .iter()
        .flat_map(|record| record.alternates.iter())
        .unique()
        .cloned()
        .collect();
    // ties keep the earliest record's spelling of QUAL
    let best = group
        .iter()
        .filter_map(|record| record.quality.map(|q| (q, record)))
        .fold(None, |best: Option<(f64, &VariantRecord)>, (q, record)| match best {
            Some((b, _)) if b >= q => best,
            _ => Some((q, record)),
        })
        .map(|(q, record)| (q, record.quality_text.clone()));

    let mut representative = group.swap_remove(0);
    debug!(
        "Merged {} records at {}:{} {} into ALT={}",
        group.len() + 1,
        representative.chromosome,
        representative.position,
        representative.reference,
        alternates.join(",")
    );
    representative.alternates = alternates;
    match best {
        Some((quality, text)) => {
            representative.quality = Some(quality);
            representative.quality_text = text;
        }
        None => {
            representative.quality = None;
            representative.quality_text = MISSING_QUALITY.to_string();
        }
    }
    representative
}

/// Reads every input, merges the records and writes them under the first input's header.
pub fn merge_files(inputs: &[PathBuf], output: &Path) -> Result<MergeSummary, VcfError> {
    let readers = inputs
        .iter()
        .map(|path| VcfReader::open(path))
        .collect::<Result<Vec<_>, _>>()?;
    let header = readers
        .first()
        .map(|reader| reader.header().to_vec())
        .unwrap_or_default();

    let (records, summary) = merge_records(readers)?;

    let mut writer = VcfWriter::create(output)?;
    writer.write_header(&header)?;
    for record in &records {
        writer.write_record(record)?;
    }
    writer.finish()?;

    info!(
        "Merged {} records from {} files into {} records ({} groups combined)",
        summary.records_read,
        inputs.len(),
        summary.records_written,
        summary.merged_groups
    );
    Ok(summary)
}
