//! Gene identifier resolution against the static feature table.
//!
//! The feature table is a TSV with `symbol`, `locus_tag` and `name` columns. Two lookups
//! are derived from it: symbol to locus tag, and locus tag to the list of names recorded
//! for it.

use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Separator of composite gene names and ids such as `geneA-geneB`.
pub const COMPOSITE_DELIMITER: char = '-';
/// Placeholder written when a locus tag has no usable display name.
pub const MISSING_NAME: &str = "None";

#[derive(Debug, Error)]
pub enum FeatureTableError {
    #[error("could not open feature table {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("could not parse feature table {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// One row of the feature table. Empty cells deserialize to `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureRow {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub locus_tag: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Read-only lookup tables, shared across worker threads during extraction.
#[derive(Debug, Clone, Default)]
pub struct GeneResolver {
    locus_by_symbol: AHashMap<String, String>,
    names_by_locus: AHashMap<String, Vec<String>>,
}

impl GeneResolver {
    pub fn load(path: &Path) -> Result<Self, FeatureTableError> {
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|source| FeatureTableError::Open {
            path: origin.clone(),
            source,
        })?;
        Self::from_reader(file).map_err(|source| FeatureTableError::Parse {
            path: origin,
            source,
        })
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(reader);
        let rows = reader
            .deserialize::<FeatureRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_rows(rows))
    }

    /// Builds both lookups. Duplicate (symbol, locus_tag) and (name, locus_tag) pairs are
    /// collapsed, keeping first-seen order; symbol pairs with a missing side are dropped.
    pub fn from_rows<I: IntoIterator<Item = FeatureRow>>(rows: I) -> Self {
        let mut resolver = Self::default();
        let mut seen_names: AHashSet<(String, String)> = AHashSet::new();

        for row in rows {
            let Some(locus_tag) = row.locus_tag.filter(|t| !t.is_empty()) else {
                continue;
            };
            if let Some(symbol) = row.symbol.filter(|s| !s.is_empty()) {
                resolver
                    .locus_by_symbol
                    .entry(symbol)
                    .or_insert_with(|| locus_tag.clone());
            }
            let name = row.name.unwrap_or_default();
            if seen_names.insert((name.clone(), locus_tag.clone())) {
                resolver
                    .names_by_locus
                    .entry(locus_tag)
                    .or_default()
                    .push(name);
            }
        }

        debug!(
            "Feature table: {} symbols, {} locus tags with names",
            resolver.locus_by_symbol.len(),
            resolver.names_by_locus.len()
        );
        resolver
    }

    /// Locus tag for `symbol`, or `symbol` itself when the table has no match.
    pub fn resolve_locus<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.locus_by_symbol
            .get(symbol)
            .map(String::as_str)
            .unwrap_or(symbol)
    }

    /// Display names for a possibly composite locus tag, joined with commas.
    ///
    /// Each part uses the *second* name recorded for it. Parts with fewer than two names,
    /// or whose second name is empty, become `None`.
    pub fn resolve_display_name(&self, locus_tag: &str) -> String {
        locus_tag
            .split(COMPOSITE_DELIMITER)
            .map(|part| {
                match self.names_by_locus.get(part).and_then(|names| names.get(1)) {
                    Some(name) if !name.is_empty() => name.as_str(),
                    _ => MISSING_NAME,
                }
            })
            .join(",")
    }

    /// Rewrites every part of a composite gene name to its locus tag.
    ///
    /// `gene_id` is expected to have the same number of parts; a mismatch is logged and
    /// the name parts are used as they are, without padding or truncation.
    pub fn rename_gene_id(&self, gene_name: &str, gene_id: &str) -> String {
        let name_parts = gene_name.split(COMPOSITE_DELIMITER).count();
        let id_parts = gene_id.split(COMPOSITE_DELIMITER).count();
        if name_parts != id_parts {
            debug!(
                "Gene name '{gene_name}' has {name_parts} parts but gene id '{gene_id}' has {id_parts}"
            );
        }
        gene_name
            .split(COMPOSITE_DELIMITER)
            .map(|part| self.resolve_locus(part))
            .join("-")
    }
}
