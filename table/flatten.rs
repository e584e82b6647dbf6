// ========================================================================================
//
//                       ANN FIELD FLATTENING INTO FIXED TABLE COLUMNS
//
// ========================================================================================
//
// snpEff writes one pipe-delimited entry per (allele, transcript) pair into the ANN INFO
// key. A table row holds one variant, so the entries are collapsed:
//
//  - at most one ALT allele: effect, impact, feature type and HGVS notation come from the
//    first entry only;
//  - several ALT alleles: those fields are comma-joined across every entry, in order;
//  - gene, biotype, position fractions and errors always come from the first entry.

use itertools::Itertools;

use crate::resolve::GeneResolver;
use crate::shared::files::VariantRecord;
use crate::types::OutputRow;

/// Number of pipe-delimited fields in a standard ANN entry.
pub const ANNOTATION_FIELD_COUNT: usize = 16;

const EFFECT: usize = 1;
const IMPACT: usize = 2;
const GENE_NAME: usize = 3;
const GENE_ID: usize = 4;
const FEATURE_TYPE: usize = 5;
const TRANSCRIPT_BIOTYPE: usize = 7;
const HGVS_C: usize = 9;
const HGVS_P: usize = 10;
const CDNA_POSITION: usize = 11;
const CDS_POSITION: usize = 12;
const PROTEIN_POSITION: usize = 13;
const ERRORS: usize = 15;

static EMPTY_ENTRY: [&str; ANNOTATION_FIELD_COUNT] = [""; ANNOTATION_FIELD_COUNT];

fn field<'a>(entry: &[&'a str], index: usize) -> &'a str {
    entry.get(index).copied().unwrap_or("")
}

/// Flattens one record into exactly one output row.
pub fn flatten_record(record: &VariantRecord, resolver: &GeneResolver) -> OutputRow {
    let entries: Vec<Vec<&str>> = record
        .annotations()
        .into_iter()
        .map(|entry| entry.split('|').collect())
        .collect();
    let first: &[&str] = entries
        .first()
        .map(Vec::as_slice)
        .unwrap_or(EMPTY_ENTRY.as_slice());

    let (annotation, putative_impact, feature_type, hgvs_c, hgvs_p) =
        if record.alternates.len() <= 1 {
            (
                field(first, EFFECT).to_string(),
                field(first, IMPACT).to_string(),
                field(first, FEATURE_TYPE).to_string(),
                field(first, HGVS_C).to_string(),
                field(first, HGVS_P).to_string(),
            )
        } else {
            let joined = |index: usize| entries.iter().map(|e| field(e, index)).join(",");
            let mut hgvs_p = joined(HGVS_P);
            // a lone separator means no entry carried a protein change
            if hgvs_p.chars().count() <= 1 {
                hgvs_p.clear();
            }
            (
                joined(EFFECT),
                joined(IMPACT),
                joined(FEATURE_TYPE),
                joined(HGVS_C),
                hgvs_p,
            )
        };

    let gene_name = field(first, GENE_NAME);
    let gene_id = resolver.rename_gene_id(gene_name, field(first, GENE_ID));
    let display_name = if gene_id.is_empty() {
        String::new()
    } else {
        resolver.resolve_display_name(&gene_id)
    };

    OutputRow {
        position: record.position,
        reference: record.reference.clone(),
        allele: record.allele_string(),
        annotation,
        putative_impact,
        gene_name: gene_name.to_string(),
        gene_id,
        display_name,
        feature_type,
        transcript_biotype: field(first, TRANSCRIPT_BIOTYPE).to_string(),
        hgvs_c,
        hgvs_p,
        cdna_position: field(first, CDNA_POSITION).to_string(),
        cds_position: field(first, CDS_POSITION).to_string(),
        protein_position: field(first, PROTEIN_POSITION).to_string(),
        errors: field(first, ERRORS).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::FeatureRow;
    use crate::types::OUTPUT_COLUMNS;

    fn resolver() -> GeneResolver {
        let row = |symbol: &str, locus: &str, name: &str| FeatureRow {
            symbol: Some(symbol.to_string()),
            locus_tag: Some(locus.to_string()),
            name: Some(name.to_string()),
        };
        GeneResolver::from_rows(vec![
            row("katG", "Rv1908c", "katG"),
            row("katG", "Rv1908c", "catalase-peroxidase"),
        ])
    }

    fn record(alt: &str, info: &str) -> VariantRecord {
        VariantRecord::parse(&format!("NC_000962.3\t2155168\t.\tC\t{alt}\t100\tPASS\t{info}"))
            .expect("valid test record")
    }

    const KATG_MISSENSE: &str = "G|missense_variant|MODERATE|katG|Rv1908c|transcript|Rv1908c.1|protein_coding|1/1|c.944G>C|p.Ser315Thr|944/2223|944/2223|315/740||";

    #[test]
    fn single_allele_uses_the_first_entry() {
        let second = "G|upstream_gene_variant|MODIFIER|furA|Rv1909c|transcript|x|protein_coding||c.-1C>G|||||1|";
        let row = flatten_record(
            &record("G", &format!("DP=20;ANN={KATG_MISSENSE},{second}")),
            &resolver(),
        );

        assert_eq!(row.position, 2155168);
        assert_eq!(row.allele, "G");
        assert_eq!(row.annotation, "missense_variant");
        assert_eq!(row.putative_impact, "MODERATE");
        assert_eq!(row.gene_name, "katG");
        assert_eq!(row.gene_id, "Rv1908c");
        assert_eq!(row.display_name, "catalase-peroxidase");
        assert_eq!(row.feature_type, "transcript");
        assert_eq!(row.transcript_biotype, "protein_coding");
        assert_eq!(row.hgvs_c, "c.944G>C");
        assert_eq!(row.hgvs_p, "p.Ser315Thr");
        assert_eq!(row.cdna_position, "944/2223");
        assert_eq!(row.protein_position, "315/740");
        assert_eq!(row.errors, "");
    }

    #[test]
    fn multi_allele_joins_every_entry() {
        let other = "T|synonymous_variant|LOW|katG|Rv1908c|intergenic_region|Rv1908c.1|protein_coding|1/1|c.944G>A|p.Ser315Ser|944/2223|944/2223|315/740||WARNING";
        let row = flatten_record(
            &record("G,T", &format!("ANN={KATG_MISSENSE},{other}")),
            &resolver(),
        );

        assert_eq!(row.allele, "G,T");
        assert_eq!(row.annotation, "missense_variant,synonymous_variant");
        assert_eq!(row.putative_impact, "MODERATE,LOW");
        assert_eq!(row.feature_type, "transcript,intergenic_region");
        assert_eq!(row.hgvs_c, "c.944G>C,c.944G>A");
        assert_eq!(row.hgvs_p, "p.Ser315Thr,p.Ser315Ser");
        // first entry only
        assert_eq!(row.errors, "");
    }

    #[test]
    fn multi_allele_without_protein_changes_has_empty_hgvs_p() {
        let a = "G|intergenic_region|MODIFIER|x|x|intergenic_region|x|||n.1C>G||||||";
        let b = "T|intergenic_region|MODIFIER|x|x|intergenic_region|x|||n.1C>T||||||";
        let row = flatten_record(&record("G,T", &format!("ANN={a},{b}")), &resolver());
        assert_eq!(row.hgvs_p, "");
        assert_eq!(row.hgvs_c, "n.1C>G,n.1C>T");
    }

    #[test]
    fn record_without_annotations_has_empty_annotation_columns() {
        let row = flatten_record(&record("A", "DP=4"), &resolver());
        let cells = row.clone().into_cells();

        assert_eq!(cells.len(), OUTPUT_COLUMNS.len());
        assert_eq!(row.position, 2155168);
        assert_eq!(row.reference, "C");
        assert_eq!(row.allele, "A");
        assert_eq!(
            OutputRow {
                position: row.position,
                reference: row.reference.clone(),
                allele: row.allele.clone(),
                ..OutputRow::default()
            },
            row
        );
    }

    #[test]
    fn short_entries_read_as_empty_fields() {
        let row = flatten_record(&record("G", "ANN=G|stop_gained|HIGH"), &resolver());
        assert_eq!(row.annotation, "stop_gained");
        assert_eq!(row.putative_impact, "HIGH");
        assert_eq!(row.gene_id, "");
        assert_eq!(row.errors, "");
    }
}
