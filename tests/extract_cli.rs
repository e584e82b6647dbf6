use std::fs;
use std::process::Command;

use tempfile::tempdir;
use vcf2table::types::{Cell, OUTPUT_COLUMNS};
use vcf2table::writer::read_table;

const FEATURE_TABLE: &str = "symbol\tlocus_tag\tname\n\
katG\tRv1908c\tkatG\n\
katG\tRv1908c\tcatalase-peroxidase\n\
rpoB\tRv0667\trpoB\n";

const VCF: &str = "##fileformat=VCFv4.2\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
NC_000962.3\t2155168\t.\tC\tG\t100\tPASS\tANN=G|missense_variant|MODERATE|katG|Rv1908c|transcript|Rv1908c.1|protein_coding|1/1|c.944G>C|p.Ser315Thr|944/2223|944/2223|315/740||\n\
NC_000962.3\t761155\t.\tC\tT,A\t90\tPASS\tANN=T|missense_variant|MODERATE|rpoB|Rv0667|transcript|Rv0667.1|protein_coding|1/1|c.1349C>T|p.Ser450Leu|1349/3519|1349/3519|450/1172||,A|stop_gained|HIGH|rpoB|Rv0667|transcript|Rv0667.1|protein_coding|1/1|c.1349C>A|p.Ser450*|1349/3519|1349/3519|450/1172||\n\
NC_000962.3\t1000\t.\tA\tT\t30\tPASS\tDP=7\n";

#[test]
fn extract_writes_one_sorted_row_per_record() {
    let tmp = tempdir().expect("temporary directory");
    let vcf = tmp.path().join("sample.ann.vcf");
    let features = tmp.path().join("feature_table.tsv");
    let output = tmp.path().join("sample.xlsx");
    fs::write(&vcf, VCF).expect("write vcf");
    fs::write(&features, FEATURE_TABLE).expect("write feature table");

    let status = Command::new(env!("CARGO_BIN_EXE_vcf2table"))
        .current_dir(tmp.path())
        .arg("extract")
        .arg("-i")
        .arg(&vcf)
        .arg("-o")
        .arg(&output)
        .arg("-f")
        .arg(&features)
        .args(["-th", "2"])
        .status()
        .expect("run vcf2table");
    assert!(status.success(), "CLI exited with status {status:?}");

    let table = read_table(&output).expect("read output");
    assert_eq!(table.header, OUTPUT_COLUMNS.to_vec());
    assert_eq!(table.len(), 3);

    let positions: Vec<_> = table.rows.iter().map(|r| r[0].as_position()).collect();
    assert_eq!(positions, vec![Some(1000), Some(761155), Some(2155168)]);

    // record without ANN: only POS, REF and Allele are filled
    let bare = &table.rows[0];
    assert_eq!(bare[1], Cell::Text("A".to_string()));
    assert_eq!(bare[2], Cell::Text("T".to_string()));
    assert!(bare[3..].iter().all(|c| c.as_text().is_empty()), "{bare:?}");

    let multi = &table.rows[1];
    assert_eq!(multi[2].as_text(), "T,A");
    assert_eq!(multi[3].as_text(), "missense_variant,stop_gained");
    assert_eq!(multi[4].as_text(), "MODERATE,HIGH");
    assert_eq!(multi[6].as_text(), "Rv0667");
    assert_eq!(multi[7].as_text(), "None");
    assert_eq!(multi[11].as_text(), "p.Ser450Leu,p.Ser450*");

    let single = &table.rows[2];
    assert_eq!(single[5].as_text(), "katG");
    assert_eq!(single[6].as_text(), "Rv1908c");
    assert_eq!(single[7].as_text(), "catalase-peroxidase");
    assert_eq!(single[10].as_text(), "c.944G>C");
}

#[test]
fn missing_feature_table_exits_with_error() {
    let tmp = tempdir().expect("temporary directory");
    let vcf = tmp.path().join("sample.vcf");
    fs::write(&vcf, VCF).expect("write vcf");

    let output = Command::new(env!("CARGO_BIN_EXE_vcf2table"))
        .current_dir(tmp.path())
        .args(["extract", "-i"])
        .arg(&vcf)
        .args(["-o", "out.xlsx"])
        .output()
        .expect("run vcf2table");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("feature_table.tsv"));
    assert!(!tmp.path().join("out.xlsx").exists());
}
