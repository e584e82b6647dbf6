use calamine::Data;

/// Column headers of the extracted annotation table, in output order.
pub const OUTPUT_COLUMNS: [&str; 16] = [
    "POS",
    "REF",
    "Allele",
    "Annotation",
    "Putative_impact",
    "Gene Name",
    "Gene ID",
    "name",
    "Feature type",
    "Transcript biotype",
    "HGVS.c",
    "HGVS.p",
    "cDNA_position / cDNA_len",
    "CDS_position / CDS_len",
    "Protein_position / Protein_len",
    "Errors",
];

/// Header of the column every table is keyed on.
pub const POSITION_COLUMN: &str = "POS";

/// One flattened variant record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputRow {
    pub position: u64,
    pub reference: String,
    pub allele: String,
    pub annotation: String,
    pub putative_impact: String,
    pub gene_name: String,
    pub gene_id: String,
    pub display_name: String,
    pub feature_type: String,
    pub transcript_biotype: String,
    pub hgvs_c: String,
    pub hgvs_p: String,
    pub cdna_position: String,
    pub cds_position: String,
    pub protein_position: String,
    pub errors: String,
}

impl OutputRow {
    /// Cells in [`OUTPUT_COLUMNS`] order.
    pub fn into_cells(self) -> Vec<Cell> {
        vec![
            Cell::Number(self.position as f64),
            Cell::text(self.reference),
            Cell::text(self.allele),
            Cell::text(self.annotation),
            Cell::text(self.putative_impact),
            Cell::text(self.gene_name),
            Cell::text(self.gene_id),
            Cell::text(self.display_name),
            Cell::text(self.feature_type),
            Cell::text(self.transcript_biotype),
            Cell::text(self.hgvs_c),
            Cell::text(self.hgvs_p),
            Cell::text(self.cdna_position),
            Cell::text(self.cds_position),
            Cell::text(self.protein_position),
            Cell::text(self.errors),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Text cell, or [`Cell::Empty`] for an empty string.
    pub fn text(value: String) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    pub fn from_data(value: &Data) -> Self {
        match value {
            Data::Empty => Self::Empty,
            Data::Int(v) => Self::Number(*v as f64),
            Data::Float(v) => Self::Number(*v),
            Data::String(v) => Self::text(v.clone()),
            other => Self::text(other.to_string()),
        }
    }

    /// Interprets the cell as a genomic position. Spreadsheets store numbers as floats,
    /// so only non-negative integral values qualify.
    pub fn as_position(&self) -> Option<u64> {
        match self {
            Self::Number(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as u64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(v) => v.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// A header row plus data rows, the unit the spreadsheet writer works in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn from_output_rows(rows: Vec<OutputRow>) -> Self {
        Self {
            header: OUTPUT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows.into_iter().map(OutputRow::into_cells).collect(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
