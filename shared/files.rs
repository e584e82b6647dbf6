// ========================================================================================
//
//                     VCF TEXT SOURCES AND SINKS SHARED BY BOTH TOOLS
//
// ========================================================================================
//
// Both binaries read VCF text, either plain or gzip/BGZF compressed, and the merge step
// writes it back out. This module owns the record model and the line-level codec. It
// makes no attempt to validate INFO or FORMAT content beyond what the callers need.

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use itertools::Itertools;
use log::debug;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const MISSING_VALUE: &str = ".";
const MIN_RECORD_COLUMNS: usize = 8;
const ANNOTATION_KEY: &str = "ANN=";

#[derive(Debug, Error)]
pub enum VcfError {
    #[error("could not open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error while reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed record in {path} at line {line}: {message}")]
    MalformedRecord {
        path: String,
        line: usize,
        message: String,
    },
    #[error("I/O error while writing {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Identity of a record for merge purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub chromosome: String,
    pub position: u64,
    pub reference: String,
}

/// One data line of a VCF file.
///
/// Everything after the INFO column (FORMAT plus one column per sample) is kept
/// verbatim in `genotypes` so a record can be written back without loss.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub chromosome: String,
    pub position: u64,
    pub id: String,
    pub reference: String,
    pub alternates: Vec<String>,
    pub quality: Option<f64>,
    /// QUAL exactly as it appeared in the file. Written back in place of `quality`, so
    /// the two must be updated together.
    pub quality_text: String,
    pub filter: String,
    pub info: String,
    pub genotypes: Vec<String>,
}

impl VariantRecord {
    /// Parses a single tab-separated data line. The error is a bare message; the reader
    /// attaches the path and line number.
    pub fn parse(line: &str) -> Result<Self, String> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < MIN_RECORD_COLUMNS {
            return Err(format!(
                "expected at least {MIN_RECORD_COLUMNS} tab-separated columns, found {}",
                columns.len()
            ));
        }

        let position = columns[1]
            .parse::<u64>()
            .map_err(|e| format!("invalid POS '{}': {e}", columns[1]))?;

        let alternates = if columns[4] == MISSING_VALUE || columns[4].is_empty() {
            Vec::new()
        } else {
            columns[4].split(',').map(str::to_string).collect()
        };

        let quality = if columns[5] == MISSING_VALUE {
            None
        } else {
            Some(
                columns[5]
                    .parse::<f64>()
                    .map_err(|e| format!("invalid QUAL '{}': {e}", columns[5]))?,
            )
        };

        Ok(Self {
            chromosome: columns[0].to_string(),
            position,
            id: columns[2].to_string(),
            reference: columns[3].to_string(),
            alternates,
            quality,
            quality_text: columns[5].to_string(),
            filter: columns[6].to_string(),
            info: columns[7].to_string(),
            genotypes: columns[8..].iter().map(|c| c.to_string()).collect(),
        })
    }

    pub fn key(&self) -> VariantKey {
        VariantKey {
            chromosome: self.chromosome.clone(),
            position: self.position,
            reference: self.reference.clone(),
        }
    }

    /// Alternate alleles joined with commas, empty when the record has none.
    pub fn allele_string(&self) -> String {
        self.alternates.join(",")
    }

    /// The raw value of the `ANN` INFO key, if present.
    pub fn annotation_field(&self) -> Option<&str> {
        self.info
            .split(';')
            .find_map(|entry| entry.strip_prefix(ANNOTATION_KEY))
    }

    /// The individual annotation entries, in the order snpEff wrote them.
    pub fn annotations(&self) -> Vec<&str> {
        self.annotation_field()
            .map(|field| field.split(',').filter(|entry| !entry.is_empty()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for VariantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alternates = if self.alternates.is_empty() {
            MISSING_VALUE.to_string()
        } else {
            self.alternates.join(",")
        };
        let quality = if self.quality_text.is_empty() {
            MISSING_VALUE
        } else {
            self.quality_text.as_str()
        };
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chromosome,
            self.position,
            self.id,
            self.reference,
            alternates,
            quality,
            self.filter,
            self.info
        )?;
        if !self.genotypes.is_empty() {
            write!(f, "\t{}", self.genotypes.iter().join("\t"))?;
        }
        Ok(())
    }
}

// ========================================================================================
//                                       Reader
// ========================================================================================

type TextLines = Lines<Box<dyn BufRead + Send>>;

/// A lazily iterated VCF source. The header is consumed eagerly on open; records are
/// parsed one line at a time as the iterator is driven.
pub struct VcfReader {
    path: PathBuf,
    header: Vec<String>,
    lines: TextLines,
    pending: Option<(usize, String)>,
    line_number: usize,
}

impl VcfReader {
    pub fn open(path: &Path) -> Result<Self, VcfError> {
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|source| VcfError::Open {
            path: origin.clone(),
            source,
        })?;

        let mut buffered = BufReader::new(file);
        let compressed = buffered
            .fill_buf()
            .map_err(|source| VcfError::Read {
                path: origin.clone(),
                source,
            })?
            .starts_with(&GZIP_MAGIC);
        debug!("Opening {origin} (gzip: {compressed})");

        let inner: Box<dyn BufRead + Send> = if compressed {
            Box::new(BufReader::new(MultiGzDecoder::new(buffered)))
        } else {
            Box::new(buffered)
        };

        let mut reader = Self {
            path: path.to_path_buf(),
            header: Vec::new(),
            lines: inner.lines(),
            pending: None,
            line_number: 0,
        };
        reader.read_header()?;
        Ok(reader)
    }

    fn read_header(&mut self) -> Result<(), VcfError> {
        while let Some(line) = self.next_line()? {
            if line.starts_with('#') {
                self.header.push(line);
            } else if !line.trim().is_empty() {
                self.pending = Some((self.line_number, line));
                break;
            }
        }
        Ok(())
    }

    fn next_line(&mut self) -> Result<Option<String>, VcfError> {
        match self.lines.next() {
            Some(Ok(line)) => {
                self.line_number += 1;
                Ok(Some(line))
            }
            Some(Err(source)) => Err(VcfError::Read {
                path: self.path.display().to_string(),
                source,
            }),
            None => Ok(None),
        }
    }

    /// Meta-information lines followed by the `#CHROM` line, without line terminators.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    fn parse_line(&self, line_number: usize, line: &str) -> Result<VariantRecord, VcfError> {
        VariantRecord::parse(line).map_err(|message| VcfError::MalformedRecord {
            path: self.path.display().to_string(),
            line: line_number,
            message,
        })
    }
}

impl Iterator for VcfReader {
    type Item = Result<VariantRecord, VcfError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((line_number, line)) = self.pending.take() {
            return Some(self.parse_line(line_number, &line));
        }
        loop {
            match self.next_line() {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(self.parse_line(self.line_number, &line)),
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

// ========================================================================================
//                                       Writer
// ========================================================================================

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

/// Writes VCF text, gzip-compressed when the destination name ends in `.gz`.
pub struct VcfWriter {
    path: PathBuf,
    sink: Sink,
}

impl VcfWriter {
    pub fn create(path: &Path) -> Result<Self, VcfError> {
        let file = File::create(path).map_err(|source| VcfError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let buffered = BufWriter::new(file);
        let sink = if is_gzip_path(path) {
            Sink::Gzip(GzEncoder::new(buffered, Compression::default()))
        } else {
            Sink::Plain(buffered)
        };
        Ok(Self {
            path: path.to_path_buf(),
            sink,
        })
    }

    fn out(&mut self) -> &mut dyn Write {
        match &mut self.sink {
            Sink::Plain(w) => w,
            Sink::Gzip(w) => w,
        }
    }

    pub fn write_header(&mut self, header: &[String]) -> Result<(), VcfError> {
        for line in header {
            let result = writeln!(self.out(), "{line}");
            result.map_err(|source| write_error(&self.path, source))?;
        }
        Ok(())
    }

    pub fn write_record(&mut self, record: &VariantRecord) -> Result<(), VcfError> {
        let result = writeln!(self.out(), "{record}");
        result.map_err(|source| write_error(&self.path, source))
    }

    /// Flushes buffered output and writes the gzip trailer when compressing.
    pub fn finish(self) -> Result<(), VcfError> {
        let result = match self.sink {
            Sink::Plain(mut w) => w.flush(),
            Sink::Gzip(encoder) => encoder.finish().and_then(|mut w| w.flush()),
        };
        result.map_err(|source| write_error(&self.path, source))
    }
}

fn write_error(path: &Path, source: io::Error) -> VcfError {
    VcfError::Write {
        path: path.display().to_string(),
        source,
    }
}

pub fn is_gzip_path(path: &Path) -> bool {
    path.to_string_lossy().to_ascii_lowercase().ends_with(".gz")
}
