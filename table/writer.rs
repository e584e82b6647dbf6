//! Spreadsheet output and input.
//!
//! Small tables are written in fixed-size batches so progress can be reported between
//! them; very large ones skip progress reporting entirely. A failure part-way through
//! leaves no usable file and the whole write must be repeated.

use calamine::{Reader, Xlsx, open_workbook};
use log::debug;
use simple_excel_writer::{Row, Workbook};
use std::path::Path;

use crate::pipeline::TableError;
use crate::progress::{ProgressObserver, ProgressStage};
use crate::types::{Cell, Table};

/// Above this many rows the table is written without progress feedback.
pub const LARGE_TABLE_ROWS: usize = 100_000;
/// Rows appended between two progress updates.
pub const WRITE_BATCH_ROWS: usize = 1_000;
pub const SHEET_NAME: &str = "Sheet1";

fn excel_row(cells: &[Cell]) -> Row {
    let mut row = Row::new();
    for cell in cells {
        match cell {
            Cell::Empty => row.add_cell(()),
            Cell::Number(value) => row.add_cell(*value),
            Cell::Text(value) => row.add_cell(value.as_str()),
        }
    }
    row
}

fn header_row(header: &[String]) -> Row {
    let mut row = Row::new();
    for title in header {
        row.add_cell(title.as_str());
    }
    row
}

pub fn write_table(
    path: &Path,
    table: &Table,
    progress: &dyn ProgressObserver,
) -> Result<(), TableError> {
    let target = path.to_str().ok_or_else(|| TableError::NonUtf8Path {
        path: path.to_path_buf(),
    })?;
    let write_error = |source| TableError::Write {
        path: target.to_string(),
        source,
    };

    let mut workbook = Workbook::create(target);
    let mut sheet = workbook.create_sheet(SHEET_NAME);
    let large = table.len() > LARGE_TABLE_ROWS;
    debug!(
        "Writing {} rows to {target} ({})",
        table.len(),
        if large { "direct" } else { "batched" }
    );

    workbook
        .write_sheet(&mut sheet, |writer| {
            writer.append_row(header_row(&table.header))?;
            if large {
                for cells in &table.rows {
                    writer.append_row(excel_row(cells))?;
                }
                return Ok(());
            }

            progress.on_stage_start(ProgressStage::Rows, table.len());
            for batch in table.rows.chunks(WRITE_BATCH_ROWS) {
                for cells in batch {
                    writer.append_row(excel_row(cells))?;
                }
                progress.on_stage_advance(ProgressStage::Rows, batch.len());
            }
            progress.on_stage_finish(ProgressStage::Rows);
            Ok(())
        })
        .map_err(write_error)?;
    workbook.close().map_err(write_error)?;
    Ok(())
}

/// Reads the first worksheet; its first row becomes the header.
pub fn read_table(path: &Path) -> Result<Table, TableError> {
    let origin = path.display().to_string();
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|source| TableError::Read {
        path: origin.clone(),
        source,
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TableError::NoWorksheet {
            path: origin.clone(),
        })?
        .map_err(|source| TableError::Read {
            path: origin.clone(),
            source,
        })?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .map(|cells| cells.iter().map(|c| Cell::from_data(c).as_text()).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|cells| cells.iter().map(Cell::from_data).collect())
        .collect();
    Ok(Table { header, rows })
}
