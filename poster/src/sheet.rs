//! A CSV export of the submissions sheet.

use anyhow::{Context, Result, bail};
use common::record::ROW_WIDTH;
use std::path::{Path, PathBuf};

/// Column (0-based) the message permalink is written to: right of the job cells.
pub const LINK_COLUMN: usize = ROW_WIDTH;

pub struct Sheet {
    path: PathBuf,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open sheet {}", path.display()))?;

        let rows = reader
            .records()
            .map(|record| {
                record
                    .map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
                    .with_context(|| format!("Failed to read sheet {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// The cells of a 1-based sheet row, header included in the numbering.
    pub fn row(&self, number: usize) -> Result<&[String]> {
        if number == 0 {
            bail!("Sheet rows are numbered from 1");
        }
        self.rows
            .get(number - 1)
            .map(Vec::as_slice)
            .with_context(|| format!("Row {} is past the end of the sheet ({} rows)", number, self.len()))
    }

    /// The job cells of a row as a single-row range.
    pub fn range(&self, number: usize) -> Result<Vec<Vec<String>>> {
        let row = self.row(number)?;
        let end = row.len().min(ROW_WIDTH);
        Ok(vec![row[..end].to_vec()])
    }

    /// Stores `link` in the cell right of the row's job cells.
    pub fn write_link(&mut self, number: usize, link: &str) -> Result<()> {
        self.row(number)?;
        let row = &mut self.rows[number - 1];
        if row.len() <= LINK_COLUMN {
            row.resize(LINK_COLUMN + 1, String::new());
        }
        row[LINK_COLUMN] = link.to_string();
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to write sheet {}", self.path.display()))?;

        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Spreadsheet column letters for a 0-based column index (0 → A, 26 → AA).
pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1 notation for a single cell, e.g. `K3`.
pub fn cell_notation(number: usize, column: usize) -> String {
    format!("{}{number}", column_letters(column))
}

/// A1 notation for cells `0..width` of a 1-based row, e.g. `A3:J3`.
pub fn a1_notation(number: usize, width: usize) -> String {
    let last = column_letters(width.saturating_sub(1));
    format!("A{number}:{last}{number}")
}
