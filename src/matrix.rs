//! Category × year result matrix.

use serde::Serialize;
use std::io::{self, Write};

use crate::catalogue::Grouping;

/// One labelled row; `values[i]` belongs to `Matrix::years[i]`. `None` is a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixRow {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

impl MatrixRow {
    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    pub grouping: Grouping,
    pub indexed: bool,
    /// Column years, ascending.
    pub years: Vec<i32>,
    /// Rows in catalogue order.
    pub rows: Vec<MatrixRow>,
}

impl Matrix {
    pub fn year_index(&self, year: i32) -> Option<usize> {
        self.years.binary_search(&year).ok()
    }

    pub fn row(&self, label: &str) -> Option<&MatrixRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Cell value; `None` for a missing cell or an unknown label/year.
    pub fn value(&self, label: &str, year: i32) -> Option<f64> {
        let idx = self.year_index(year)?;
        self.row(label).and_then(|r| r.values[idx])
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.label.as_str())
    }

    pub fn is_all_missing(&self) -> bool {
        self.rows.iter().all(MatrixRow::is_all_missing)
    }

    /// Min and max over non-missing cells.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .flat_map(|r| r.values.iter().flatten().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Write as CSV: `category,<year>...`, missing cells left empty.
    pub fn write_csv<W: Write>(&self, mut w: W) -> io::Result<()> {
        write!(w, "category")?;
        for year in &self.years {
            write!(w, ",{}", year)?;
        }
        writeln!(w)?;
        for row in &self.rows {
            write!(w, "{}", csv_field(&row.label))?;
            for value in &row.values {
                match value {
                    Some(v) => write!(w, ",{}", v)?,
                    None => write!(w, ",")?,
                }
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

/// Cell text for on-screen tables.
pub fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "-".to_string(),
    }
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
