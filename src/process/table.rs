// src/process/table.rs

use std::{fmt, io::Read};
use tracing::debug;

use crate::error::{Error, Result};

pub const CITY_COLUMN: &str = "City";
pub const YEAR_COLUMN: &str = "Year";

/// A single cell after column-kind inference.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) | Value::Null => None,
        }
    }

    fn parse(raw: &str, kind: ColumnKind) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match kind {
            ColumnKind::Int => trimmed.parse().map(Value::Int).unwrap_or(Value::Null),
            ColumnKind::Float => trimmed.parse().map(Value::Float).unwrap_or(Value::Null),
            ColumnKind::Text => Value::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            // keep "2.0" rather than "2" so float columns stay float on re-read
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{:.1}", x)
            }
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
            Value::Null => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
    Text,
}

/// Int if every non-empty cell is an integer, Float if every one is a
/// finite number, Text otherwise. A column of empty cells stays Int.
pub fn infer_kind<'a>(cells: impl IntoIterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Int;
    for cell in cells.into_iter().map(str::trim).filter(|c| !c.is_empty()) {
        if kind == ColumnKind::Int && cell.parse::<i64>().is_ok() {
            continue;
        }
        // `inf` / `NaN` tokens stay text so they are written back verbatim
        if cell.parse::<f64>().map_or(false, f64::is_finite) {
            kind = ColumnKind::Float;
            continue;
        }
        return ColumnKind::Text;
    }
    kind
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// One emissions row. `extra` holds every column other than City and Year,
/// in source order, aligned with [`EmissionTable::extra_columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionRecord {
    pub city: String,
    /// `None` when the cell is blank or not an integral number; such rows
    /// never pass a [`RegionFilter`](super::RegionFilter).
    pub year: Option<i32>,
    pub extra: Vec<Value>,
}

/// Ordered emissions records plus the source column layout.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionTable {
    columns: Vec<Column>,
    city_col: usize,
    year_col: usize,
    records: Vec<EmissionRecord>,
}

impl EmissionTable {
    /// Parse a comma-delimited table with a header row. Requires `City` and
    /// `Year` columns; individual cells are not validated.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::ArchiveFormat(format!("CSV header: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| Error::Schema(format!("missing `{}` column (have {:?})", name, headers)))
        };
        let city_col = find(CITY_COLUMN)?;
        let year_col = find(YEAR_COLUMN)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| Error::ArchiveFormat(format!("CSV parse error: {}", e)))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if record.len() > headers.len() {
                return Err(Error::ArchiveFormat(format!(
                    "line {} has {} fields, header has {}",
                    line,
                    record.len(),
                    headers.len()
                )));
            }
            rows.push((line, record));
        }

        let columns: Vec<Column> = headers
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column {
                kind: infer_kind(rows.iter().map(|(_, r)| r.get(i).unwrap_or(""))),
                name,
            })
            .collect();

        let mut records = Vec::with_capacity(rows.len());
        for (line, row) in &rows {
            let cell = |i: usize| row.get(i).unwrap_or("");
            let year = parse_year(cell(year_col));
            if year.is_none() {
                debug!(line, value = cell(year_col), "unparseable year");
            }
            let extra = columns
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != city_col && *i != year_col)
                .map(|(i, c)| Value::parse(cell(i), c.kind))
                .collect();
            records.push(EmissionRecord {
                city: cell(city_col).to_string(),
                year,
                extra,
            });
        }

        debug!(columns = columns.len(), rows = records.len(), "parsed table");
        Ok(Self {
            columns,
            city_col,
            year_col,
            records,
        })
    }

    pub fn from_csv(text: &str) -> Result<Self> {
        Self::from_reader(text.as_bytes())
    }

    /// Same layout, different rows.
    pub(crate) fn with_records(&self, records: Vec<EmissionRecord>) -> Self {
        Self {
            columns: self.columns.clone(),
            city_col: self.city_col,
            year_col: self.year_col,
            records,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn header(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn extra_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.city_col && *i != self.year_col)
            .map(|(_, c)| c)
    }

    pub fn records(&self) -> &[EmissionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Named non-City/Year field of `record`.
    pub fn value<'r>(&self, record: &'r EmissionRecord, name: &str) -> Option<&'r Value> {
        let idx = self.extra_columns().position(|c| c.name == name)?;
        record.extra.get(idx)
    }

    /// Named numeric field of `record`.
    pub fn metric(&self, record: &EmissionRecord, name: &str) -> Option<f64> {
        self.value(record, name).and_then(Value::as_f64)
    }

    /// Cells of `record` rendered in source column order.
    pub fn row_fields(&self, record: &EmissionRecord) -> Vec<String> {
        let mut extra = record.extra.iter();
        (0..self.columns.len())
            .map(|i| {
                if i == self.city_col {
                    record.city.clone()
                } else if i == self.year_col {
                    record.year.map(|y| y.to_string()).unwrap_or_default()
                } else {
                    extra.next().map(Value::to_string).unwrap_or_default()
                }
            })
            .collect()
    }
}

fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 => Some(f as i32),
        _ => None,
    }
}
