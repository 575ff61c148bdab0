//! Quota report line parser.
//!
//! Turns one delimited line into a [`QuotaRecord`], or rejects it. Report
//! headers, separators and malformed rows are expected noise, so rejection
//! is a normal outcome rather than an error.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Category, QuotaRecord};

/// How a line is split into columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// Split on a single character; empty fields are kept.
    Char(char),
    /// Split on runs of whitespace, as the raw report is laid out.
    Whitespace,
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::Char('|')
    }
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "whitespace" {
            return Ok(Delimiter::Whitespace);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Delimiter::Char(c)),
            _ => Err(format!(
                "delimiter must be a single character or \"whitespace\", got {s:?}"
            )),
        }
    }
}

/// What to do with a numeric column that does not hold a usable number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    /// Drop the whole line.
    #[default]
    Reject,
    /// Keep the line and read the column as 0.
    Zero,
}

/// Where a field sits in a split line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    /// Zero-based position from the start of the line.
    Index(usize),
    /// `offset` fields past the first field equal to `after`. Used for the
    /// file-limit half of a report row, whose position moves when the
    /// block grace column spans several words ("6 days").
    After {
        after: String,
        #[serde(default)]
        offset: usize,
    },
}

impl Column {
    fn fixed_index(&self) -> Option<usize> {
        match self {
            Column::Index(idx) => Some(*idx),
            Column::After { .. } => None,
        }
    }

    fn resolve(&self, fields: &[&str]) -> Option<usize> {
        match self {
            Column::Index(idx) => Some(*idx),
            Column::After { after, offset } => fields
                .iter()
                .position(|f| *f == after.as_str())
                .map(|pos| pos + 1 + offset),
        }
    }
}

/// Positional layout of a report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnMap {
    pub name: Column,
    pub size: Column,
    pub quota: Column,
    pub inodes: Column,
    #[serde(default)]
    pub category: Option<Column>,
    /// Exact column count. When unset, a line needs enough columns to
    /// cover every fixed index.
    #[serde(default)]
    pub columns: Option<usize>,
}

impl ColumnMap {
    /// Smallest column count that covers every fixed index.
    pub fn min_columns(&self) -> usize {
        [&self.name, &self.size, &self.quota, &self.inodes]
            .into_iter()
            .chain(self.category.as_ref())
            .filter_map(Column::fixed_index)
            .max()
            .map_or(0, |idx| idx + 1)
    }

    fn arity_matches(&self, count: usize) -> bool {
        let covered = count >= self.min_columns();
        match self.columns {
            Some(exact) => covered && count == exact,
            None => covered,
        }
    }
}

/// Everything the parser needs to read one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFormat {
    pub delimiter: Delimiter,
    pub columns: ColumnMap,
    pub numeric: NumericPolicy,
}

/// Why a line produced no record.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Blank,
    Arity { expected: String, got: usize },
    MissingColumn(&'static str),
    EmptyName,
    Category(String),
    Numeric { column: &'static str, value: String },
}

/// Parse one line, returning `None` for anything that is not a quota row.
pub fn parse_line(line: &str, format: &LineFormat) -> Option<QuotaRecord> {
    try_parse_line(line, format).ok()
}

/// Parse one line, reporting why it was rejected.
pub fn try_parse_line(line: &str, format: &LineFormat) -> Result<QuotaRecord, Rejection> {
    if line.trim().is_empty() {
        return Err(Rejection::Blank);
    }

    let fields: Vec<&str> = match format.delimiter {
        Delimiter::Char(c) => line.split(c).map(str::trim).collect(),
        Delimiter::Whitespace => line.split_whitespace().collect(),
    };

    let map = &format.columns;
    if !map.arity_matches(fields.len()) {
        let expected = match map.columns {
            Some(exact) => exact.to_string(),
            None => format!("at least {}", map.min_columns()),
        };
        return Err(Rejection::Arity {
            expected,
            got: fields.len(),
        });
    }

    let field = |column: &Column, label: &'static str| {
        column
            .resolve(&fields)
            .and_then(|idx| fields.get(idx).copied())
            .ok_or(Rejection::MissingColumn(label))
    };

    let name = field(&map.name, "name")?;
    if name.is_empty() {
        return Err(Rejection::EmptyName);
    }

    let category = match &map.category {
        Some(column) => Some(
            field(column, "category")?
                .parse::<Category>()
                .map_err(|e| Rejection::Category(e.0))?,
        ),
        None => None,
    };

    let size = number(field(&map.size, "size")?, "size", format.numeric)?;
    let quota = number(field(&map.quota, "quota")?, "quota", format.numeric)?;
    let inodes = number(field(&map.inodes, "inodes")?, "inodes", format.numeric)?;

    Ok(QuotaRecord::new(name, category, size, quota, inodes))
}

/// Read a non-negative, finite number under the given policy.
fn number(raw: &str, column: &'static str, policy: NumericPolicy) -> Result<f64, Rejection> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => match policy {
            NumericPolicy::Zero => Ok(0.0),
            NumericPolicy::Reject => Err(Rejection::Numeric {
                column,
                value: raw.to_string(),
            }),
        },
    }
}
