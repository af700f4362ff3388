//! Tab-separated daily report table.
//!
//! One header line followed by one line per entry, `\n` terminated. Cells
//! escape `\`, tab, CR and LF as `\\`, `\t`, `\r`, `\n` so every row stays on
//! one line and reloads to the same text.

use std::borrow::Cow;

use chrono::NaiveDate;
use thiserror::Error;

use crate::ingest::{JobState, ReconciledEntry};

pub const COLUMNS: [&str; 7] = [
    "bildid",
    "backup_idx",
    "state",
    "percentComplete",
    "start",
    "completion",
    "totalFiles",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("report is not valid UTF-8")]
    Encoding,

    #[error("report has no header line")]
    MissingHeader,

    #[error("report header lacks column '{0}'")]
    MissingColumn(&'static str),

    #[error("line {line}: expected {expected} cells, found {found}")]
    CellCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid backup index '{value}'")]
    InvalidIndex { line: usize, value: String },

    #[error("line {line}: invalid escape sequence")]
    InvalidEscape { line: usize },
}

/// The reconciled table for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub entries: Vec<ReconciledEntry>,
}

impl DailyReport {
    pub fn new(date: NaiveDate, entries: Vec<ReconciledEntry>) -> Self {
        Self { date, entries }
    }

    /// Storage key, `YYYYMMDD.tsv`
    pub fn key(&self) -> String {
        report_key(self.date)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_tsv(&self) -> String {
        let mut out = COLUMNS.join("\t");
        out.push('\n');

        for entry in &self.entries {
            let index = entry.backup_index.to_string();
            let cells = [
                entry.dataset_id.as_str(),
                index.as_str(),
                entry.state.as_str(),
                entry.percent_complete.as_str(),
                entry.start.as_str(),
                entry.completion.as_str(),
                entry.total_files.as_str(),
            ];
            for (i, cell) in cells.iter().enumerate() {
                if i > 0 {
                    out.push('\t');
                }
                out.push_str(&escape(cell));
            }
            out.push('\n');
        }

        out
    }

    pub fn from_bytes(date: NaiveDate, bytes: &[u8]) -> Result<Self, TableError> {
        let text = std::str::from_utf8(bytes).map_err(|_| TableError::Encoding)?;
        Self::from_tsv(date, text)
    }

    /// Columns are located by header name; extra columns are ignored.
    pub fn from_tsv(date: NaiveDate, text: &str) -> Result<Self, TableError> {
        let mut lines = text.lines();
        let header: Vec<&str> = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or(TableError::MissingHeader)?
            .split('\t')
            .collect();

        let mut positions = [0usize; COLUMNS.len()];
        for (slot, column) in positions.iter_mut().zip(COLUMNS) {
            *slot = header
                .iter()
                .position(|name| *name == column)
                .ok_or(TableError::MissingColumn(column))?;
        }

        let mut entries = Vec::new();
        for (index, line) in lines.enumerate() {
            let line_no = index + 2;
            if line.is_empty() {
                continue;
            }

            let raw: Vec<&str> = line.split('\t').collect();
            if raw.len() != header.len() {
                return Err(TableError::CellCount {
                    line: line_no,
                    expected: header.len(),
                    found: raw.len(),
                });
            }
            let cell = |column: usize| {
                unescape(raw[positions[column]])
                    .ok_or(TableError::InvalidEscape { line: line_no })
            };

            let backup_index = cell(1)?;
            let backup_index = backup_index
                .parse()
                .map_err(|_| TableError::InvalidIndex {
                    line: line_no,
                    value: backup_index.clone(),
                })?;

            entries.push(ReconciledEntry {
                dataset_id: cell(0)?,
                backup_index,
                state: JobState::from(cell(2)?.as_str()),
                percent_complete: cell(3)?,
                start: cell(4)?,
                completion: cell(5)?,
                total_files: cell(6)?,
            });
        }

        Ok(Self { date, entries })
    }
}

/// `YYYYMMDD.tsv`
pub fn report_key(date: NaiveDate) -> String {
    format!("{}.tsv", date.format("%Y%m%d"))
}

/// Parse an 8-digit `YYYYMMDD` date.
pub fn parse_report_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}

pub(super) fn escape(cell: &str) -> Cow<'_, str> {
    if !cell.contains(['\\', '\t', '\n', '\r']) {
        return Cow::Borrowed(cell);
    }

    let mut out = String::with_capacity(cell.len() + 4);
    for c in cell.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

fn unescape(cell: &str) -> Option<String> {
    let mut out = String::with_capacity(cell.len());
    let mut chars = cell.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            _ => return None,
        }
    }
    Some(out)
}
