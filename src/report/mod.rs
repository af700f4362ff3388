//! Daily job-status reports.
//!
//! ## Key Components
//!
//! - [`DailyReport`] - the reconciled table for one day, with its TSV form
//! - [`DailyReportCache`] - builds a day's report once, then serves the
//!   stored copy
//! - [`StatusExport`] - writes the day's `status-YYYYMMDD.tsv` job listing
//!
//! Reports are stored as `YYYYMMDD.tsv` through [`crate::storage::ReportStorage`].

mod daily;
mod status;
mod table;

use thiserror::Error;

use crate::auth::AuthError;
use crate::ingest::FetchError;
use crate::storage::StorageError;

pub use daily::{DEFAULT_PAGE_SIZE, DailyReportCache};
pub use status::{
    STATUS_COLUMNS, StatusExport, StatusOutcome, StatusRow, status_key, status_rows, status_tsv,
};
pub use table::{COLUMNS, DailyReport, TableError, parse_report_date, report_key};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Stored report {key} is malformed: {source}")]
    Format { key: String, source: TableError },

    #[error("Report {0} disappeared after a concurrent write")]
    Vanished(String),
}
