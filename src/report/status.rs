//! Per-day job status export, `status-YYYYMMDD.tsv`.
//!
//! One row per dataset (its latest backup job) with the job's display name,
//! raw job identifier, state and timestamps, sorted by job identifier.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

use super::ReportError;
use super::table::escape;
use crate::auth::TokenCache;
use crate::client::StorcycleClient;
use crate::ingest::{JobIdentifier, RawRecord, cell_text, select_latest};
use crate::storage::{PutOutcome, ReportStorage};

pub const STATUS_COLUMNS: [&str; 5] = ["name", "job", "state", "start", "completion"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub name: String,
    pub job: String,
    pub state: String,
    pub start: String,
    pub completion: String,
}

impl StatusRow {
    /// `name` falls back to the dataset id when the record carries none.
    pub fn from_record(id: &JobIdentifier, record: &RawRecord) -> Self {
        let field = |key: &str| record.get(key).map(cell_text).unwrap_or_default();

        let name = match field("name") {
            name if name.is_empty() => id.dataset_id.clone(),
            name => name,
        };

        Self {
            name,
            job: field("job"),
            state: field("state"),
            start: field("start"),
            completion: field("completion"),
        }
    }
}

/// Latest job of each dataset as status rows, ordered by job identifier.
pub fn status_rows(records: &[RawRecord]) -> Vec<StatusRow> {
    let (latest, _) = select_latest(records);

    let mut rows: Vec<StatusRow> = latest
        .iter()
        .map(|(id, record)| StatusRow::from_record(id, record))
        .collect();
    rows.sort_by(|a, b| a.job.cmp(&b.job));
    rows
}

pub fn status_tsv(rows: &[StatusRow]) -> String {
    let mut out = STATUS_COLUMNS.join("\t");
    out.push('\n');

    for row in rows {
        let cells = [&row.name, &row.job, &row.state, &row.start, &row.completion];
        let line: Vec<_> = cells.iter().map(|cell| escape(cell)).collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }

    out
}

/// `status-YYYYMMDD.tsv`
pub fn status_key(date: NaiveDate) -> String {
    format!("status-{}.tsv", date.format("%Y%m%d"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Written { key: String, rows: usize },
    AlreadyExported { key: String },
}

impl StatusOutcome {
    pub fn key(&self) -> &str {
        match self {
            StatusOutcome::Written { key, .. } | StatusOutcome::AlreadyExported { key } => key,
        }
    }
}

/// Writes a day's status export once; an existing export is left as is.
pub struct StatusExport {
    client: Arc<StorcycleClient>,
    tokens: Arc<TokenCache>,
    storage: ReportStorage,
    page_size: usize,
    include_all: bool,
}

impl StatusExport {
    pub fn new(client: Arc<StorcycleClient>, tokens: Arc<TokenCache>, storage: ReportStorage) -> Self {
        Self {
            client,
            tokens,
            storage,
            page_size: super::DEFAULT_PAGE_SIZE,
            include_all: true,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_include_all(mut self, include_all: bool) -> Self {
        self.include_all = include_all;
        self
    }

    pub async fn export(&self, date: NaiveDate) -> Result<StatusOutcome, ReportError> {
        let key = status_key(date);
        if self.storage.exists(&key).await? {
            info!(%date, key = %key, "Status export already present");
            return Ok(StatusOutcome::AlreadyExported { key });
        }

        let token = self.tokens.get_token().await?;
        let records = self
            .client
            .job_statuses(&token, self.page_size, self.include_all)
            .await?;
        let rows = status_rows(&records);

        match self.storage.create(&key, status_tsv(&rows).into_bytes()).await? {
            PutOutcome::Created => {
                info!(%date, key = %key, rows = rows.len(), "Wrote status export");
                Ok(StatusOutcome::Written {
                    key,
                    rows: rows.len(),
                })
            }
            PutOutcome::AlreadyExists => Ok(StatusOutcome::AlreadyExported { key }),
        }
    }
}
