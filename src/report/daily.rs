use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::ReportError;
use super::table::{DailyReport, report_key};
use crate::auth::TokenCache;
use crate::client::StorcycleClient;
use crate::ingest::reconcile_with_stats;
use crate::observability::IngestMetrics;
use crate::storage::{PutOutcome, ReportStorage};

pub const DEFAULT_PAGE_SIZE: usize = 500;

/// One reconciled report per calendar day, built at most once.
///
/// A day whose report is already stored is answered from storage without
/// touching the network. Builds are serialized in-process, and the stored
/// file is created atomically so two processes cannot both publish one.
pub struct DailyReportCache {
    client: Arc<StorcycleClient>,
    tokens: Arc<TokenCache>,
    storage: ReportStorage,
    page_size: usize,
    include_all: bool,
    metrics: Arc<IngestMetrics>,
    build_lock: Mutex<()>,
}

impl DailyReportCache {
    pub fn new(client: Arc<StorcycleClient>, tokens: Arc<TokenCache>, storage: ReportStorage) -> Self {
        Self {
            client,
            tokens,
            storage,
            page_size: DEFAULT_PAGE_SIZE,
            include_all: true,
            metrics: Arc::new(IngestMetrics::new()),
            build_lock: Mutex::new(()),
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

    pub fn with_metrics(mut self, metrics: Arc<IngestMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &IngestMetrics {
        &self.metrics
    }

    pub fn storage(&self) -> &ReportStorage {
        &self.storage
    }

    /// Return the stored report for `date`, building and storing it first
    /// if this is the first request for that day.
    ///
    /// On any failure nothing is stored.
    pub async fn get_or_build(&self, date: NaiveDate) -> Result<DailyReport, ReportError> {
        let _guard = self.build_lock.lock().await;
        let key = report_key(date);

        if let Some(report) = self.load(date, &key).await? {
            self.metrics.report_loaded();
            info!(%date, key = %key, entries = report.len(), "Loaded stored daily report");
            return Ok(report);
        }

        let report = self.build(date).await?;
        let body = report.to_tsv().into_bytes();

        match self.storage.create(&key, body).await? {
            PutOutcome::Created => {
                self.metrics.report_built();
                info!(%date, key = %key, entries = report.len(), "Built daily report");
                Ok(report)
            }
            PutOutcome::AlreadyExists => {
                // another process published first; its file is authoritative
                warn!(%date, key = %key, "Daily report stored concurrently, using stored copy");
                let stored = self
                    .load(date, &key)
                    .await?
                    .ok_or_else(|| ReportError::Vanished(key.clone()))?;
                self.metrics.report_loaded();
                Ok(stored)
            }
        }
    }

    async fn load(&self, date: NaiveDate, key: &str) -> Result<Option<DailyReport>, ReportError> {
        let Some(bytes) = self.storage.load(key).await? else {
            return Ok(None);
        };
        DailyReport::from_bytes(date, &bytes)
            .map(Some)
            .map_err(|source| ReportError::Format {
                key: key.to_string(),
                source,
            })
    }

    async fn build(&self, date: NaiveDate) -> Result<DailyReport, ReportError> {
        let token = self.tokens.get_token().await?;
        let records = self
            .client
            .job_statuses(&token, self.page_size, self.include_all)
            .await?;
        self.metrics.records_fetched(records.len());

        let (entries, stats) = reconcile_with_stats(&records);
        self.metrics.records_dropped(stats.excluded + stats.malformed);

        Ok(DailyReport::new(date, entries))
    }
}
