//! Job status listing

use super::http::StorcycleClient;
use crate::auth::Token;
use crate::ingest::{FetchError, RawRecord, fetch_all};

/// Listing endpoint for job statuses
pub const JOB_STATUS_ENDPOINT: &str = "jobStatus";

impl StorcycleClient {
    /// Every `GET /jobStatus` row across all pages, unfiltered.
    ///
    /// `include_all` asks the server for the full history instead of only
    /// recent jobs.
    pub async fn job_statuses(
        &self,
        token: &Token,
        page_size: usize,
        include_all: bool,
    ) -> Result<Vec<RawRecord>, FetchError> {
        let params = [("includeAll".to_string(), include_all.to_string())];
        fetch_all(&self.pages(token), JOB_STATUS_ENDPOINT, &params, page_size).await
    }
}
