//! Job-status ingestion: paginated fetching and reconciliation.
//!
//! ## Key Components
//!
//! - [`PageSource`] - one page request; implemented over HTTP by
//!   [`crate::client::BearerPages`]
//! - [`fetch_all`] - walks every page and normalizes the envelope shapes
//! - [`reconcile`] - reduces raw records to the latest backup per dataset
//!
//! ## Example
//!
//! ```rust,ignore
//! let records = fetch_all(&client.pages(&token), "jobStatus", &params, 500).await?;
//! let entries = reconcile(&records);
//! ```

mod pagination;
mod reconcile;
mod types;

pub use pagination::{FetchError, ITEM_KEYS, PageEnvelope, PageSource, fetch_all};
pub use reconcile::{
    EXCLUDED_JOB_PATTERNS, ReconcileStats, is_excluded, reconcile, reconcile_with_stats,
    select_latest,
};
pub use types::{
    IdentifierError, JobIdentifier, JobState, RawRecord, ReconciledEntry, cell_text,
};
