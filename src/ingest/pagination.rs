//! Offset pagination over StorCycle listing endpoints.
//!
//! The listing endpoints do not agree on where the page items live. The
//! envelope parser accepts, in order:
//! 1. a bare JSON array body
//! 2. `data` holding an array
//! 3. `data` holding an object, first key of [`ITEM_KEYS`] holding an array
//! 4. no `data` at all, first key of [`ITEM_KEYS`] at the top level
//!
//! Pagination stops on an empty page or once the reported total is reached.
//! A short page without a total does not end the run.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::RawRecord;
use crate::client::ClientError;

/// Conventional item-list keys, in lookup priority.
pub const ITEM_KEYS: &[&str] = &[
    "items",
    "results",
    "records",
    "rows",
    "jobStatuses",
    "jobStatus",
];

const OFFSET_KEY: &str = "ResultOffset";
const LIMIT_KEY: &str = "ResultLimit";
const TOTAL_KEYS: &[&str] = &["TotalResults", "total"];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("No item list in page envelope: {0}")]
    Schema(String),

    #[error("Pagination did not advance past offset {offset} (server reported offset {reported})")]
    PaginationStall { offset: u64, reported: u64 },
}

/// One page request against a listing endpoint.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<Value, FetchError>;
}

/// Normalized page envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEnvelope {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub total: Option<u64>,
    pub items: Vec<Value>,
}

impl PageEnvelope {
    pub fn parse(payload: Value) -> Result<Self, FetchError> {
        let mut object = match payload {
            Value::Array(items) => {
                return Ok(Self {
                    offset: None,
                    limit: None,
                    total: None,
                    items,
                });
            }
            Value::Object(object) => object,
            other => {
                return Err(FetchError::Schema(format!(
                    "expected object or array body, got {}",
                    json_type(&other)
                )));
            }
        };

        let offset = object.get(OFFSET_KEY).and_then(as_count);
        let limit = object.get(LIMIT_KEY).and_then(as_count);
        let total = TOTAL_KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(as_count));

        let items = match object.remove("data") {
            Some(Value::Array(items)) => items,
            Some(Value::Object(mut data)) => take_item_list(&mut data).ok_or_else(|| {
                FetchError::Schema(format!(
                    "no list inside 'data' (keys: {})",
                    data.keys().cloned().collect::<Vec<_>>().join(", ")
                ))
            })?,
            Some(other) => {
                return Err(FetchError::Schema(format!(
                    "'data' is neither list nor object: {}",
                    json_type(&other)
                )));
            }
            None => take_item_list(&mut object).ok_or_else(|| {
                FetchError::Schema(format!(
                    "no 'data' field and no conventional list key (keys: {})",
                    object.keys().cloned().collect::<Vec<_>>().join(", ")
                ))
            })?,
        };

        Ok(Self {
            offset,
            limit,
            total,
            items,
        })
    }
}

fn take_item_list(object: &mut serde_json::Map<String, Value>) -> Option<Vec<Value>> {
    let key = ITEM_KEYS
        .iter()
        .find(|key| matches!(object.get(**key), Some(Value::Array(_))))?;
    match object.remove(*key) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Non-negative integer, also when sent as a numeric string.
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fetch every page of `endpoint`, in increasing offset order.
///
/// `base_params` are appended after `skip` and `limit` on every request.
pub async fn fetch_all<S>(
    source: &S,
    endpoint: &str,
    base_params: &[(String, String)],
    page_size: usize,
) -> Result<Vec<RawRecord>, FetchError>
where
    S: PageSource + ?Sized,
{
    let mut records = Vec::new();
    let mut offset: u64 = 0;
    let mut total: Option<u64> = None;
    let mut pages = 0usize;
    let mut skipped = 0usize;

    loop {
        let mut query = Vec::with_capacity(base_params.len() + 2);
        query.push(("skip".to_string(), offset.to_string()));
        query.push(("limit".to_string(), page_size.to_string()));
        query.extend(base_params.iter().cloned());

        let envelope = PageEnvelope::parse(source.fetch_page(endpoint, &query).await?)?;
        pages += 1;

        if total.is_none() {
            total = envelope.total;
        }

        if envelope.items.is_empty() {
            debug!(endpoint, offset, "Empty page, pagination done");
            break;
        }

        let reported = envelope.offset.unwrap_or(offset);
        let next_offset = reported
            .checked_add(envelope.items.len() as u64)
            .ok_or_else(|| {
                FetchError::Schema(format!(
                    "reported offset {} plus {} items overflows",
                    reported,
                    envelope.items.len()
                ))
            })?;

        for item in envelope.items {
            match item {
                Value::Object(record) => records.push(record),
                _ => skipped += 1,
            }
        }

        debug!(
            endpoint,
            page = pages,
            offset,
            next_offset,
            limit = envelope.limit,
            total,
            fetched = records.len(),
            "Fetched page"
        );

        if total.is_some_and(|total| next_offset >= total) {
            break;
        }

        if next_offset <= offset {
            return Err(FetchError::PaginationStall { offset, reported });
        }

        offset = next_offset;
    }

    if skipped > 0 {
        warn!(endpoint, skipped, "Skipped non-object items in page bodies");
    }
    info!(endpoint, pages, records = records.len(), "Pagination complete");

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned page bodies and records the queries it saw.
    struct ScriptedSource {
        pages: Mutex<VecDeque<Value>>,
        queries: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Value>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn skips(&self) -> Vec<String> {
            self.queries
                .lock()
                .unwrap()
                .iter()
                .map(|q| q[0].1.clone())
                .collect()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(
            &self,
            _endpoint: &str,
            query: &[(String, String)],
        ) -> Result<Value, FetchError> {
            self.queries.lock().unwrap().push(query.to_vec());
            Ok(self.pages.lock().unwrap().pop_front().unwrap_or(json!([])))
        }
    }

    /// Always answers with two items at the same reported offset.
    struct EchoingSource;

    #[async_trait]
    impl PageSource for EchoingSource {
        async fn fetch_page(
            &self,
            _endpoint: &str,
            _query: &[(String, String)],
        ) -> Result<Value, FetchError> {
            Ok(json!({"ResultOffset": 0, "data": [{"job": "a-1"}, {"job": "a-2"}]}))
        }
    }

    fn jobs(range: std::ops::Range<u32>) -> Vec<Value> {
        range.map(|i| json!({"job": format!("ds{}-1", i)})).collect()
    }

    #[test]
    fn test_envelope_shapes() {
        let bare = PageEnvelope::parse(json!([{"job": "a-1"}])).unwrap();
        assert_eq!(bare.items.len(), 1);
        assert_eq!(bare.offset, None);

        let data_list = PageEnvelope::parse(json!({
            "ResultOffset": 10, "ResultLimit": 5, "TotalResults": 12,
            "data": [{"job": "a-1"}, {"job": "a-2"}]
        }))
        .unwrap();
        assert_eq!(data_list.offset, Some(10));
        assert_eq!(data_list.limit, Some(5));
        assert_eq!(data_list.total, Some(12));
        assert_eq!(data_list.items.len(), 2);

        let nested = PageEnvelope::parse(json!({
            "data": {"count": 3, "jobStatuses": [{"job": "a-1"}], "rows": "not a list"}
        }))
        .unwrap();
        assert_eq!(nested.items.len(), 1);

        let top_level = PageEnvelope::parse(json!({"items": [{"id": 1}], "total": "7"})).unwrap();
        assert_eq!(top_level.items.len(), 1);
        assert_eq!(top_level.total, Some(7));
    }

    #[test]
    fn test_nested_key_priority() {
        let page = PageEnvelope::parse(json!({
            "data": {"jobStatus": [1, 2, 3], "results": [1]}
        }))
        .unwrap();
        assert_eq!(page.items, vec![json!(1)]);
    }

    #[test]
    fn test_envelope_without_list_is_schema_error() {
        for payload in [
            json!({"data": {"count": 3}}),
            json!({"data": "oops"}),
            json!({"message": "ok"}),
            json!("just a string"),
        ] {
            assert!(matches!(
                PageEnvelope::parse(payload),
                Err(FetchError::Schema(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_fetch_all_stops_on_total() {
        let source = ScriptedSource::new(vec![
            json!({"ResultOffset": 0, "TotalResults": 5, "data": jobs(0..3)}),
            json!({"ResultOffset": 3, "TotalResults": 5, "data": jobs(3..5)}),
        ]);

        let records = fetch_all(&source, "jobStatus", &[], 3).await.unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(source.skips(), ["0", "3"]);
    }

    #[tokio::test]
    async fn test_short_page_without_total_keeps_going() {
        let source = ScriptedSource::new(vec![
            json!({"data": jobs(0..2)}),
            json!({"data": jobs(2..3)}),
            json!({"data": []}),
        ]);

        let records = fetch_all(&source, "jobStatus", &[], 500).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(source.skips(), ["0", "2", "3"]);
    }

    #[tokio::test]
    async fn test_reported_offset_drives_next_request() {
        let source = ScriptedSource::new(vec![
            json!({"ResultOffset": 100, "data": jobs(0..2)}),
            json!({"ResultOffset": 102, "data": []}),
        ]);

        fetch_all(&source, "jobStatus", &[], 2).await.unwrap();
        assert_eq!(source.skips(), ["0", "102"]);
    }

    #[tokio::test]
    async fn test_base_params_follow_skip_and_limit() {
        let source = ScriptedSource::new(vec![json!({"data": []})]);
        let params = [("includeAll".to_string(), "true".to_string())];

        let records = fetch_all(&source, "jobStatus", &params, 500).await.unwrap();
        assert!(records.is_empty());

        let queries = source.queries.lock().unwrap();
        let keys: Vec<&str> = queries[0].iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["skip", "limit", "includeAll"]);
        assert_eq!(queries[0][1].1, "500");
    }

    #[tokio::test]
    async fn test_echoed_offset_is_a_stall() {
        let result = fetch_all(&EchoingSource, "jobStatus", &[], 2).await;
        match result {
            Err(FetchError::PaginationStall { offset, reported }) => {
                assert_eq!(offset, 2);
                assert_eq!(reported, 0);
            }
            other => panic!("Expected PaginationStall, got {:?}", other.map(|r| r.len())),
        }
    }

    #[tokio::test]
    async fn test_overflowing_reported_offset_is_a_schema_error() {
        let source = ScriptedSource::new(vec![
            json!({"ResultOffset": u64::MAX, "data": [{"job": "a-1"}]}),
        ]);

        let result = fetch_all(&source, "jobStatus", &[], 10).await;
        assert!(matches!(result, Err(FetchError::Schema(_))));
    }

    #[tokio::test]
    async fn test_non_object_items_are_skipped() {
        let source = ScriptedSource::new(vec![
            json!({"TotalResults": 3, "data": [{"job": "a-1"}, 42, {"job": "b-1"}]}),
        ]);

        let records = fetch_all(&source, "jobStatus", &[], 10).await.unwrap();
        assert_eq!(records.len(), 2);
    }
}
