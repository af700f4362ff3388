use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One server-reported job as returned by the listing endpoint.
///
/// Only `job` and `state` are interpreted; everything else is passed through.
pub type RawRecord = Map<String, Value>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("job identifier has no '-' separator: {0}")]
    MissingSeparator(String),

    #[error("job identifier has an empty dataset part: {0}")]
    EmptyDataset(String),

    #[error("job identifier suffix is not a backup index: {0}")]
    InvalidIndex(String),
}

/// `<datasetId>-<backupIndex>`, split at the rightmost hyphen so that
/// hyphenated dataset ids survive intact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobIdentifier {
    pub dataset_id: String,
    pub backup_index: u64,
}

impl FromStr for JobIdentifier {
    type Err = IdentifierError;

    fn from_str(job: &str) -> Result<Self, Self::Err> {
        let (dataset, index) = job
            .rsplit_once('-')
            .ok_or_else(|| IdentifierError::MissingSeparator(job.to_string()))?;

        if dataset.is_empty() {
            return Err(IdentifierError::EmptyDataset(job.to_string()));
        }
        // u64::from_str would also accept a leading '+'
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdentifierError::InvalidIndex(job.to_string()));
        }
        let backup_index = index
            .parse()
            .map_err(|_| IdentifierError::InvalidIndex(job.to_string()))?;

        Ok(Self {
            dataset_id: dataset.to_string(),
            backup_index,
        })
    }
}

impl fmt::Display for JobIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.dataset_id, self.backup_index)
    }
}

/// Job state as reported by StorCycle. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobState {
    Failed,
    Canceled,
    Completed,
    Active,
    Other(String),
}

impl JobState {
    /// Report ordering: Failed, Canceled, Completed, Active, then anything else.
    pub fn rank(&self) -> u8 {
        match self {
            JobState::Failed => 0,
            JobState::Canceled => 1,
            JobState::Completed => 2,
            JobState::Active => 3,
            JobState::Other(_) => 4,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobState::Failed => "Failed",
            JobState::Canceled => "Canceled",
            JobState::Completed => "Completed",
            JobState::Active => "Active",
            JobState::Other(other) => other.as_str(),
        }
    }
}

impl From<&str> for JobState {
    fn from(value: &str) -> Self {
        match value {
            "Failed" => JobState::Failed,
            "Canceled" => JobState::Canceled,
            "Completed" => JobState::Completed,
            "Active" => JobState::Active,
            other => JobState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The latest backup of one dataset, as it appears in the daily report.
///
/// Pass-through fields hold their rendered table-cell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledEntry {
    pub dataset_id: String,
    pub backup_index: u64,
    pub state: JobState,
    pub percent_complete: String,
    pub start: String,
    pub completion: String,
    pub total_files: String,
}

impl ReconciledEntry {
    pub fn from_record(id: JobIdentifier, record: &RawRecord) -> Self {
        let field = |key: &str| record.get(key).map(cell_text).unwrap_or_default();

        Self {
            dataset_id: id.dataset_id,
            backup_index: id.backup_index,
            state: JobState::from(field("state").as_str()),
            percent_complete: field("percentComplete"),
            start: field("start"),
            completion: field("completion"),
            total_files: field("totalFiles"),
        }
    }
}

/// Text form of an opaque JSON value: strings unquoted, null empty,
/// composites as compact JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_simple_identifier() {
        let id: JobIdentifier = "siteA-2".parse().unwrap();
        assert_eq!(id.dataset_id, "siteA");
        assert_eq!(id.backup_index, 2);
    }

    #[test]
    fn test_parse_uses_rightmost_hyphen() {
        let id: JobIdentifier = "proj-alpha-7".parse().unwrap();
        assert_eq!(id.dataset_id, "proj-alpha");
        assert_eq!(id.backup_index, 7);

        let id: JobIdentifier = "a-b-c-0012".parse().unwrap();
        assert_eq!(id.dataset_id, "a-b-c");
        assert_eq!(id.backup_index, 12);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            "nohyphen".parse::<JobIdentifier>(),
            Err(IdentifierError::MissingSeparator(_))
        ));
        assert!(matches!(
            "-5".parse::<JobIdentifier>(),
            Err(IdentifierError::EmptyDataset(_))
        ));
        for bad in ["siteA-", "siteA-x1", "siteA-+3", "siteA-99999999999999999999999"] {
            assert!(
                matches!(bad.parse::<JobIdentifier>(), Err(IdentifierError::InvalidIndex(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_identifier_display() {
        let id: JobIdentifier = "proj-alpha-7".parse().unwrap();
        assert_eq!(id.to_string(), "proj-alpha-7");
    }

    #[test]
    fn test_state_rank_order() {
        let states: Vec<JobState> = ["Active", "Completed", "Paused", "Canceled", "Failed"]
            .into_iter()
            .map(JobState::from)
            .collect();
        let mut ranked = states.clone();
        ranked.sort_by_key(JobState::rank);

        let names: Vec<&str> = ranked.iter().map(JobState::as_str).collect();
        assert_eq!(names, ["Failed", "Canceled", "Completed", "Active", "Paused"]);
    }

    #[test]
    fn test_entry_from_record_renders_cells() {
        let record = json!({
            "job": "siteA-3",
            "state": "Completed",
            "percentComplete": 100,
            "start": "2026-01-05T01:00:00Z",
            "completion": null,
            "totalFiles": 1234,
            "categories": ["x"]
        });
        let record = record.as_object().unwrap();

        let entry = ReconciledEntry::from_record("siteA-3".parse().unwrap(), record);
        assert_eq!(entry.state, JobState::Completed);
        assert_eq!(entry.percent_complete, "100");
        assert_eq!(entry.start, "2026-01-05T01:00:00Z");
        assert_eq!(entry.completion, "");
        assert_eq!(entry.total_files, "1234");
    }
}
