//! Reduce raw job records to one entry per dataset: the latest backup.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde_json::Value;
use tracing::{debug, info};

use super::types::{JobIdentifier, RawRecord, ReconciledEntry};

/// Maintenance and housekeeping jobs never reported, matched as
/// case-insensitive substrings of the job identifier.
pub const EXCLUDED_JOB_PATTERNS: &[&str] = &[
    "Daily-Storcycle-Database-Backup",
    "test",
    "Scan",
    "Daily",
    "Restore",
];

/// Counters for one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileStats {
    pub input: usize,
    pub excluded: usize,
    pub malformed: usize,
    pub superseded: usize,
    pub output: usize,
}

pub fn is_excluded(job: &str) -> bool {
    let job = job.to_lowercase();
    EXCLUDED_JOB_PATTERNS
        .iter()
        .any(|pattern| job.contains(&pattern.to_lowercase()))
}

pub fn reconcile(records: &[RawRecord]) -> Vec<ReconciledEntry> {
    reconcile_with_stats(records).0
}

/// Filter, parse, keep the highest backup index per dataset, and order by
/// state priority. Bad records are dropped and counted, never fatal.
pub fn reconcile_with_stats(records: &[RawRecord]) -> (Vec<ReconciledEntry>, ReconcileStats) {
    let (latest, stats) = select_latest(records);

    let mut entries: Vec<ReconciledEntry> = latest
        .into_iter()
        .map(|(id, record)| ReconciledEntry::from_record(id, record))
        .collect();
    entries.sort_by_key(|entry| entry.state.rank());

    info!(
        input = stats.input,
        excluded = stats.excluded,
        malformed = stats.malformed,
        superseded = stats.superseded,
        output = stats.output,
        "Reconciled job records"
    );

    (entries, stats)
}

/// The record of the latest backup of each dataset, in dataset order.
///
/// Excluded and malformed records are dropped. Between equal backup indexes
/// the later record in stable job order wins.
pub fn select_latest(records: &[RawRecord]) -> (Vec<(JobIdentifier, &RawRecord)>, ReconcileStats) {
    let mut stats = ReconcileStats {
        input: records.len(),
        ..ReconcileStats::default()
    };

    let mut kept: Vec<(&str, &RawRecord)> = Vec::with_capacity(records.len());
    for record in records {
        match record.get("job") {
            Some(Value::String(job)) if is_excluded(job) => stats.excluded += 1,
            Some(Value::String(job)) => kept.push((job.as_str(), record)),
            _ => stats.malformed += 1,
        }
    }

    // stable: equal job strings keep their input order
    kept.sort_by(|a, b| a.0.cmp(b.0));

    let mut latest: BTreeMap<String, (JobIdentifier, &RawRecord)> = BTreeMap::new();
    for (job, record) in kept {
        let id: JobIdentifier = match job.parse() {
            Ok(id) => id,
            Err(e) => {
                debug!(job, error = %e, "Dropping record with unparseable job identifier");
                stats.malformed += 1;
                continue;
            }
        };

        match latest.entry(id.dataset_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert((id, record));
            }
            Entry::Occupied(mut slot) => {
                stats.superseded += 1;
                // ties go to the later record
                if id.backup_index >= slot.get().0.backup_index {
                    debug!(kept = %id, dropped = %slot.get().0, "Superseded older backup");
                    slot.insert((id, record));
                } else {
                    debug!(kept = %slot.get().0, dropped = %id, "Superseded older backup");
                }
            }
        }
    }

    let selected: Vec<(JobIdentifier, &RawRecord)> = latest.into_values().collect();
    stats.output = selected.len();

    (selected, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::JobState;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<RawRecord> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn summary(entries: &[ReconciledEntry]) -> Vec<(String, u64, String)> {
        entries
            .iter()
            .map(|e| (e.dataset_id.clone(), e.backup_index, e.state.to_string()))
            .collect()
    }

    #[test]
    fn test_three_record_scenario() {
        let input = records(vec![
            json!({"job": "siteA-1", "state": "Completed"}),
            json!({"job": "siteA-2", "state": "Failed"}),
            json!({"job": "Daily-Storcycle-Database-Backup-9", "state": "Completed"}),
        ]);

        let (entries, stats) = reconcile_with_stats(&input);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].dataset_id, "siteA");
        assert_eq!(entries[0].backup_index, 2);
        assert_eq!(entries[0].state, JobState::Failed);
        assert_eq!(stats.excluded, 1);
        assert_eq!(stats.superseded, 1);
    }

    #[test]
    fn test_denylist_is_case_insensitive() {
        for job in [
            "bigRESTORE-1",
            "my-TEST-dataset-3",
            "scan-only-2",
            "dailyjob-4",
            "restore-5",
        ] {
            assert!(is_excluded(job), "{} should be excluded", job);
        }
        assert!(!is_excluded("ace1234-7"));

        let input = records(vec![
            json!({"job": "abc-Restore-1", "state": "Completed"}),
            json!({"job": "keep-1", "state": "Completed"}),
        ]);
        let entries = reconcile(&input);
        assert_eq!(summary(&entries), [("keep".to_string(), 1, "Completed".to_string())]);
    }

    #[test]
    fn test_max_backup_index_wins_numerically() {
        // "ds-10" sorts before "ds-9" as text; the numeric index decides
        let input = records(vec![
            json!({"job": "ds-9", "state": "Failed"}),
            json!({"job": "ds-10", "state": "Completed"}),
            json!({"job": "ds-2", "state": "Failed"}),
        ]);

        let entries = reconcile(&input);
        assert_eq!(summary(&entries), [("ds".to_string(), 10, "Completed".to_string())]);
    }

    #[test]
    fn test_equal_index_keeps_last_in_sorted_order() {
        // both parse to (ds, 1); "ds-1" sorts after "ds-01"
        let input = records(vec![
            json!({"job": "ds-1", "state": "Active"}),
            json!({"job": "ds-01", "state": "Failed"}),
        ]);

        let entries = reconcile(&input);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].state, JobState::Active);
    }

    #[test]
    fn test_malformed_records_are_dropped() {
        let input = records(vec![
            json!({"state": "Failed"}),
            json!({"job": 17, "state": "Failed"}),
            json!({"job": "no-index-here", "state": "Failed"}),
            json!({"job": "ok-3", "state": "Completed"}),
        ]);

        let (entries, stats) = reconcile_with_stats(&input);
        assert_eq!(summary(&entries), [("ok".to_string(), 3, "Completed".to_string())]);
        assert_eq!(stats.malformed, 3);
    }

    #[test]
    fn test_output_ordered_by_state_then_dataset() {
        let input = records(vec![
            json!({"job": "e-1", "state": "Active"}),
            json!({"job": "d-1", "state": "Completed"}),
            json!({"job": "c-1", "state": "Queued"}),
            json!({"job": "b-1", "state": "Failed"}),
            json!({"job": "a-1", "state": "Completed"}),
            json!({"job": "f-1", "state": "Canceled"}),
            json!({"job": "g-1", "state": "Failed"}),
        ]);

        let order: Vec<String> = reconcile(&input)
            .into_iter()
            .map(|e| format!("{}:{}", e.dataset_id, e.state))
            .collect();
        assert_eq!(
            order,
            [
                "b:Failed",
                "g:Failed",
                "f:Canceled",
                "a:Completed",
                "d:Completed",
                "e:Active",
                "c:Queued",
            ]
        );
    }

    #[test]
    fn test_select_latest_keeps_raw_records_in_dataset_order() {
        let input = records(vec![
            json!({"job": "zeta-1", "name": "Zeta"}),
            json!({"job": "alpha-3", "name": "Alpha third"}),
            json!({"job": "alpha-12", "name": "Alpha twelfth"}),
            json!({"job": "Restore-alpha-99"}),
        ]);

        let (selected, stats) = select_latest(&input);
        let picked: Vec<(String, &Value)> = selected
            .iter()
            .map(|(id, record)| (id.to_string(), &record["name"]))
            .collect();
        assert_eq!(
            picked,
            [
                ("alpha-12".to_string(), &json!("Alpha twelfth")),
                ("zeta-1".to_string(), &json!("Zeta")),
            ]
        );
        assert_eq!(stats.excluded, 1);
        assert_eq!(stats.superseded, 1);
        assert_eq!(stats.output, 2);
    }

    #[test]
    fn test_empty_input() {
        let (entries, stats) = reconcile_with_stats(&[]);
        assert!(entries.is_empty());
        assert_eq!(stats, ReconcileStats::default());
    }
}
