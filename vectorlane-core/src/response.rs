//! Typed payloads returned by the service.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{CollectionSchema, ConsistencyLevel, IndexType, MetricType};
use crate::task::{TaskId, TaskState, TaskStatus};

/// Schema and settings of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDescription {
    pub name: String,
    pub id: i64,
    pub schema: CollectionSchema,
    pub num_shards: u32,
    pub consistency_level: ConsistencyLevel,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionDescription {
    pub name: String,
    pub collection: String,
    pub row_count: i64,
    pub loaded: bool,
}

/// Definition and build state of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescription {
    pub index_name: String,
    pub field_name: String,
    pub index_type: IndexType,
    #[serde(default)]
    pub metric_type: Option<MetricType>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    pub state: TaskState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasDescription {
    pub alias: String,
    pub collection_name: String,
}

/// Key/value statistics of a collection or partition.
///
/// Values are reported as strings, the way the service sends them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statistics(BTreeMap<String, String>);

impl Statistics {
    /// Key under which the service reports the number of rows.
    pub const ROW_COUNT: &'static str = "row_count";

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Parsed row count; `None` if absent or not a number.
    pub fn row_count(&self) -> Option<i64> {
        self.get(Self::ROW_COUNT)?.parse().ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Statistics {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of an insert or delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationResult {
    #[serde(default)]
    pub insert_count: i64,
    #[serde(default)]
    pub delete_count: i64,
    /// Primary keys of inserted rows, including server-generated ones.
    #[serde(default)]
    pub ids: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushResult {
    #[serde(default)]
    pub segment_ids: Vec<i64>,
}

/// Full record of a bulk-insert task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkInsertState {
    pub task_id: TaskId,
    pub collection_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_name: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(flatten)]
    pub status: TaskStatus,
}

impl BulkInsertState {
    #[inline]
    pub fn state(&self) -> TaskState {
        self.status.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_statistics() {
        let stats: Statistics =
            serde_json::from_value(json!({"row_count": "1200", "segments": "3"})).unwrap();
        assert_eq!(stats.row_count(), Some(1200));
        assert_eq!(stats.get("segments"), Some("3"));
        assert_eq!(stats.len(), 2);

        let stats: Statistics = [("row_count".to_string(), "many".to_string())]
            .into_iter()
            .collect();
        assert_eq!(stats.row_count(), None);
    }

    #[test]
    fn test_bulk_insert_state_flattens_status() {
        let state: BulkInsertState = serde_json::from_value(json!({
            "task_id": 9,
            "collection_name": "books",
            "files": ["rows.json"],
            "state": "in_progress",
            "progress": 50,
            "row_count": 100
        }))
        .unwrap();
        assert_eq!(state.state(), TaskState::InProgress);
        assert_eq!(state.status.row_count, Some(100));

        // The same document decodes as a plain poll status.
        let status: TaskStatus = serde_json::to_value(&state)
            .and_then(serde_json::from_value)
            .unwrap();
        assert_eq!(status.progress, Some(50));
    }

    #[test]
    fn test_mutation_result_defaults() {
        let result: MutationResult = serde_json::from_value(json!({"delete_count": 2})).unwrap();
        assert_eq!(result.delete_count, 2);
        assert_eq!(result.insert_count, 0);
        assert!(result.ids.is_empty());
    }
}
