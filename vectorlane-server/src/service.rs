//! In-memory catalog answering every RPC.
//!
//! Collections, partitions, indexes, aliases and tasks live behind one mutex.
//! Long-running tasks are not executed: their state is derived from how much
//! time has passed since they started, measured on the service's [`Clock`].
//! A task spends the first quarter of the configured duration `Pending`, then
//! reports proportional progress, then settles as `Completed` or `Failed`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use vectorlane_core::task::TaskSubmitted;
use vectorlane_core::transport::{RpcRequest, Transport, TransportError};
use vectorlane_core::{
    AliasDescription, BulkInsertState, Clock, CollectionDescription, CollectionSchema,
    ConsistencyLevel, DataType, FieldType, FlushResult, IndexDescription, IndexType, MetricType,
    MutationResult, PartitionDescription, RawResponse, SystemClock, TaskId, TaskKind, TaskState,
    TaskStatus,
};

use crate::error::ServiceError;

/// Partition every collection starts with.
pub const DEFAULT_PARTITION: &str = "_default";

/// Rows credited per imported file.
pub const ROWS_PER_FILE: i64 = 100;

/// File extensions bulk insert accepts.
pub const SUPPORTED_FILE_TYPES: [&str; 3] = [".json", ".npy", ".parquet"];

type Reply = Result<Value, ServiceError>;

#[derive(Debug)]
struct Task {
    kind: TaskKind,
    collection: String,
    partition: Option<String>,
    files: Vec<String>,
    started: Instant,
    failure: Option<String>,
    rows: i64,
    applied: bool,
}

#[derive(Debug, Default)]
struct Partition {
    row_count: i64,
    load_task: Option<TaskId>,
}

#[derive(Debug)]
struct Index {
    field_name: String,
    index_type: IndexType,
    metric_type: Option<MetricType>,
    params: BTreeMap<String, String>,
    task: TaskId,
}

#[derive(Debug)]
struct Collection {
    id: i64,
    schema: CollectionSchema,
    num_shards: u32,
    consistency_level: ConsistencyLevel,
    created_at: DateTime<Utc>,
    partitions: BTreeMap<String, Partition>,
    indexes: BTreeMap<String, Index>,
    load_task: Option<TaskId>,
    next_auto_id: i64,
}

/// State of a task `now`, given how long tasks take.
fn status_at(task: &Task, task_duration: Duration, now: Instant) -> TaskStatus {
    let elapsed = now.saturating_duration_since(task.started);

    if elapsed >= task_duration {
        return match &task.failure {
            Some(reason) => TaskStatus::failed(reason.clone()),
            None if task.kind == TaskKind::BulkInsert => TaskStatus::new(TaskState::Completed)
                .with_progress(100)
                .with_row_count(task.rows),
            None => TaskStatus::new(TaskState::Completed).with_progress(100),
        };
    }
    if elapsed < task_duration / 4 {
        return TaskStatus::new(TaskState::Pending);
    }

    let progress = (elapsed.as_millis() * 100 / task_duration.as_millis().max(1)) as u8;
    let status = TaskStatus::new(TaskState::InProgress).with_progress(progress);
    if task.kind == TaskKind::BulkInsert && task.failure.is_none() {
        status.with_row_count(task.rows * i64::from(progress) / 100)
    } else {
        status
    }
}

// ---- request bodies ----

#[derive(Deserialize)]
struct CollectionReq {
    collection_name: String,
}

#[derive(Deserialize)]
struct CreateCollectionReq {
    collection_name: String,
    schema: CollectionSchema,
    num_shards: u32,
    #[serde(default)]
    consistency_level: ConsistencyLevel,
}

#[derive(Deserialize)]
struct PartitionReq {
    collection_name: String,
    partition_name: String,
}

fn one() -> u32 {
    1
}

#[derive(Deserialize)]
struct LoadReq {
    collection_name: String,
    #[serde(default)]
    partition_name: Option<String>,
    #[serde(default = "one")]
    num_replicas: u32,
}

#[derive(Deserialize)]
struct CreateIndexReq {
    collection_name: String,
    field_name: String,
    #[serde(default)]
    index_name: Option<String>,
    index_type: IndexType,
    #[serde(default)]
    metric_type: Option<MetricType>,
    #[serde(default)]
    params: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct IndexReq {
    collection_name: String,
    index_name: String,
}

#[derive(Deserialize)]
struct ListIndexesReq {
    collection_name: String,
    #[serde(default)]
    field_name: Option<String>,
}

#[derive(Deserialize)]
struct InsertColumn {
    name: String,
    values: Vec<Value>,
}

#[derive(Deserialize)]
struct InsertReq {
    collection_name: String,
    #[serde(default)]
    partition_name: Option<String>,
    fields: Vec<InsertColumn>,
}

#[derive(Deserialize)]
struct DeleteReq {
    collection_name: String,
    #[serde(default)]
    partition_name: Option<String>,
    #[serde(default)]
    expr: Option<String>,
    #[serde(default)]
    primary_keys: Vec<i64>,
}

#[derive(Deserialize)]
struct FlushReq {
    collection_name: String,
}

#[derive(Deserialize)]
struct BulkInsertReq {
    collection_name: String,
    #[serde(default)]
    partition_name: Option<String>,
    files: Vec<String>,
}

#[derive(Deserialize)]
struct TaskReq {
    task_id: TaskId,
}

#[derive(Deserialize)]
struct ListTasksReq {
    #[serde(default)]
    collection_name: Option<String>,
    #[serde(default)]
    limit: u32,
}

#[derive(Deserialize)]
struct AliasReq {
    alias: String,
}

#[derive(Deserialize)]
struct AliasTargetReq {
    collection_name: String,
    alias: String,
}

fn parse<T: DeserializeOwned>(body: Value) -> Result<T, ServiceError> {
    serde_json::from_value(body).map_err(|e| ServiceError::illegal(format!("malformed request: {}", e)))
}

fn payload<T: Serialize>(value: &T) -> Reply {
    serde_json::to_value(value).map_err(|e| ServiceError::Unexpected(e.to_string()))
}

fn submitted(task_id: TaskId) -> Reply {
    payload(&TaskSubmitted { task_id })
}

// ---- catalog ----

#[derive(Debug)]
struct Catalog {
    task_duration: Duration,
    collections: BTreeMap<String, Collection>,
    aliases: BTreeMap<String, String>,
    tasks: BTreeMap<TaskId, Task>,
    next_task_id: TaskId,
    next_collection_id: i64,
    next_segment_id: i64,
}

impl Catalog {
    fn new(task_duration: Duration) -> Self {
        Self {
            task_duration,
            collections: BTreeMap::new(),
            aliases: BTreeMap::new(),
            tasks: BTreeMap::new(),
            next_task_id: 0,
            next_collection_id: 0,
            next_segment_id: 0,
        }
    }

    /// Resolves a collection name or alias to the collection's name.
    fn resolve(&self, name: &str) -> Result<String, ServiceError> {
        if self.collections.contains_key(name) {
            return Ok(name.to_string());
        }
        self.aliases
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::CollectionNotExists(name.to_string()))
    }

    fn collection(&self, name: &str) -> Result<(String, &Collection), ServiceError> {
        let name = self.resolve(name)?;
        match self.collections.get(&name) {
            Some(collection) => Ok((name, collection)),
            None => Err(ServiceError::CollectionNotExists(name)),
        }
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut Collection, ServiceError> {
        let name = self.resolve(name)?;
        self.collections
            .get_mut(&name)
            .ok_or(ServiceError::CollectionNotExists(name))
    }

    fn add_task(
        &mut self,
        kind: TaskKind,
        collection: String,
        partition: Option<String>,
        now: Instant,
    ) -> TaskId {
        self.next_task_id += 1;
        let id = self.next_task_id;
        info!(task = id, ?kind, %collection, "task started");
        self.tasks.insert(
            id,
            Task {
                kind,
                collection,
                partition,
                files: Vec::new(),
                started: now,
                failure: None,
                rows: 0,
                applied: false,
            },
        );
        id
    }

    fn task_state(&self, id: Option<TaskId>, now: Instant) -> Option<TaskState> {
        let task = self.tasks.get(&id?)?;
        Some(status_at(task, self.task_duration, now).state)
    }

    /// Credits rows of finished imports to their partitions, once.
    fn settle(&mut self, now: Instant) {
        let task_duration = self.task_duration;
        for task in self.tasks.values_mut() {
            if task.kind != TaskKind::BulkInsert || task.applied {
                continue;
            }
            if status_at(task, task_duration, now).state != TaskState::Completed {
                continue;
            }
            task.applied = true;
            let partition = task.partition.as_deref().unwrap_or(DEFAULT_PARTITION);
            if let Some(p) = self
                .collections
                .get_mut(&task.collection)
                .and_then(|c| c.partitions.get_mut(partition))
            {
                p.row_count += task.rows;
            }
        }
    }

    // ---- collections ----

    fn create_collection(&mut self, req: CreateCollectionReq, now_utc: DateTime<Utc>) -> Reply {
        let name = req.collection_name;
        if self.collections.contains_key(&name) || self.aliases.contains_key(&name) {
            return Err(ServiceError::AlreadyExists(format!("collection {}", name)));
        }
        if !(1..=256).contains(&req.num_shards) {
            return Err(ServiceError::illegal(format!(
                "num_shards {} is out of range",
                req.num_shards
            )));
        }
        let schema = CollectionSchema::builder()
            .with_description(req.schema.description())
            .with_fields(req.schema.fields().to_vec())
            .build()
            .map_err(|e| ServiceError::illegal(e.to_string()))?;

        self.next_collection_id += 1;
        let mut partitions = BTreeMap::new();
        partitions.insert(DEFAULT_PARTITION.to_string(), Partition::default());
        self.collections.insert(
            name.clone(),
            Collection {
                id: self.next_collection_id,
                schema,
                num_shards: req.num_shards,
                consistency_level: req.consistency_level,
                created_at: now_utc,
                partitions,
                indexes: BTreeMap::new(),
                load_task: None,
                next_auto_id: 1,
            },
        );
        info!(collection = %name, "collection created");
        Ok(Value::Null)
    }

    fn describe_collection(&self, req: CollectionReq) -> Reply {
        let (name, collection) = self.collection(&req.collection_name)?;
        let aliases = self
            .aliases
            .iter()
            .filter(|(_, target)| **target == name)
            .map(|(alias, _)| alias.clone())
            .collect();
        payload(&CollectionDescription {
            name: name.clone(),
            id: collection.id,
            schema: collection.schema.clone(),
            num_shards: collection.num_shards,
            consistency_level: collection.consistency_level,
            aliases,
            created_at: collection.created_at,
        })
    }

    fn drop_collection(&mut self, req: CollectionReq) -> Reply {
        let name = req.collection_name;
        if self.collections.remove(&name).is_none() {
            return Err(ServiceError::CollectionNotExists(name));
        }
        self.aliases.retain(|_, target| *target != name);
        info!(collection = %name, "collection dropped");
        Ok(Value::Null)
    }

    fn statistics(row_count: i64) -> Value {
        json!({ "row_count": row_count.to_string() })
    }

    fn collection_statistics(&self, req: CollectionReq) -> Reply {
        let (_, collection) = self.collection(&req.collection_name)?;
        let rows = collection.partitions.values().map(|p| p.row_count).sum();
        Ok(Self::statistics(rows))
    }

    /// Loading needs an index on every vector field.
    fn check_indexed(name: &str, collection: &Collection) -> Result<(), ServiceError> {
        for field in collection.schema.vector_fields() {
            if !collection
                .indexes
                .values()
                .any(|index| index.field_name == field.name())
            {
                return Err(ServiceError::IndexNotExist(format!(
                    "on field {} of collection {}",
                    field.name(),
                    name
                )));
            }
        }
        Ok(())
    }

    fn load(&mut self, req: LoadReq, now: Instant) -> Reply {
        if req.num_replicas == 0 {
            return Err(ServiceError::illegal("num_replicas must be at least 1"));
        }
        let (name, collection) = self.collection(&req.collection_name)?;
        Self::check_indexed(&name, collection)?;
        if let Some(partition) = &req.partition_name {
            if !collection.partitions.contains_key(partition) {
                return Err(ServiceError::PartitionNotExist(partition.clone()));
            }
        }

        let id = self.add_task(TaskKind::Load, name.clone(), req.partition_name.clone(), now);
        let collection = self.collection_mut(&name)?;
        match req.partition_name {
            Some(partition) => {
                if let Some(p) = collection.partitions.get_mut(&partition) {
                    p.load_task = Some(id);
                }
            }
            None => collection.load_task = Some(id),
        }
        submitted(id)
    }

    fn release_collection(&mut self, req: CollectionReq) -> Reply {
        let collection = self.collection_mut(&req.collection_name)?;
        collection.load_task = None;
        for partition in collection.partitions.values_mut() {
            partition.load_task = None;
        }
        Ok(Value::Null)
    }

    // ---- partitions ----

    fn create_partition(&mut self, req: PartitionReq) -> Reply {
        let collection = self.collection_mut(&req.collection_name)?;
        if collection.partitions.contains_key(&req.partition_name) {
            return Err(ServiceError::AlreadyExists(format!(
                "partition {}",
                req.partition_name
            )));
        }
        collection
            .partitions
            .insert(req.partition_name, Partition::default());
        Ok(Value::Null)
    }

    fn describe_partition(&self, req: PartitionReq, now: Instant) -> Reply {
        let (name, collection) = self.collection(&req.collection_name)?;
        let partition = collection
            .partitions
            .get(&req.partition_name)
            .ok_or_else(|| ServiceError::PartitionNotExist(req.partition_name.clone()))?;
        let loaded = [collection.load_task, partition.load_task]
            .into_iter()
            .any(|task| self.task_state(task, now) == Some(TaskState::Completed));

        payload(&PartitionDescription {
            name: req.partition_name,
            collection: name,
            row_count: partition.row_count,
            loaded,
        })
    }

    fn drop_partition(&mut self, req: PartitionReq) -> Reply {
        if req.partition_name == DEFAULT_PARTITION {
            return Err(ServiceError::illegal("the default partition cannot be dropped"));
        }
        let collection = self.collection_mut(&req.collection_name)?;
        collection
            .partitions
            .remove(&req.partition_name)
            .map(|_| Value::Null)
            .ok_or(ServiceError::PartitionNotExist(req.partition_name))
    }

    fn has_partition(&self, req: PartitionReq) -> Reply {
        let (_, collection) = self.collection(&req.collection_name)?;
        Ok(Value::Bool(
            collection.partitions.contains_key(&req.partition_name),
        ))
    }

    fn list_partitions(&self, req: CollectionReq) -> Reply {
        let (_, collection) = self.collection(&req.collection_name)?;
        payload(&collection.partitions.keys().collect::<Vec<_>>())
    }

    fn partition_statistics(&self, req: PartitionReq) -> Reply {
        let (_, collection) = self.collection(&req.collection_name)?;
        let partition = collection
            .partitions
            .get(&req.partition_name)
            .ok_or(ServiceError::PartitionNotExist(req.partition_name))?;
        Ok(Self::statistics(partition.row_count))
    }

    fn release_partition(&mut self, req: PartitionReq) -> Reply {
        let collection = self.collection_mut(&req.collection_name)?;
        let partition = collection
            .partitions
            .get_mut(&req.partition_name)
            .ok_or(ServiceError::PartitionNotExist(req.partition_name))?;
        partition.load_task = None;
        Ok(Value::Null)
    }

    // ---- indexes ----

    fn check_index_fits(field: &FieldType, index_type: IndexType) -> Result<(), ServiceError> {
        let fits = match field.data_type() {
            DataType::FloatVector => !index_type.is_scalar() && !index_type.is_binary(),
            DataType::BinaryVector => index_type.is_binary(),
            DataType::VarChar => index_type.is_scalar(),
            _ => false,
        };
        if fits {
            Ok(())
        } else {
            Err(ServiceError::illegal(format!(
                "index type {} cannot be built on {:?} field {}",
                index_type,
                field.data_type(),
                field.name()
            )))
        }
    }

    fn create_index(&mut self, req: CreateIndexReq, now: Instant) -> Reply {
        let (name, collection) = self.collection(&req.collection_name)?;
        let field = collection.schema.field(&req.field_name).ok_or_else(|| {
            ServiceError::illegal(format!("field {} does not exist", req.field_name))
        })?;
        Self::check_index_fits(field, req.index_type)?;

        let index_name = req.index_name.unwrap_or_else(|| req.field_name.clone());
        if collection.indexes.contains_key(&index_name) {
            return Err(ServiceError::AlreadyExists(format!("index {}", index_name)));
        }
        if collection
            .indexes
            .values()
            .any(|index| index.field_name == req.field_name)
        {
            return Err(ServiceError::AlreadyExists(format!(
                "index on field {}",
                req.field_name
            )));
        }

        let task = self.add_task(TaskKind::IndexBuild, name.clone(), None, now);
        self.collection_mut(&name)?.indexes.insert(
            index_name,
            Index {
                field_name: req.field_name,
                index_type: req.index_type,
                metric_type: req.metric_type,
                params: req.params,
                task,
            },
        );
        submitted(task)
    }

    fn describe_index(&self, req: IndexReq, now: Instant) -> Reply {
        let (_, collection) = self.collection(&req.collection_name)?;
        let index = collection
            .indexes
            .get(&req.index_name)
            .ok_or_else(|| ServiceError::IndexNotExist(req.index_name.clone()))?;
        let state = self
            .task_state(Some(index.task), now)
            .unwrap_or(TaskState::Completed);

        payload(&IndexDescription {
            index_name: req.index_name,
            field_name: index.field_name.clone(),
            index_type: index.index_type,
            metric_type: index.metric_type,
            params: index.params.clone(),
            state,
        })
    }

    fn drop_index(&mut self, req: IndexReq) -> Reply {
        let collection = self.collection_mut(&req.collection_name)?;
        collection
            .indexes
            .remove(&req.index_name)
            .map(|_| Value::Null)
            .ok_or(ServiceError::IndexNotExist(req.index_name))
    }

    fn has_index(&self, req: IndexReq) -> Reply {
        let (_, collection) = self.collection(&req.collection_name)?;
        Ok(Value::Bool(collection.indexes.contains_key(&req.index_name)))
    }

    fn list_indexes(&self, req: ListIndexesReq) -> Reply {
        let (_, collection) = self.collection(&req.collection_name)?;
        let names: Vec<&String> = collection
            .indexes
            .iter()
            .filter(|(_, index)| {
                req.field_name
                    .as_ref()
                    .map_or(true, |field| index.field_name == *field)
            })
            .map(|(name, _)| name)
            .collect();
        payload(&names)
    }

    // ---- data ----

    fn insert(&mut self, req: InsertReq) -> Reply {
        let collection = self.collection_mut(&req.collection_name)?;
        let partition_name = req
            .partition_name
            .unwrap_or_else(|| DEFAULT_PARTITION.to_string());
        if !collection.partitions.contains_key(&partition_name) {
            return Err(ServiceError::PartitionNotExist(partition_name));
        }

        let rows = req.fields.first().map_or(0, |f| f.values.len());
        if rows == 0 || req.fields.iter().any(|f| f.values.len() != rows) {
            return Err(ServiceError::illegal("columns must have the same non-zero length"));
        }

        let mut ids = None;
        for field in collection.schema.fields() {
            let column = req.fields.iter().find(|c| c.name == field.name());
            match (column, field.is_auto_id()) {
                (Some(_), true) => {
                    return Err(ServiceError::illegal(format!(
                        "primary key {} is generated by the server",
                        field.name()
                    )))
                }
                (None, true) => {}
                (None, false) => {
                    return Err(ServiceError::illegal(format!("missing field {}", field.name())))
                }
                (Some(column), false) => {
                    if let (DataType::FloatVector, Some(dim)) = (field.data_type(), field.dimension()) {
                        let bad = column.values.iter().any(|v| {
                            v.as_array().map_or(true, |a| a.len() != dim as usize)
                        });
                        if bad {
                            return Err(ServiceError::illegal(format!(
                                "field {} expects {}-dimensional vectors",
                                field.name(),
                                dim
                            )));
                        }
                    }
                    if field.is_primary_key() {
                        ids = Some(column.values.clone());
                    }
                }
            }
        }
        if let Some(unknown) = req
            .fields
            .iter()
            .find(|c| collection.schema.field(&c.name).is_none())
        {
            return Err(ServiceError::illegal(format!(
                "field {} is not in the schema",
                unknown.name
            )));
        }

        let ids = ids.unwrap_or_else(|| {
            let first = collection.next_auto_id;
            collection.next_auto_id += rows as i64;
            (first..first + rows as i64).map(Value::from).collect()
        });
        if let Some(partition) = collection.partitions.get_mut(&partition_name) {
            partition.row_count += rows as i64;
        }

        payload(&MutationResult {
            insert_count: rows as i64,
            delete_count: 0,
            ids,
        })
    }

    fn delete(&mut self, req: DeleteReq) -> Reply {
        let collection = self.collection_mut(&req.collection_name)?;
        let partition_name = req
            .partition_name
            .unwrap_or_else(|| DEFAULT_PARTITION.to_string());
        let partition = collection
            .partitions
            .get_mut(&partition_name)
            .ok_or(ServiceError::PartitionNotExist(partition_name))?;

        let deleted = match (&req.expr, req.primary_keys.is_empty()) {
            (Some(expr), true) => {
                debug!(%expr, "expressions are not evaluated; nothing deleted");
                0
            }
            (None, false) => (req.primary_keys.len() as i64).min(partition.row_count),
            _ => {
                return Err(ServiceError::illegal(
                    "exactly one of expr and primary_keys is required",
                ))
            }
        };
        partition.row_count -= deleted;

        payload(&MutationResult {
            insert_count: 0,
            delete_count: deleted,
            ids: Vec::new(),
        })
    }

    fn flush(&mut self, req: FlushReq) -> Reply {
        let name = self.resolve(&req.collection_name)?;
        let filled = self
            .collections
            .get(&name)
            .map_or(0, |c| c.partitions.values().filter(|p| p.row_count > 0).count());
        let segment_ids = (0..filled)
            .map(|_| {
                self.next_segment_id += 1;
                self.next_segment_id
            })
            .collect();
        payload(&FlushResult { segment_ids })
    }

    fn bulk_insert(&mut self, req: BulkInsertReq, now: Instant) -> Reply {
        let (name, collection) = self.collection(&req.collection_name)?;
        if let Some(partition) = &req.partition_name {
            if !collection.partitions.contains_key(partition) {
                return Err(ServiceError::PartitionNotExist(partition.clone()));
            }
        }
        if req.files.is_empty() {
            return Err(ServiceError::illegal("no files to import"));
        }

        let failure = req
            .files
            .iter()
            .find(|f| !SUPPORTED_FILE_TYPES.iter().any(|ext| f.ends_with(ext)))
            .map(|f| format!("unsupported file type: {}", f));
        let rows = req.files.len() as i64 * ROWS_PER_FILE;

        let id = self.add_task(TaskKind::BulkInsert, name, req.partition_name, now);
        if let Some(task) = self.tasks.get_mut(&id) {
            task.files = req.files;
            task.failure = failure;
            task.rows = rows;
        }
        submitted(id)
    }

    fn bulk_insert_state(&self, id: TaskId, task: &Task, now: Instant) -> BulkInsertState {
        BulkInsertState {
            task_id: id,
            collection_name: task.collection.clone(),
            partition_name: task.partition.clone(),
            files: task.files.clone(),
            status: status_at(task, self.task_duration, now),
        }
    }

    /// Answers the three poll RPCs. The task must be of the expected kind.
    fn task_status(&self, req: TaskReq, kind: TaskKind, now: Instant) -> Reply {
        let task = self
            .tasks
            .get(&req.task_id)
            .filter(|task| task.kind == kind)
            .ok_or(ServiceError::TaskNotExist(req.task_id))?;
        match kind {
            TaskKind::BulkInsert => payload(&self.bulk_insert_state(req.task_id, task, now)),
            _ => payload(&status_at(task, self.task_duration, now)),
        }
    }

    fn list_bulk_insert_tasks(&self, req: ListTasksReq, now: Instant) -> Reply {
        let limit = match req.limit {
            0 => usize::MAX,
            n => n as usize,
        };
        let collection = match &req.collection_name {
            Some(name) => Some(self.resolve(name)?),
            None => None,
        };
        let states: Vec<BulkInsertState> = self
            .tasks
            .iter()
            .rev()
            .filter(|(_, task)| task.kind == TaskKind::BulkInsert)
            .filter(|(_, task)| {
                collection
                    .as_ref()
                    .map_or(true, |name| task.collection == *name)
            })
            .take(limit)
            .map(|(id, task)| self.bulk_insert_state(*id, task, now))
            .collect();
        payload(&states)
    }

    // ---- aliases ----

    fn create_alias(&mut self, req: AliasTargetReq) -> Reply {
        if !self.collections.contains_key(&req.collection_name) {
            return Err(ServiceError::CollectionNotExists(req.collection_name));
        }
        if self.aliases.contains_key(&req.alias) || self.collections.contains_key(&req.alias) {
            return Err(ServiceError::AlreadyExists(format!("alias {}", req.alias)));
        }
        self.aliases.insert(req.alias, req.collection_name);
        Ok(Value::Null)
    }

    fn alter_alias(&mut self, req: AliasTargetReq) -> Reply {
        if !self.collections.contains_key(&req.collection_name) {
            return Err(ServiceError::CollectionNotExists(req.collection_name));
        }
        let target = self
            .aliases
            .get_mut(&req.alias)
            .ok_or(ServiceError::AliasNotExist(req.alias))?;
        *target = req.collection_name;
        Ok(Value::Null)
    }

    fn drop_alias(&mut self, req: AliasReq) -> Reply {
        self.aliases
            .remove(&req.alias)
            .map(|_| Value::Null)
            .ok_or(ServiceError::AliasNotExist(req.alias))
    }

    fn describe_alias(&self, req: AliasReq) -> Reply {
        let collection_name = self
            .aliases
            .get(&req.alias)
            .cloned()
            .ok_or_else(|| ServiceError::AliasNotExist(req.alias.clone()))?;
        payload(&AliasDescription {
            alias: req.alias,
            collection_name,
        })
    }

    fn list_aliases(&self, req: CollectionReq) -> Reply {
        if !self.collections.contains_key(&req.collection_name) {
            return Err(ServiceError::CollectionNotExists(req.collection_name));
        }
        let aliases: Vec<&String> = self
            .aliases
            .iter()
            .filter(|(_, target)| **target == req.collection_name)
            .map(|(alias, _)| alias)
            .collect();
        payload(&aliases)
    }
}

/// The simulated service.
///
/// Shareable across threads; every RPC takes the catalog lock for its whole
/// duration, so RPCs are linearizable.
pub struct Service {
    catalog: Mutex<Catalog>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("task_duration", &self.task_duration())
            .finish_non_exhaustive()
    }
}

impl Service {
    /// Creates an empty service whose tasks take `task_duration` of wall-clock time.
    pub fn new(task_duration: Duration) -> Self {
        Self::with_clock(task_duration, Arc::new(SystemClock))
    }

    /// Creates an empty service measuring task progress on `clock`.
    pub fn with_clock(task_duration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog: Mutex::new(Catalog::new(task_duration)),
            clock,
        }
    }

    pub fn task_duration(&self) -> Duration {
        self.catalog.lock().task_duration
    }

    /// Executes one RPC. Failures are reported in the response status.
    pub fn dispatch(&self, method: &str, body: Value) -> RawResponse {
        let now = self.clock.now();
        let mut catalog = self.catalog.lock();
        catalog.settle(now);

        debug!(method, "handling rpc");
        match Self::handle(&mut catalog, method, body, now) {
            Ok(payload) => RawResponse::ok(payload),
            Err(err) => {
                warn!(method, code = err.code(), %err, "rpc rejected");
                err.into()
            }
        }
    }

    fn handle(catalog: &mut Catalog, method: &str, body: Value, now: Instant) -> Reply {
        match method {
            "CreateCollection" => catalog.create_collection(parse(body)?, Utc::now()),
            "DescribeCollection" => catalog.describe_collection(parse(body)?),
            "DropCollection" => catalog.drop_collection(parse(body)?),
            "HasCollection" => {
                let req: CollectionReq = parse(body)?;
                Ok(Value::Bool(catalog.collections.contains_key(&req.collection_name)))
            }
            "ListCollections" => payload(&catalog.collections.keys().collect::<Vec<_>>()),
            "GetCollectionStatistics" => catalog.collection_statistics(parse(body)?),
            "LoadCollection" => {
                let mut req: LoadReq = parse(body)?;
                req.partition_name = None;
                catalog.load(req, now)
            }
            "ReleaseCollection" => catalog.release_collection(parse(body)?),

            "CreatePartition" => catalog.create_partition(parse(body)?),
            "DescribePartition" => catalog.describe_partition(parse(body)?, now),
            "DropPartition" => catalog.drop_partition(parse(body)?),
            "HasPartition" => catalog.has_partition(parse(body)?),
            "ListPartitions" => catalog.list_partitions(parse(body)?),
            "GetPartitionStatistics" => catalog.partition_statistics(parse(body)?),
            "LoadPartition" => {
                let req: LoadReq = parse(body)?;
                if req.partition_name.is_none() {
                    return Err(ServiceError::illegal("partition_name is required"));
                }
                catalog.load(req, now)
            }
            "ReleasePartition" => catalog.release_partition(parse(body)?),

            "CreateIndex" => catalog.create_index(parse(body)?, now),
            "DescribeIndex" => catalog.describe_index(parse(body)?, now),
            "DropIndex" => catalog.drop_index(parse(body)?),
            "HasIndex" => catalog.has_index(parse(body)?),
            "ListIndexes" => catalog.list_indexes(parse(body)?),

            "Insert" => catalog.insert(parse(body)?),
            "Delete" => catalog.delete(parse(body)?),
            "Flush" => catalog.flush(parse(body)?),
            "BulkInsert" => catalog.bulk_insert(parse(body)?, now),
            "ListBulkInsertTasks" => catalog.list_bulk_insert_tasks(parse(body)?, now),

            "GetLoadState" => catalog.task_status(parse(body)?, TaskKind::Load, now),
            "GetIndexState" => catalog.task_status(parse(body)?, TaskKind::IndexBuild, now),
            "GetBulkInsertState" => catalog.task_status(parse(body)?, TaskKind::BulkInsert, now),

            "CreateAlias" => catalog.create_alias(parse(body)?),
            "AlterAlias" => catalog.alter_alias(parse(body)?),
            "DropAlias" => catalog.drop_alias(parse(body)?),
            "HasAlias" => {
                let req: AliasReq = parse(body)?;
                Ok(Value::Bool(catalog.aliases.contains_key(&req.alias)))
            }
            "DescribeAlias" => catalog.describe_alias(parse(body)?),
            "ListAliases" => catalog.list_aliases(parse(body)?),

            other => Err(ServiceError::UnknownMethod(other.to_string())),
        }
    }
}

/// Lets a client talk to the service in-process, without sockets.
impl Transport for Service {
    fn invoke(&self, request: &RpcRequest) -> Result<RawResponse, TransportError> {
        Ok(self.dispatch(request.method, request.body.clone()))
    }
}
