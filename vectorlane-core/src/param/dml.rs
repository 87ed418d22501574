//! Data manipulation requests: insert, delete, flush and bulk import.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::{normalize_timeout, wait_setters, LongRunning, RequestParam, WaitOptions};
use crate::error::{Error, Result};
use crate::poller::WaitPolicy;
use crate::task::{TaskId, TaskKind, WaitMode};
use crate::validation::{check_name, check_optional_name, require};

/// One column of an insert: a field name and one value per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertField {
    pub name: String,
    pub values: Vec<Value>,
}

impl InsertField {
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Inserts rows, given column by column.
///
/// # Example
///
/// ```
/// use vectorlane_core::param::Insert;
///
/// let param = Insert::builder()
///     .with_collection_name("books")
///     .add_field("id", [1i64, 2, 3])
///     .add_field("embedding", [vec![0.1f32, 0.2], vec![0.3, 0.4], vec![0.5, 0.6]])
///     .build()
///     .unwrap();
/// assert_eq!(param.num_rows(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insert {
    collection_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    partition_name: Option<String>,
    fields: Vec<InsertField>,
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl Insert {
    pub fn builder() -> InsertBuilder {
        InsertBuilder::default()
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn partition_name(&self) -> Option<&str> {
        self.partition_name.as_deref()
    }

    pub fn fields(&self) -> &[InsertField] {
        &self.fields
    }

    /// Number of rows; every column has this many values.
    pub fn num_rows(&self) -> usize {
        self.fields.first().map_or(0, |f| f.values.len())
    }
}

impl RequestParam for Insert {
    const METHOD: &'static str = "Insert";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`Insert`].
#[derive(Debug, Clone, Default)]
pub struct InsertBuilder {
    collection_name: Option<String>,
    partition_name: Option<String>,
    fields: Vec<InsertField>,
    timeout: Option<Duration>,
}

impl InsertBuilder {
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Target partition. Rows go to `_default` when unset.
    pub fn with_partition_name(mut self, name: impl Into<String>) -> Self {
        self.partition_name = Some(name.into());
        self
    }

    /// Appends a column.
    pub fn add_field<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.fields.push(InsertField::new(name, values));
        self
    }

    /// Replaces all columns.
    pub fn with_fields(mut self, fields: Vec<InsertField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<Insert> {
        let collection_name = require("collection_name", &self.collection_name)?;
        check_name("collection_name", collection_name)?;
        check_optional_name("partition_name", self.partition_name.as_deref())?;

        if self.fields.is_empty() {
            return Err(Error::validation("fields", "at least one field is required"));
        }

        let mut names = HashSet::new();
        for field in &self.fields {
            check_name("fields", &field.name)?;
            if !names.insert(field.name.as_str()) {
                return Err(Error::validation(
                    "fields",
                    format!("duplicate field {:?}", field.name),
                ));
            }
        }

        let rows = self.fields[0].values.len();
        if rows == 0 {
            return Err(Error::validation("fields", "row count must not be zero"));
        }
        if let Some(field) = self.fields.iter().find(|f| f.values.len() != rows) {
            return Err(Error::validation(
                "fields",
                format!(
                    "field {:?} has {} rows, expected {}",
                    field.name,
                    field.values.len(),
                    rows
                ),
            ));
        }

        Ok(Insert {
            collection_name: collection_name.clone(),
            partition_name: self.partition_name.clone(),
            fields: self.fields.clone(),
            timeout: normalize_timeout(self.timeout),
        })
    }
}

/// Deletes rows matching a boolean expression or a list of primary keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delete {
    collection_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    partition_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expr: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    primary_keys: Vec<i64>,
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl Delete {
    pub fn builder() -> DeleteBuilder {
        DeleteBuilder::default()
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn expr(&self) -> Option<&str> {
        self.expr.as_deref()
    }

    pub fn primary_keys(&self) -> &[i64] {
        &self.primary_keys
    }
}

impl RequestParam for Delete {
    const METHOD: &'static str = "Delete";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`Delete`].
#[derive(Debug, Clone, Default)]
pub struct DeleteBuilder {
    collection_name: Option<String>,
    partition_name: Option<String>,
    expr: Option<String>,
    primary_keys: Vec<i64>,
    timeout: Option<Duration>,
}

impl DeleteBuilder {
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn with_partition_name(mut self, name: impl Into<String>) -> Self {
        self.partition_name = Some(name.into());
        self
    }

    /// Boolean filter, e.g. `id in [1, 2]`. Excludes `with_primary_keys`.
    pub fn with_expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = Some(expr.into());
        self
    }

    pub fn with_primary_keys(mut self, keys: impl IntoIterator<Item = i64>) -> Self {
        self.primary_keys = keys.into_iter().collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<Delete> {
        let collection_name = require("collection_name", &self.collection_name)?;
        check_name("collection_name", collection_name)?;
        check_optional_name("partition_name", self.partition_name.as_deref())?;

        if self.expr.as_deref().is_some_and(|e| e.trim().is_empty()) {
            return Err(Error::validation("expr", "must not be blank"));
        }
        match (&self.expr, self.primary_keys.is_empty()) {
            (Some(_), false) => {
                return Err(Error::validation(
                    "expr",
                    "cannot be combined with primary_keys",
                ))
            }
            (None, true) => {
                return Err(Error::validation(
                    "expr",
                    "either expr or primary_keys is required",
                ))
            }
            _ => {}
        }

        Ok(Delete {
            collection_name: collection_name.clone(),
            partition_name: self.partition_name.clone(),
            expr: self.expr.clone(),
            primary_keys: self.primary_keys.clone(),
            timeout: normalize_timeout(self.timeout),
        })
    }
}

/// Seals a collection's growing segments so their data is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flush {
    collection_name: String,
    async_flush: bool,
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl Flush {
    pub fn builder() -> FlushBuilder {
        FlushBuilder::default()
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn is_async_flush(&self) -> bool {
        self.async_flush
    }
}

impl RequestParam for Flush {
    const METHOD: &'static str = "Flush";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`Flush`].
#[derive(Debug, Clone, Default)]
pub struct FlushBuilder {
    collection_name: Option<String>,
    async_flush: bool,
    timeout: Option<Duration>,
}

impl FlushBuilder {
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Ask the server to return before segments are sealed.
    pub fn with_async_flush(mut self, async_flush: bool) -> Self {
        self.async_flush = async_flush;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<Flush> {
        let collection_name = require("collection_name", &self.collection_name)?;
        check_name("collection_name", collection_name)?;
        Ok(Flush {
            collection_name: collection_name.clone(),
            async_flush: self.async_flush,
            timeout: normalize_timeout(self.timeout),
        })
    }
}

/// Imports rows from files already uploaded to the service's storage.
/// Long-running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkInsert {
    collection_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    partition_name: Option<String>,
    files: Vec<String>,
    #[serde(skip)]
    wait_policy: WaitPolicy,
    #[serde(skip)]
    wait_mode: WaitMode,
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl BulkInsert {
    pub fn builder() -> BulkInsertBuilder {
        BulkInsertBuilder::default()
    }

    pub fn partition_name(&self) -> Option<&str> {
        self.partition_name.as_deref()
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }
}

impl RequestParam for BulkInsert {
    const METHOD: &'static str = "BulkInsert";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl LongRunning for BulkInsert {
    const KIND: TaskKind = TaskKind::BulkInsert;

    fn collection_name(&self) -> &str {
        &self.collection_name
    }

    fn wait_policy(&self) -> &WaitPolicy {
        &self.wait_policy
    }

    fn wait_mode(&self) -> WaitMode {
        self.wait_mode
    }
}

/// Builder for [`BulkInsert`].
#[derive(Debug, Clone, Default)]
pub struct BulkInsertBuilder {
    collection_name: Option<String>,
    partition_name: Option<String>,
    files: Vec<String>,
    wait: WaitOptions,
    timeout: Option<Duration>,
}

impl BulkInsertBuilder {
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn with_partition_name(mut self, name: impl Into<String>) -> Self {
        self.partition_name = Some(name.into());
        self
    }

    pub fn add_file(mut self, path: impl Into<String>) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn with_files<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = paths.into_iter().map(Into::into).collect();
        self
    }

    wait_setters!();

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<BulkInsert> {
        let collection_name = require("collection_name", &self.collection_name)?;
        check_name("collection_name", collection_name)?;
        check_optional_name("partition_name", self.partition_name.as_deref())?;

        if self.files.is_empty() {
            return Err(Error::validation("files", "at least one file is required"));
        }
        if let Some(index) = self.files.iter().position(|f| f.trim().is_empty()) {
            return Err(Error::validation(
                "files",
                format!("path at position {} is blank", index),
            ));
        }

        let (wait_policy, wait_mode) = self.wait.resolve()?;

        Ok(BulkInsert {
            collection_name: collection_name.clone(),
            partition_name: self.partition_name.clone(),
            files: self.files.clone(),
            wait_policy,
            wait_mode,
            timeout: normalize_timeout(self.timeout),
        })
    }
}

/// Fetches the state of one bulk-insert task by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetBulkInsertState {
    task_id: TaskId,
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl GetBulkInsertState {
    pub fn builder() -> GetBulkInsertStateBuilder {
        GetBulkInsertStateBuilder::default()
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }
}

impl RequestParam for GetBulkInsertState {
    const METHOD: &'static str = "GetBulkInsertState";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`GetBulkInsertState`].
#[derive(Debug, Clone, Default)]
pub struct GetBulkInsertStateBuilder {
    task_id: Option<TaskId>,
    timeout: Option<Duration>,
}

impl GetBulkInsertStateBuilder {
    pub fn with_task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<GetBulkInsertState> {
        let task_id = *require("task_id", &self.task_id)?;
        Ok(GetBulkInsertState {
            task_id,
            timeout: normalize_timeout(self.timeout),
        })
    }
}

/// Lists recent bulk-insert tasks, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListBulkInsertTasks {
    #[serde(skip_serializing_if = "Option::is_none")]
    collection_name: Option<String>,
    limit: u32,
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl ListBulkInsertTasks {
    pub fn builder() -> ListBulkInsertTasksBuilder {
        ListBulkInsertTasksBuilder::default()
    }

    pub fn collection_name(&self) -> Option<&str> {
        self.collection_name.as_deref()
    }

    /// Maximum number of tasks returned; 0 means no limit.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl RequestParam for ListBulkInsertTasks {
    const METHOD: &'static str = "ListBulkInsertTasks";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`ListBulkInsertTasks`].
#[derive(Debug, Clone, Default)]
pub struct ListBulkInsertTasksBuilder {
    collection_name: Option<String>,
    limit: u32,
    timeout: Option<Duration>,
}

impl ListBulkInsertTasksBuilder {
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<ListBulkInsertTasks> {
        check_optional_name("collection_name", self.collection_name.as_deref())?;
        Ok(ListBulkInsertTasks {
            collection_name: self.collection_name.clone(),
            limit: self.limit,
            timeout: normalize_timeout(self.timeout),
        })
    }
}
