//! Collection requests.

use std::time::Duration;

use serde::Serialize;

use super::{named_request, normalize_timeout, wait_setters, LongRunning, RequestParam, WaitOptions};
use crate::error::Result;
use crate::poller::WaitPolicy;
use crate::schema::{CollectionSchema, ConsistencyLevel};
use crate::task::{TaskKind, WaitMode};
use crate::validation::{check_name, check_range, require, DEFAULT_REPLICAS, DEFAULT_SHARDS, MAX_SHARDS};

/// Creates a collection with the given schema.
///
/// # Example
///
/// ```
/// use vectorlane_core::param::CreateCollection;
/// use vectorlane_core::{CollectionSchema, DataType, FieldType};
///
/// let schema = CollectionSchema::builder()
///     .add_field(
///         FieldType::builder()
///             .with_name("id")
///             .with_data_type(DataType::Int64)
///             .with_primary_key(true)
///             .build()
///             .unwrap(),
///     )
///     .add_field(
///         FieldType::builder()
///             .with_name("embedding")
///             .with_data_type(DataType::FloatVector)
///             .with_dimension(128)
///             .build()
///             .unwrap(),
///     )
///     .build()
///     .unwrap();
///
/// let param = CreateCollection::builder()
///     .with_collection_name("books")
///     .with_schema(schema)
///     .build()
///     .unwrap();
/// assert_eq!(param.num_shards(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateCollection {
    collection_name: String,
    schema: CollectionSchema,
    num_shards: u32,
    consistency_level: ConsistencyLevel,
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl CreateCollection {
    pub fn builder() -> CreateCollectionBuilder {
        CreateCollectionBuilder::default()
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    pub fn num_shards(&self) -> u32 {
        self.num_shards
    }

    pub fn consistency_level(&self) -> ConsistencyLevel {
        self.consistency_level
    }
}

impl RequestParam for CreateCollection {
    const METHOD: &'static str = "CreateCollection";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`CreateCollection`].
#[derive(Debug, Clone, Default)]
pub struct CreateCollectionBuilder {
    collection_name: Option<String>,
    schema: Option<CollectionSchema>,
    num_shards: Option<u32>,
    consistency_level: Option<ConsistencyLevel>,
    timeout: Option<Duration>,
}

impl CreateCollectionBuilder {
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn with_schema(mut self, schema: CollectionSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Number of shards, 1 to 256. Defaults to 2.
    pub fn with_num_shards(mut self, num_shards: u32) -> Self {
        self.num_shards = Some(num_shards);
        self
    }

    pub fn with_consistency_level(mut self, level: ConsistencyLevel) -> Self {
        self.consistency_level = Some(level);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<CreateCollection> {
        let collection_name = require("collection_name", &self.collection_name)?;
        check_name("collection_name", collection_name)?;
        let schema = require("schema", &self.schema)?;
        let num_shards = self.num_shards.unwrap_or(DEFAULT_SHARDS);
        check_range("num_shards", num_shards, 1..=MAX_SHARDS)?;

        Ok(CreateCollection {
            collection_name: collection_name.clone(),
            schema: schema.clone(),
            num_shards,
            consistency_level: self.consistency_level.unwrap_or_default(),
            timeout: normalize_timeout(self.timeout),
        })
    }
}

named_request! {
    /// Fetches a collection's schema and settings.
    DescribeCollection, DescribeCollectionBuilder => "DescribeCollection" {
        collection_name: with_collection_name,
    }
}

named_request! {
    /// Drops a collection and all of its data.
    DropCollection, DropCollectionBuilder => "DropCollection" {
        collection_name: with_collection_name,
    }
}

named_request! {
    /// Checks whether a collection exists.
    HasCollection, HasCollectionBuilder => "HasCollection" {
        collection_name: with_collection_name,
    }
}

named_request! {
    /// Fetches row count and other statistics of a collection.
    GetCollectionStatistics, GetCollectionStatisticsBuilder => "GetCollectionStatistics" {
        collection_name: with_collection_name,
    }
}

named_request! {
    /// Releases a loaded collection from memory.
    ReleaseCollection, ReleaseCollectionBuilder => "ReleaseCollection" {
        collection_name: with_collection_name,
    }
}

/// Lists the names of all collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListCollections {
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl ListCollections {
    pub fn builder() -> ListCollectionsBuilder {
        ListCollectionsBuilder::default()
    }
}

impl RequestParam for ListCollections {
    const METHOD: &'static str = "ListCollections";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`ListCollections`].
#[derive(Debug, Clone, Default)]
pub struct ListCollectionsBuilder {
    timeout: Option<Duration>,
}

impl ListCollectionsBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<ListCollections> {
        Ok(ListCollections {
            timeout: normalize_timeout(self.timeout),
        })
    }
}

/// Loads a collection into memory. Long-running.
///
/// By default the call waits until the load completes; see
/// [`LoadCollectionBuilder::with_async`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadCollection {
    collection_name: String,
    num_replicas: u32,
    #[serde(skip)]
    wait_policy: WaitPolicy,
    #[serde(skip)]
    wait_mode: WaitMode,
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl LoadCollection {
    pub fn builder() -> LoadCollectionBuilder {
        LoadCollectionBuilder::default()
    }

    pub fn num_replicas(&self) -> u32 {
        self.num_replicas
    }
}

impl RequestParam for LoadCollection {
    const METHOD: &'static str = "LoadCollection";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl LongRunning for LoadCollection {
    const KIND: TaskKind = TaskKind::Load;

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

/// Builder for [`LoadCollection`].
#[derive(Debug, Clone, Default)]
pub struct LoadCollectionBuilder {
    collection_name: Option<String>,
    num_replicas: Option<u32>,
    wait: WaitOptions,
    timeout: Option<Duration>,
}

impl LoadCollectionBuilder {
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Number of in-memory replicas. Defaults to 1.
    pub fn with_num_replicas(mut self, num_replicas: u32) -> Self {
        self.num_replicas = Some(num_replicas);
        self
    }

    wait_setters!();

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<LoadCollection> {
        let collection_name = require("collection_name", &self.collection_name)?;
        check_name("collection_name", collection_name)?;
        let num_replicas = self.num_replicas.unwrap_or(DEFAULT_REPLICAS);
        check_range("num_replicas", num_replicas, 1..=u32::MAX)?;
        let (wait_policy, wait_mode) = self.wait.resolve()?;

        Ok(LoadCollection {
            collection_name: collection_name.clone(),
            num_replicas,
            wait_policy,
            wait_mode,
            timeout: normalize_timeout(self.timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, FieldType};

    fn schema() -> CollectionSchema {
        CollectionSchema::builder()
            .add_field(
                FieldType::builder()
                    .with_name("id")
                    .with_data_type(DataType::Int64)
                    .with_primary_key(true)
                    .build()
                    .unwrap(),
            )
            .add_field(
                FieldType::builder()
                    .with_name("embedding")
                    .with_data_type(DataType::FloatVector)
                    .with_dimension(4)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_collection_defaults() {
        let param = CreateCollection::builder()
            .with_collection_name("books")
            .with_schema(schema())
            .build()
            .unwrap();
        assert_eq!(param.num_shards(), DEFAULT_SHARDS);
        assert_eq!(param.consistency_level(), ConsistencyLevel::Bounded);
        assert_eq!(param.timeout(), None);
    }

    #[test]
    fn test_create_collection_shard_range() {
        let builder = CreateCollection::builder()
            .with_collection_name("books")
            .with_schema(schema());
        assert!(builder.clone().with_num_shards(0).build().is_err());
        assert!(builder.clone().with_num_shards(256).build().is_ok());
        let err = builder.with_num_shards(257).build().unwrap_err();
        assert_eq!(err.field(), Some("num_shards"));
    }

    #[test]
    fn test_create_collection_requires_schema() {
        let err = CreateCollection::builder()
            .with_collection_name("books")
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("schema"));
    }

    #[test]
    fn test_body_omits_client_knobs() {
        let param = CreateCollection::builder()
            .with_collection_name("books")
            .with_schema(schema())
            .with_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let body = serde_json::to_value(&param).unwrap();
        assert_eq!(body["collection_name"], "books");
        assert_eq!(body["num_shards"], 2);
        assert_eq!(body["consistency_level"], "bounded");
        assert!(body.get("timeout").is_none());
        assert_eq!(param.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_named_request_validation() {
        let err = DropCollection::builder().build().unwrap_err();
        assert_eq!(err.field(), Some("collection_name"));
        assert!(err.to_string().contains("is required"));

        let err = HasCollection::builder()
            .with_collection_name("9lives")
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("collection_name"));

        let param = DescribeCollection::builder()
            .with_collection_name("books")
            .with_timeout(Duration::ZERO)
            .build()
            .unwrap();
        assert_eq!(param.collection_name(), "books");
        assert_eq!(param.timeout(), None);
        assert_eq!(DescribeCollection::METHOD, "DescribeCollection");
    }

    #[test]
    fn test_list_collections_body_is_empty_object() {
        let param = ListCollections::builder().build().unwrap();
        assert_eq!(serde_json::to_string(&param).unwrap(), "{}");
    }

    #[test]
    fn test_load_collection_wait_settings() {
        let param = LoadCollection::builder()
            .with_collection_name("books")
            .with_waiting_interval(Duration::from_millis(100))
            .with_waiting_timeout(Duration::from_secs(10))
            .with_async(true)
            .build()
            .unwrap();
        assert_eq!(param.num_replicas(), 1);
        assert_eq!(param.wait_policy().interval(), Duration::from_millis(100));
        assert_eq!(param.wait_policy().timeout(), Some(Duration::from_secs(10)));
        assert_eq!(param.wait_mode(), WaitMode::Asynchronous);
        assert_eq!(LoadCollection::KIND, TaskKind::Load);

        let body = serde_json::to_value(&param).unwrap();
        assert_eq!(body, serde_json::json!({"collection_name": "books", "num_replicas": 1}));
    }

    #[test]
    fn test_load_collection_rejects_bad_input() {
        let err = LoadCollection::builder()
            .with_collection_name("books")
            .with_num_replicas(0)
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("num_replicas"));

        let err = LoadCollection::builder()
            .with_collection_name("books")
            .with_waiting_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("waiting_interval"));
    }

    #[test]
    fn test_build_is_repeatable() {
        let builder = LoadCollection::builder()
            .with_collection_name("books")
            .with_num_replicas(3);
        assert_eq!(builder.build().unwrap(), builder.build().unwrap());
    }
}
