//! Index requests.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use super::{named_request, normalize_timeout, wait_setters, LongRunning, RequestParam, WaitOptions};
use crate::error::{Error, Result};
use crate::poller::WaitPolicy;
use crate::schema::{IndexType, MetricType};
use crate::task::{TaskKind, WaitMode};
use crate::validation::{check_name, check_optional_name, require};

/// Builds an index over a field. Long-running.
///
/// When no index name is given the server names the index after the field.
///
/// # Example
///
/// ```
/// use vectorlane_core::param::CreateIndex;
/// use vectorlane_core::{IndexType, MetricType};
///
/// let param = CreateIndex::builder()
///     .with_collection_name("books")
///     .with_field_name("embedding")
///     .with_index_type(IndexType::Hnsw)
///     .with_metric_type(MetricType::L2)
///     .with_param("M", "16")
///     .with_param("efConstruction", "200")
///     .with_async(true)
///     .build()
///     .unwrap();
/// assert_eq!(param.params().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateIndex {
    collection_name: String,
    field_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_name: Option<String>,
    index_type: IndexType,
    #[serde(skip_serializing_if = "Option::is_none")]
    metric_type: Option<MetricType>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
    #[serde(skip)]
    wait_policy: WaitPolicy,
    #[serde(skip)]
    wait_mode: WaitMode,
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl CreateIndex {
    pub fn builder() -> CreateIndexBuilder {
        CreateIndexBuilder::default()
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn metric_type(&self) -> Option<MetricType> {
        self.metric_type
    }

    /// Algorithm-specific build parameters.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

impl RequestParam for CreateIndex {
    const METHOD: &'static str = "CreateIndex";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl LongRunning for CreateIndex {
    const KIND: TaskKind = TaskKind::IndexBuild;

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

/// Builder for [`CreateIndex`].
#[derive(Debug, Clone, Default)]
pub struct CreateIndexBuilder {
    collection_name: Option<String>,
    field_name: Option<String>,
    index_name: Option<String>,
    index_type: Option<IndexType>,
    metric_type: Option<MetricType>,
    params: BTreeMap<String, String>,
    wait: WaitOptions,
    timeout: Option<Duration>,
}

impl CreateIndexBuilder {
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }

    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    pub fn with_index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = Some(index_type);
        self
    }

    pub fn with_metric_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = Some(metric_type);
        self
    }

    /// Adds one build parameter, e.g. `("nlist", "1024")`.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Merges build parameters into the existing ones.
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    wait_setters!();

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<CreateIndex> {
        let collection_name = require("collection_name", &self.collection_name)?;
        check_name("collection_name", collection_name)?;
        let field_name = require("field_name", &self.field_name)?;
        check_name("field_name", field_name)?;
        check_optional_name("index_name", self.index_name.as_deref())?;
        let index_type = *require("index_type", &self.index_type)?;
        check_metric(index_type, self.metric_type)?;

        if self.params.keys().any(|k| k.trim().is_empty()) {
            return Err(Error::validation("params", "keys must not be blank"));
        }

        let (wait_policy, wait_mode) = self.wait.resolve()?;

        Ok(CreateIndex {
            collection_name: collection_name.clone(),
            field_name: field_name.clone(),
            index_name: self.index_name.clone(),
            index_type,
            metric_type: self.metric_type,
            params: self.params.clone(),
            wait_policy,
            wait_mode,
            timeout: normalize_timeout(self.timeout),
        })
    }
}

/// Metric must match the index family.
fn check_metric(index_type: IndexType, metric: Option<MetricType>) -> Result<()> {
    match (index_type.is_scalar(), metric) {
        (true, None) => Ok(()),
        (true, Some(metric)) => Err(Error::validation(
            "metric_type",
            format!("{:?} cannot be used with scalar index {}", metric, index_type),
        )),
        (false, None) => Err(Error::validation(
            "metric_type",
            format!("is required for index type {}", index_type),
        )),
        (false, Some(metric)) if metric.is_binary() != index_type.is_binary() => {
            Err(Error::validation(
                "metric_type",
                format!("{:?} does not match index type {}", metric, index_type),
            ))
        }
        (false, Some(_)) => Ok(()),
    }
}

named_request! {
    /// Fetches an index's type, metric, parameters and build state.
    DescribeIndex, DescribeIndexBuilder => "DescribeIndex" {
        collection_name: with_collection_name,
        index_name: with_index_name,
    }
}

named_request! {
    DropIndex, DropIndexBuilder => "DropIndex" {
        collection_name: with_collection_name,
        index_name: with_index_name,
    }
}

named_request! {
    HasIndex, HasIndexBuilder => "HasIndex" {
        collection_name: with_collection_name,
        index_name: with_index_name,
    }
}

/// Lists index names of a collection, optionally only those on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListIndexes {
    collection_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_name: Option<String>,
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl ListIndexes {
    pub fn builder() -> ListIndexesBuilder {
        ListIndexesBuilder::default()
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }
}

impl RequestParam for ListIndexes {
    const METHOD: &'static str = "ListIndexes";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`ListIndexes`].
#[derive(Debug, Clone, Default)]
pub struct ListIndexesBuilder {
    collection_name: Option<String>,
    field_name: Option<String>,
    timeout: Option<Duration>,
}

impl ListIndexesBuilder {
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<ListIndexes> {
        let collection_name = require("collection_name", &self.collection_name)?;
        check_name("collection_name", collection_name)?;
        check_optional_name("field_name", self.field_name.as_deref())?;

        Ok(ListIndexes {
            collection_name: collection_name.clone(),
            field_name: self.field_name.clone(),
            timeout: normalize_timeout(self.timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CreateIndexBuilder {
        CreateIndex::builder()
            .with_collection_name("books")
            .with_field_name("embedding")
    }

    #[test]
    fn test_metric_rules() {
        let err = base()
            .with_index_type(IndexType::IvfFlat)
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("metric_type"));

        let err = base()
            .with_index_type(IndexType::BinFlat)
            .with_metric_type(MetricType::L2)
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("metric_type"));

        let err = base()
            .with_index_type(IndexType::Hnsw)
            .with_metric_type(MetricType::Hamming)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("does not match"));

        let err = base()
            .with_index_type(IndexType::Trie)
            .with_metric_type(MetricType::Ip)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("scalar index TRIE"));

        assert!(base()
            .with_index_type(IndexType::BinIvfFlat)
            .with_metric_type(MetricType::Jaccard)
            .build()
            .is_ok());
        assert!(base().with_index_type(IndexType::Trie).build().is_ok());
    }

    #[test]
    fn test_index_type_required() {
        let err = base().with_metric_type(MetricType::L2).build().unwrap_err();
        assert_eq!(err.field(), Some("index_type"));
    }

    #[test]
    fn test_blank_param_key() {
        let err = base()
            .with_index_type(IndexType::IvfFlat)
            .with_metric_type(MetricType::L2)
            .with_param(" ", "1")
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("params"));
    }

    #[test]
    fn test_create_index_body() {
        let param = base()
            .with_index_type(IndexType::IvfFlat)
            .with_metric_type(MetricType::Ip)
            .with_params([("nlist", "128")])
            .with_waiting_timeout(Duration::from_secs(60))
            .build()
            .unwrap();
        assert_eq!(CreateIndex::KIND, TaskKind::IndexBuild);
        assert_eq!(param.index_name(), None);
        assert_eq!(
            serde_json::to_value(&param).unwrap(),
            serde_json::json!({
                "collection_name": "books",
                "field_name": "embedding",
                "index_type": "IVF_FLAT",
                "metric_type": "IP",
                "params": {"nlist": "128"}
            })
        );
    }

    #[test]
    fn test_list_indexes_filter() {
        let param = ListIndexes::builder()
            .with_collection_name("books")
            .with_field_name("embedding")
            .build()
            .unwrap();
        assert_eq!(param.field_name(), Some("embedding"));

        let err = ListIndexes::builder()
            .with_collection_name("books")
            .with_field_name("")
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("field_name"));
    }
}
