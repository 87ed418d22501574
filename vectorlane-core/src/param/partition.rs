//! Partition requests.

use std::time::Duration;

use serde::Serialize;

use super::{named_request, normalize_timeout, wait_setters, LongRunning, RequestParam, WaitOptions};
use crate::error::Result;
use crate::poller::WaitPolicy;
use crate::task::{TaskKind, WaitMode};
use crate::validation::{check_name, check_range, require, DEFAULT_REPLICAS};

named_request! {
    /// Creates a partition inside a collection.
    CreatePartition, CreatePartitionBuilder => "CreatePartition" {
        collection_name: with_collection_name,
        partition_name: with_partition_name,
    }
}

named_request! {
    /// Fetches a partition's row count and load state.
    DescribePartition, DescribePartitionBuilder => "DescribePartition" {
        collection_name: with_collection_name,
        partition_name: with_partition_name,
    }
}

named_request! {
    /// Drops a partition and its data.
    DropPartition, DropPartitionBuilder => "DropPartition" {
        collection_name: with_collection_name,
        partition_name: with_partition_name,
    }
}

named_request! {
    HasPartition, HasPartitionBuilder => "HasPartition" {
        collection_name: with_collection_name,
        partition_name: with_partition_name,
    }
}

named_request! {
    GetPartitionStatistics, GetPartitionStatisticsBuilder => "GetPartitionStatistics" {
        collection_name: with_collection_name,
        partition_name: with_partition_name,
    }
}

named_request! {
    /// Releases a loaded partition from memory.
    ReleasePartition, ReleasePartitionBuilder => "ReleasePartition" {
        collection_name: with_collection_name,
        partition_name: with_partition_name,
    }
}

named_request! {
    /// Lists the partitions of a collection, including `_default`.
    ListPartitions, ListPartitionsBuilder => "ListPartitions" {
        collection_name: with_collection_name,
    }
}

/// Loads one partition into memory. Long-running, like
/// [`LoadCollection`](super::LoadCollection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadPartition {
    collection_name: String,
    partition_name: String,
    num_replicas: u32,
    #[serde(skip)]
    wait_policy: WaitPolicy,
    #[serde(skip)]
    wait_mode: WaitMode,
    #[serde(skip)]
    timeout: Option<Duration>,
}

impl LoadPartition {
    pub fn builder() -> LoadPartitionBuilder {
        LoadPartitionBuilder::default()
    }

    pub fn partition_name(&self) -> &str {
        &self.partition_name
    }

    pub fn num_replicas(&self) -> u32 {
        self.num_replicas
    }
}

impl RequestParam for LoadPartition {
    const METHOD: &'static str = "LoadPartition";

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl LongRunning for LoadPartition {
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

/// Builder for [`LoadPartition`].
#[derive(Debug, Clone, Default)]
pub struct LoadPartitionBuilder {
    collection_name: Option<String>,
    partition_name: Option<String>,
    num_replicas: Option<u32>,
    wait: WaitOptions,
    timeout: Option<Duration>,
}

impl LoadPartitionBuilder {
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn with_partition_name(mut self, name: impl Into<String>) -> Self {
        self.partition_name = Some(name.into());
        self
    }

    pub fn with_num_replicas(mut self, num_replicas: u32) -> Self {
        self.num_replicas = Some(num_replicas);
        self
    }

    wait_setters!();

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<LoadPartition> {
        let collection_name = require("collection_name", &self.collection_name)?;
        check_name("collection_name", collection_name)?;
        let partition_name = require("partition_name", &self.partition_name)?;
        check_name("partition_name", partition_name)?;
        let num_replicas = self.num_replicas.unwrap_or(DEFAULT_REPLICAS);
        check_range("num_replicas", num_replicas, 1..=u32::MAX)?;
        let (wait_policy, wait_mode) = self.wait.resolve()?;

        Ok(LoadPartition {
            collection_name: collection_name.clone(),
            partition_name: partition_name.clone(),
            num_replicas,
            wait_policy,
            wait_mode,
            timeout: normalize_timeout(self.timeout),
        })
    }
}
