//! Immutable request parameters.
//!
//! Every RPC has a parameter type built through a builder:
//!
//! ```
//! use vectorlane_core::param::LoadCollection;
//!
//! let param = LoadCollection::builder()
//!     .with_collection_name("books")
//!     .with_num_replicas(2)
//!     .build()
//!     .unwrap();
//! assert_eq!(param.num_replicas(), 2);
//! ```
//!
//! Setters never fail. `build()` runs every check and either returns a
//! complete, immutable parameter or a [`Error::Validation`] naming the
//! offending field. The builder is left untouched, so `build()` may be called
//! again and yields an equal value.
//!
//! The serialized form of a parameter is the request body. Client-side knobs
//! (RPC timeout, wait policy, wait mode) are never sent.
//!
//! [`Error::Validation`]: crate::Error::Validation

mod alias;
mod collection;
mod dml;
mod index;
mod partition;

pub use alias::{
    AlterAlias, AlterAliasBuilder, CreateAlias, CreateAliasBuilder, DescribeAlias,
    DescribeAliasBuilder, DropAlias, DropAliasBuilder, HasAlias, HasAliasBuilder, ListAliases,
    ListAliasesBuilder,
};
pub use collection::{
    CreateCollection, CreateCollectionBuilder, DescribeCollection, DescribeCollectionBuilder,
    DropCollection, DropCollectionBuilder, GetCollectionStatistics,
    GetCollectionStatisticsBuilder, HasCollection, HasCollectionBuilder, ListCollections,
    ListCollectionsBuilder, LoadCollection, LoadCollectionBuilder, ReleaseCollection,
    ReleaseCollectionBuilder,
};
pub use dml::{
    BulkInsert, BulkInsertBuilder, Delete, DeleteBuilder, Flush, FlushBuilder,
    GetBulkInsertState, GetBulkInsertStateBuilder, Insert, InsertBuilder, InsertField,
    ListBulkInsertTasks, ListBulkInsertTasksBuilder,
};
pub use index::{
    CreateIndex, CreateIndexBuilder, DescribeIndex, DescribeIndexBuilder, DropIndex,
    DropIndexBuilder, HasIndex, HasIndexBuilder, ListIndexes, ListIndexesBuilder,
};
pub use partition::{
    CreatePartition, CreatePartitionBuilder, DescribePartition, DescribePartitionBuilder,
    DropPartition, DropPartitionBuilder, GetPartitionStatistics, GetPartitionStatisticsBuilder,
    HasPartition, HasPartitionBuilder, ListPartitions, ListPartitionsBuilder, LoadPartition,
    LoadPartitionBuilder, ReleasePartition, ReleasePartitionBuilder,
};

use std::time::Duration;

use serde::Serialize;

use crate::error::Result;
use crate::poller::{WaitPolicy, DEFAULT_WAITING_INTERVAL};
use crate::task::{TaskKind, WaitMode};

/// A validated request that maps to one RPC method.
pub trait RequestParam: Serialize {
    /// RPC method name.
    const METHOD: &'static str;

    /// Per-request deadline; `None` falls back to the client default.
    fn timeout(&self) -> Option<Duration>;
}

/// A request that starts a server-side task.
pub trait LongRunning: RequestParam {
    const KIND: TaskKind;

    /// Collection the task runs against.
    fn collection_name(&self) -> &str;

    fn wait_policy(&self) -> &WaitPolicy;

    fn wait_mode(&self) -> WaitMode;
}

/// A zero deadline means "no deadline".
pub(crate) fn normalize_timeout(timeout: Option<Duration>) -> Option<Duration> {
    timeout.filter(|t| !t.is_zero())
}

/// Wait settings carried by long-running request builders.
#[derive(Debug, Clone, Default)]
pub(crate) struct WaitOptions {
    pub interval: Option<Duration>,
    pub timeout: Option<Duration>,
    pub asynchronous: bool,
}

impl WaitOptions {
    pub fn resolve(&self) -> Result<(WaitPolicy, WaitMode)> {
        let policy = WaitPolicy::new(
            self.interval.unwrap_or(DEFAULT_WAITING_INTERVAL),
            self.timeout,
        )?;
        let mode = if self.asynchronous {
            WaitMode::Asynchronous
        } else {
            WaitMode::Synchronous
        };
        Ok((policy, mode))
    }
}

/// Setters for builders holding a `wait: WaitOptions` field.
macro_rules! wait_setters {
    () => {
        /// Time between two state polls. Defaults to 500ms; must be positive.
        pub fn with_waiting_interval(mut self, interval: std::time::Duration) -> Self {
            self.wait.interval = Some(interval);
            self
        }

        /// Maximum time to wait for the task. Zero or unset waits forever.
        pub fn with_waiting_timeout(mut self, timeout: std::time::Duration) -> Self {
            self.wait.timeout = Some(timeout);
            self
        }

        /// Return the task handle right away instead of waiting.
        pub fn with_async(mut self, asynchronous: bool) -> Self {
            self.wait.asynchronous = asynchronous;
            self
        }
    };
}

/// Declares a request made only of required names plus an RPC timeout.
///
/// Each name is checked with [`check_name`](crate::validation::check_name).
macro_rules! named_request {
    (
        $(#[$meta:meta])*
        $name:ident, $builder:ident => $method:literal {
            $($field:ident : $setter:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
        pub struct $name {
            $($field: String,)+
            #[serde(skip)]
            timeout: Option<std::time::Duration>,
        }

        impl $name {
            pub fn builder() -> $builder {
                $builder::default()
            }

            $(
                pub fn $field(&self) -> &str {
                    &self.$field
                }
            )+
        }

        impl $crate::param::RequestParam for $name {
            const METHOD: &'static str = $method;

            fn timeout(&self) -> Option<std::time::Duration> {
                self.timeout
            }
        }

        #[doc = concat!("Builder for [`", stringify!($name), "`].")]
        #[derive(Debug, Clone, Default)]
        pub struct $builder {
            $($field: Option<String>,)+
            timeout: Option<std::time::Duration>,
        }

        impl $builder {
            $(
                pub fn $setter(mut self, value: impl Into<String>) -> Self {
                    self.$field = Some(value.into());
                    self
                }
            )+

            /// RPC deadline. Zero means none.
            pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
                self.timeout = Some(timeout);
                self
            }

            pub fn build(&self) -> $crate::error::Result<$name> {
                $(
                    let $field = $crate::validation::require(stringify!($field), &self.$field)?;
                    $crate::validation::check_name(stringify!($field), $field)?;
                )+
                Ok($name {
                    $($field: $field.clone(),)+
                    timeout: $crate::param::normalize_timeout(self.timeout),
                })
            }
        }
    };
}

pub(crate) use named_request;
pub(crate) use wait_setters;
