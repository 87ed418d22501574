//! The client: one method per RPC.
//!
//! [`VectorClient`] turns a validated request parameter into an RPC, sends it
//! through its [`Transport`] and decodes the answer. Long-running requests go
//! through the [`Poller`], which waits for the task unless the request was
//! built with `with_async(true)`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::param::{
    AlterAlias, BulkInsert, CreateAlias, CreateCollection, CreateIndex, CreatePartition, Delete,
    DescribeAlias, DescribeCollection, DescribeIndex, DescribePartition, DropAlias,
    DropCollection, DropIndex, DropPartition, Flush, GetBulkInsertState, GetCollectionStatistics,
    GetPartitionStatistics, HasAlias, HasCollection, HasIndex, HasPartition, Insert,
    ListAliases, ListBulkInsertTasks, ListCollections, ListIndexes, ListPartitions,
    LoadCollection, LoadPartition, LongRunning, ReleaseCollection, ReleasePartition,
    RequestParam,
};
use crate::poller::{Clock, Poller, SystemClock, WaitPolicy};
use crate::response::{
    AliasDescription, BulkInsertState, CollectionDescription, FlushResult, IndexDescription,
    MutationResult, PartitionDescription, Statistics,
};
use crate::task::{TaskHandle, TaskOutcome, TaskQuery, TaskStatus, TaskSubmitted};
use crate::transport::{RpcRequest, Transport, TransportError};

/// Client-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Deadline for requests that do not carry their own.
    pub request_timeout: Option<Duration>,
    /// Policy used by [`VectorClient::wait`].
    pub default_wait: WaitPolicy,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default RPC deadline. Zero means none. Chainable.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout).filter(|t| !t.is_zero());
        self
    }

    /// Sets the policy used when resuming a task without an explicit one. Chainable.
    pub fn with_default_wait(mut self, policy: WaitPolicy) -> Self {
        self.default_wait = policy;
        self
    }
}

/// Blocking client for the vector database service.
///
/// Cloning is cheap; clones share the transport and clock. The client holds no
/// per-request state, so one instance may serve many threads.
///
/// # Example
///
/// ```
/// use vectorlane_core::param::HasCollection;
/// use vectorlane_core::transport::{RawResponse, RpcRequest, Transport, TransportError};
/// use vectorlane_core::VectorClient;
///
/// struct AlwaysYes;
///
/// impl Transport for AlwaysYes {
///     fn invoke(&self, _: &RpcRequest) -> Result<RawResponse, TransportError> {
///         Ok(RawResponse::ok(serde_json::json!(true)))
///     }
/// }
///
/// let client = VectorClient::new(AlwaysYes);
/// let param = HasCollection::builder().with_collection_name("books").build().unwrap();
/// assert!(client.has_collection(&param).unwrap());
/// ```
#[derive(Clone)]
pub struct VectorClient {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    config: ClientConfig,
}

impl fmt::Debug for VectorClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VectorClient {
    /// Creates a client over `transport` with default settings.
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Creates a client over an already shared transport.
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            clock: Arc::new(SystemClock),
            config: ClientConfig::default(),
        }
    }

    /// Connects over HTTP to `endpoint`, e.g. `http://localhost:19530`.
    #[cfg(feature = "http")]
    pub fn connect(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self::new(crate::transport::HttpTransport::connect(endpoint)?))
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the clock driving poll intervals and wait deadlines.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- collections ----

    pub fn create_collection(&self, param: &CreateCollection) -> Result<()> {
        self.call_unit(param)
    }

    pub fn describe_collection(&self, param: &DescribeCollection) -> Result<CollectionDescription> {
        self.call(param)
    }

    pub fn drop_collection(&self, param: &DropCollection) -> Result<()> {
        self.call_unit(param)
    }

    pub fn has_collection(&self, param: &HasCollection) -> Result<bool> {
        self.call(param)
    }

    pub fn list_collections(&self, param: &ListCollections) -> Result<Vec<String>> {
        self.call(param)
    }

    pub fn get_collection_statistics(&self, param: &GetCollectionStatistics) -> Result<Statistics> {
        self.call(param)
    }

    /// Loads a collection into memory, waiting for it unless the request is asynchronous.
    pub fn load_collection(&self, param: &LoadCollection) -> Result<TaskOutcome> {
        self.run_task(param)
    }

    pub fn release_collection(&self, param: &ReleaseCollection) -> Result<()> {
        self.call_unit(param)
    }

    // ---- partitions ----

    pub fn create_partition(&self, param: &CreatePartition) -> Result<()> {
        self.call_unit(param)
    }

    pub fn describe_partition(&self, param: &DescribePartition) -> Result<PartitionDescription> {
        self.call(param)
    }

    pub fn drop_partition(&self, param: &DropPartition) -> Result<()> {
        self.call_unit(param)
    }

    pub fn has_partition(&self, param: &HasPartition) -> Result<bool> {
        self.call(param)
    }

    pub fn list_partitions(&self, param: &ListPartitions) -> Result<Vec<String>> {
        self.call(param)
    }

    pub fn get_partition_statistics(&self, param: &GetPartitionStatistics) -> Result<Statistics> {
        self.call(param)
    }

    pub fn load_partition(&self, param: &LoadPartition) -> Result<TaskOutcome> {
        self.run_task(param)
    }

    pub fn release_partition(&self, param: &ReleasePartition) -> Result<()> {
        self.call_unit(param)
    }

    // ---- indexes ----

    /// Builds an index, waiting for it unless the request is asynchronous.
    pub fn create_index(&self, param: &CreateIndex) -> Result<TaskOutcome> {
        self.run_task(param)
    }

    pub fn describe_index(&self, param: &DescribeIndex) -> Result<IndexDescription> {
        self.call(param)
    }

    pub fn drop_index(&self, param: &DropIndex) -> Result<()> {
        self.call_unit(param)
    }

    pub fn has_index(&self, param: &HasIndex) -> Result<bool> {
        self.call(param)
    }

    pub fn list_indexes(&self, param: &ListIndexes) -> Result<Vec<String>> {
        self.call(param)
    }

    // ---- data ----

    pub fn insert(&self, param: &Insert) -> Result<MutationResult> {
        self.call(param)
    }

    pub fn delete(&self, param: &Delete) -> Result<MutationResult> {
        self.call(param)
    }

    pub fn flush(&self, param: &Flush) -> Result<FlushResult> {
        self.call(param)
    }

    /// Imports files, waiting for the import unless the request is asynchronous.
    pub fn bulk_insert(&self, param: &BulkInsert) -> Result<TaskOutcome> {
        self.run_task(param)
    }

    pub fn get_bulk_insert_state(&self, param: &GetBulkInsertState) -> Result<BulkInsertState> {
        self.call(param)
    }

    pub fn list_bulk_insert_tasks(&self, param: &ListBulkInsertTasks) -> Result<Vec<BulkInsertState>> {
        self.call(param)
    }

    // ---- aliases ----

    pub fn create_alias(&self, param: &CreateAlias) -> Result<()> {
        self.call_unit(param)
    }

    pub fn alter_alias(&self, param: &AlterAlias) -> Result<()> {
        self.call_unit(param)
    }

    pub fn drop_alias(&self, param: &DropAlias) -> Result<()> {
        self.call_unit(param)
    }

    pub fn has_alias(&self, param: &HasAlias) -> Result<bool> {
        self.call(param)
    }

    pub fn describe_alias(&self, param: &DescribeAlias) -> Result<AliasDescription> {
        self.call(param)
    }

    pub fn list_aliases(&self, param: &ListAliases) -> Result<Vec<String>> {
        self.call(param)
    }

    // ---- tasks ----

    /// Asks the server once for the current state of a task.
    pub fn get_task_status(&self, handle: &TaskHandle) -> Result<TaskStatus> {
        let method = handle.kind().poll_method();
        let body = encode(&TaskQuery::from(handle))?;
        let payload = self.dispatch(method, body, None)?;
        decode(method, payload)
    }

    /// Waits for a task with a fresh deadline.
    ///
    /// Use this to resume after [`Error::OperationTimedOut`] or to wait on a
    /// handle returned by an asynchronous request.
    pub fn wait_for_completion(&self, handle: &TaskHandle, policy: &WaitPolicy) -> Result<TaskStatus> {
        Poller::new(Arc::clone(&self.clock))
            .wait_for_completion(handle, policy, |h| self.get_task_status(h))
    }

    /// Waits for a task using the configured default policy.
    pub fn wait(&self, handle: &TaskHandle) -> Result<TaskStatus> {
        self.wait_for_completion(handle, &self.config.default_wait)
    }

    // ---- dispatch ----

    fn run_task<P: LongRunning>(&self, param: &P) -> Result<TaskOutcome> {
        Poller::new(Arc::clone(&self.clock)).submit(
            param.wait_mode(),
            param.wait_policy(),
            || {
                let submitted: TaskSubmitted = self.call(param)?;
                Ok(TaskHandle::new(
                    submitted.task_id,
                    P::KIND,
                    param.collection_name(),
                ))
            },
            |handle| self.get_task_status(handle),
        )
    }

    fn call<P: RequestParam, T: DeserializeOwned>(&self, param: &P) -> Result<T> {
        let body = encode(param)?;
        let payload = self.dispatch(P::METHOD, body, param.timeout())?;
        decode(P::METHOD, payload)
    }

    /// Like `call` for RPCs whose payload carries nothing.
    fn call_unit<P: RequestParam>(&self, param: &P) -> Result<()> {
        let body = encode(param)?;
        self.dispatch(P::METHOD, body, param.timeout()).map(drop)
    }

    fn dispatch(&self, method: &'static str, body: Value, timeout: Option<Duration>) -> Result<Value> {
        let request = RpcRequest {
            method,
            body,
            timeout: timeout.or(self.config.request_timeout),
        };
        debug!(method, timeout = ?request.timeout, "dispatching rpc");

        let response = self.transport.invoke(&request)?;
        if !response.status.is_success() {
            warn!(method, code = response.status.code, reason = %response.status.reason, "server rejected request");
            return Err(Error::ServerRejected {
                code: response.status.code,
                reason: response.status.reason,
            });
        }
        Ok(response.payload)
    }
}

fn encode<S: Serialize>(value: &S) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| TransportError::Encode(e.to_string()).into())
}

fn decode<T: DeserializeOwned>(method: &str, payload: Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| TransportError::Decode(format!("{} payload: {}", method, e)).into())
}

#[cfg(feature = "async")]
mod async_api {
    use super::*;

    /// Async wrapper for [`VectorClient`].
    ///
    /// Every call runs the blocking client on tokio's blocking pool via
    /// `spawn_blocking`, so waiting on a long-running task never stalls the
    /// runtime's worker threads.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use vectorlane_core::param::LoadCollection;
    /// use vectorlane_core::{AsyncVectorClient, VectorClient};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = AsyncVectorClient::from_sync(VectorClient::connect("http://localhost:19530").unwrap());
    ///     let param = LoadCollection::builder().with_collection_name("books").build().unwrap();
    ///     let outcome = client.load_collection(param).await.unwrap();
    ///     assert!(outcome.is_completed());
    /// }
    /// ```
    #[derive(Debug, Clone)]
    pub struct AsyncVectorClient {
        inner: VectorClient,
    }

    async fn run_blocking<T, F>(f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| TransportError::Runtime(format!("spawn_blocking failed: {}", e)))?
    }

    macro_rules! async_ops {
        ($($op:ident($param:ty) -> $ret:ty;)+) => {
            $(
                #[doc = concat!("Async version of [`VectorClient::", stringify!($op), "`].")]
                pub async fn $op(&self, param: $param) -> Result<$ret> {
                    let inner = self.inner.clone();
                    run_blocking(move || inner.$op(&param)).await
                }
            )+
        };
    }

    impl AsyncVectorClient {
        /// Wraps a blocking client.
        pub fn from_sync(client: VectorClient) -> Self {
            Self { inner: client }
        }

        /// Returns the wrapped blocking client.
        pub fn inner(&self) -> &VectorClient {
            &self.inner
        }

        async_ops! {
            create_collection(CreateCollection) -> ();
            describe_collection(DescribeCollection) -> CollectionDescription;
            drop_collection(DropCollection) -> ();
            has_collection(HasCollection) -> bool;
            list_collections(ListCollections) -> Vec<String>;
            get_collection_statistics(GetCollectionStatistics) -> Statistics;
            load_collection(LoadCollection) -> TaskOutcome;
            release_collection(ReleaseCollection) -> ();
            create_partition(CreatePartition) -> ();
            describe_partition(DescribePartition) -> PartitionDescription;
            drop_partition(DropPartition) -> ();
            has_partition(HasPartition) -> bool;
            list_partitions(ListPartitions) -> Vec<String>;
            get_partition_statistics(GetPartitionStatistics) -> Statistics;
            load_partition(LoadPartition) -> TaskOutcome;
            release_partition(ReleasePartition) -> ();
            create_index(CreateIndex) -> TaskOutcome;
            describe_index(DescribeIndex) -> IndexDescription;
            drop_index(DropIndex) -> ();
            has_index(HasIndex) -> bool;
            list_indexes(ListIndexes) -> Vec<String>;
            insert(Insert) -> MutationResult;
            delete(Delete) -> MutationResult;
            flush(Flush) -> FlushResult;
            bulk_insert(BulkInsert) -> TaskOutcome;
            get_bulk_insert_state(GetBulkInsertState) -> BulkInsertState;
            list_bulk_insert_tasks(ListBulkInsertTasks) -> Vec<BulkInsertState>;
            create_alias(CreateAlias) -> ();
            alter_alias(AlterAlias) -> ();
            drop_alias(DropAlias) -> ();
            has_alias(HasAlias) -> bool;
            describe_alias(DescribeAlias) -> AliasDescription;
            list_aliases(ListAliases) -> Vec<String>;
            get_task_status(TaskHandle) -> TaskStatus;
        }

        /// Async version of [`VectorClient::wait_for_completion`].
        pub async fn wait_for_completion(&self, handle: TaskHandle, policy: WaitPolicy) -> Result<TaskStatus> {
            let inner = self.inner.clone();
            run_blocking(move || inner.wait_for_completion(&handle, &policy)).await
        }

        /// Async version of [`VectorClient::wait`].
        pub async fn wait(&self, handle: TaskHandle) -> Result<TaskStatus> {
            let inner = self.inner.clone();
            run_blocking(move || inner.wait(&handle)).await
        }
    }

    impl From<VectorClient> for AsyncVectorClient {
        fn from(client: VectorClient) -> Self {
            Self::from_sync(client)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::transport::RawResponse;
        use serde_json::json;

        struct Fixed(Value);

        impl Transport for Fixed {
            fn invoke(&self, _: &RpcRequest) -> std::result::Result<RawResponse, TransportError> {
                Ok(RawResponse::ok(self.0.clone()))
            }
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_async_listing() {
            let client = AsyncVectorClient::from(VectorClient::new(Fixed(json!(["a", "b"]))));
            let names = client
                .list_collections(ListCollections::builder().build().unwrap())
                .await
                .unwrap();
            assert_eq!(names, vec!["a", "b"]);
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_async_wait_uses_default_policy() {
            let client = AsyncVectorClient::from(
                VectorClient::new(Fixed(json!({"state": "completed", "progress": 100})))
                    .with_clock(crate::poller::ManualClock::new()),
            );
            let handle = TaskHandle::new(5, crate::task::TaskKind::IndexBuild, "books");
            let status = client.wait(handle).await.unwrap();
            assert_eq!(status.state, crate::task::TaskState::Completed);
            assert_eq!(status.progress, Some(100));
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_async_panic_maps_to_runtime_error() {
            let err = run_blocking::<(), _>(|| panic!("boom")).await.unwrap_err();
            assert!(matches!(err, Error::Transport(TransportError::Runtime(_))));
        }
    }
}

#[cfg(feature = "async")]
pub use async_api::AsyncVectorClient;
