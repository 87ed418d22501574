//! End-to-end behaviour of `VectorClient` against a scripted transport.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use vectorlane_core::param::{
    BulkInsert, GetCollectionStatistics, HasPartition, Insert, ListCollections, LoadCollection,
    LoadPartition,
};
use vectorlane_core::transport::{RawResponse, RpcRequest, Transport, TransportError};
use vectorlane_core::{
    Error, ErrorCode, ManualClock, TaskKind, TaskOutcome, TaskState, VectorClient, WaitPolicy,
};

/// Plays back canned responses in order and records each invoked method.
#[derive(Default)]
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<RawResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn methods(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(m, _)| m.clone()).collect()
    }
}

impl Transport for ScriptedTransport {
    fn invoke(&self, request: &RpcRequest) -> Result<RawResponse, TransportError> {
        self.calls
            .lock()
            .push((request.method.to_string(), request.body.clone()));
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Unreachable("script exhausted".into())))
    }
}

fn ok(payload: Value) -> Result<RawResponse, TransportError> {
    Ok(RawResponse::ok(payload))
}

fn client(transport: &Arc<ScriptedTransport>, clock: &Arc<ManualClock>) -> VectorClient {
    VectorClient::new(Arc::clone(transport)).with_clock(Arc::clone(clock))
}

#[test]
fn test_sync_load_completing_on_first_poll() {
    let transport = ScriptedTransport::new(vec![
        ok(json!({"task_id": 1})),
        ok(json!({"state": "completed", "progress": 100})),
    ]);
    let clock = Arc::new(ManualClock::new());
    let param = LoadCollection::builder()
        .with_collection_name("books")
        .build()
        .unwrap();

    let outcome = client(&transport, &clock).load_collection(&param).unwrap();

    assert!(outcome.is_completed());
    assert!(outcome.handle().is_none());
    assert!(clock.sleeps().is_empty());
    assert_eq!(transport.methods(), ["LoadCollection", "GetLoadState"]);
}

#[test]
fn test_async_load_never_polls() {
    let transport = ScriptedTransport::new(vec![ok(json!({"task_id": 77}))]);
    let clock = Arc::new(ManualClock::new());
    let param = LoadPartition::builder()
        .with_collection_name("books")
        .with_partition_name("p2024")
        .with_async(true)
        .build()
        .unwrap();

    let outcome = client(&transport, &clock).load_partition(&param).unwrap();

    let handle = match outcome {
        TaskOutcome::Running(handle) => handle,
        other => panic!("expected a running task, got {:?}", other),
    };
    assert_eq!(handle.id(), 77);
    assert_eq!(handle.kind(), TaskKind::Load);
    assert_eq!(transport.methods(), ["LoadPartition"]);
    assert_eq!(
        transport.calls.lock()[0].1,
        json!({"collection_name": "books", "partition_name": "p2024", "num_replicas": 1})
    );
}

#[test]
fn test_invalid_request_never_reaches_transport() {
    let transport = ScriptedTransport::new(vec![]);
    let result = LoadCollection::builder()
        .with_collection_name("books")
        .with_waiting_interval(Duration::ZERO)
        .build();

    let err = result.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    assert_eq!(err.field(), Some("waiting_interval"));
    assert!(transport.methods().is_empty());
}

#[test]
fn test_start_rejection_skips_polling() {
    let transport = ScriptedTransport::new(vec![Ok(RawResponse::error(
        4,
        "collection books does not exist",
    ))]);
    let clock = Arc::new(ManualClock::new());
    let param = LoadCollection::builder()
        .with_collection_name("books")
        .build()
        .unwrap();

    let err = client(&transport, &clock)
        .load_collection(&param)
        .unwrap_err();

    assert_eq!(
        err,
        Error::ServerRejected {
            code: 4,
            reason: "collection books does not exist".into()
        }
    );
    assert_eq!(transport.methods(), ["LoadCollection"]);
}

#[test]
fn test_failed_import_reports_reason() {
    let transport = ScriptedTransport::new(vec![
        ok(json!({"task_id": 3})),
        ok(json!({"task_id": 3, "collection_name": "books", "state": "in_progress", "progress": 30})),
        ok(json!({"task_id": 3, "collection_name": "books", "state": "failed", "reason": "bad row 12"})),
    ]);
    let clock = Arc::new(ManualClock::new());
    let param = BulkInsert::builder()
        .with_collection_name("books")
        .add_file("rows.json")
        .build()
        .unwrap();

    let err = client(&transport, &clock).bulk_insert(&param).unwrap_err();

    match &err {
        Error::OperationFailed { task, reason } => {
            assert_eq!(task.id(), 3);
            assert_eq!(task.kind(), TaskKind::BulkInsert);
            assert_eq!(reason, "bad row 12");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(
        transport.methods(),
        ["BulkInsert", "GetBulkInsertState", "GetBulkInsertState"]
    );
}

#[test]
fn test_timeout_then_resume() {
    let transport = ScriptedTransport::new(vec![
        ok(json!({"task_id": 11})),
        ok(json!({"state": "pending"})),
        ok(json!({"state": "in_progress"})),
        ok(json!({"state": "completed"})),
    ]);
    let clock = Arc::new(ManualClock::new());
    let client = client(&transport, &clock);
    let param = LoadCollection::builder()
        .with_collection_name("books")
        .with_waiting_interval(Duration::from_secs(1))
        .with_waiting_timeout(Duration::from_secs(1))
        .build()
        .unwrap();

    let err = client.load_collection(&param).unwrap_err();
    assert!(err.is_timeout());
    let handle = err.task().cloned().unwrap();
    match err {
        Error::OperationTimedOut { last_state, .. } => assert_eq!(last_state, TaskState::InProgress),
        other => panic!("unexpected error {:?}", other),
    }

    let policy = WaitPolicy::new(Duration::from_secs(1), None).unwrap();
    let status = client.wait_for_completion(&handle, &policy).unwrap();
    assert_eq!(status.state, TaskState::Completed);
}

#[test]
fn test_transport_failure_is_classified() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::DeadlineExceeded(
        Duration::from_secs(2),
    ))]);
    let clock = Arc::new(ManualClock::new());
    let param = ListCollections::builder().build().unwrap();

    let err = client(&transport, &clock)
        .list_collections(&param)
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::TransportFailed);
    assert!(err.to_string().contains("deadline"));
}

#[test]
fn test_payload_shapes() {
    let transport = ScriptedTransport::new(vec![
        ok(json!(["books", "films"])),
        ok(json!(true)),
        ok(json!({"row_count": "42"})),
        ok(json!({"insert_count": 2, "ids": [10, 11]})),
    ]);
    let clock = Arc::new(ManualClock::new());
    let client = client(&transport, &clock);

    let names = client
        .list_collections(&ListCollections::builder().build().unwrap())
        .unwrap();
    assert_eq!(names, ["books", "films"]);

    let has = client
        .has_partition(
            &HasPartition::builder()
                .with_collection_name("books")
                .with_partition_name("_default")
                .build()
                .unwrap(),
        )
        .unwrap();
    assert!(has);

    let stats = client
        .get_collection_statistics(
            &GetCollectionStatistics::builder()
                .with_collection_name("books")
                .build()
                .unwrap(),
        )
        .unwrap();
    assert_eq!(stats.row_count(), Some(42));

    let result = client
        .insert(
            &Insert::builder()
                .with_collection_name("books")
                .add_field("title", ["dune", "emma"])
                .build()
                .unwrap(),
        )
        .unwrap();
    assert_eq!(result.insert_count, 2);
    assert_eq!(result.ids, vec![json!(10), json!(11)]);
}

#[test]
fn test_shared_client_across_threads() {
    let transport = ScriptedTransport::new(vec![ok(json!([])), ok(json!([]))]);
    let clock = Arc::new(ManualClock::new());
    let client = client(&transport, &clock);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let client = client.clone();
            std::thread::spawn(move || {
                client
                    .list_collections(&ListCollections::builder().build().unwrap())
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_empty());
    }
    assert_eq!(transport.methods().len(), 2);
}
