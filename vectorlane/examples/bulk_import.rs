//! Starts a bulk import without waiting, then tracks it by task id.

use std::time::Duration;

use vectorlane::prelude::*;

fn main() -> vectorlane::Result<()> {
    tracing_subscriber::fmt::init();

    let client = VectorClient::connect("http://localhost:19530")?;

    let import = BulkInsert::builder()
        .with_collection_name("books")
        .with_files(["books/part-0.json", "books/part-1.parquet"])
        .with_async(true)
        .build()?;
    let Some(handle) = client.bulk_insert(&import)?.into_handle() else {
        return Ok(());
    };
    println!("submitted {}", handle);

    // The task id alone is enough to look the import up later.
    let state = client.get_bulk_insert_state(
        &GetBulkInsertState::builder()
            .with_task_id(handle.id())
            .build()?,
    )?;
    println!("{} files, state {:?}", state.files.len(), state.state());

    let policy = WaitPolicy::new(Duration::from_millis(500), Some(Duration::from_secs(60)))?;
    match client.wait_for_completion(&handle, &policy) {
        Ok(status) => println!("imported {:?} rows", status.row_count),
        Err(Error::OperationFailed { reason, .. }) => println!("import failed: {}", reason),
        Err(e) => return Err(e),
    }

    let recent = client.list_bulk_insert_tasks(
        &ListBulkInsertTasks::builder()
            .with_collection_name("books")
            .with_limit(5)
            .build()?,
    )?;
    for task in recent {
        println!("task {} -> {:?}", task.task_id, task.state());
    }
    Ok(())
}
