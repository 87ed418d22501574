//! Loads a collection from async code.
//!
//! The HTTP transport is blocking underneath, so the client is created and
//! dropped outside the runtime; calls run on tokio's blocking pool.

use std::time::Duration;

use vectorlane::prelude::*;

async fn load(client: &AsyncVectorClient) -> vectorlane::Result<()> {
    let load = LoadCollection::builder()
        .with_collection_name("books")
        .with_waiting_interval(Duration::from_millis(200))
        .with_waiting_timeout(Duration::from_secs(10))
        .build()?;

    match client.load_collection(load).await {
        Ok(outcome) => println!("loaded: {:?}", outcome),
        Err(err) if err.is_timeout() => {
            let Some(task) = err.task().cloned() else {
                return Err(err);
            };
            println!("still loading, waiting without a deadline");
            let status = client.wait_for_completion(task, WaitPolicy::default()).await?;
            println!("loaded: {:?}", status.state);
        }
        Err(err) => return Err(err),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let client = AsyncVectorClient::from_sync(VectorClient::connect("http://localhost:19530")?);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(load(&client))?;
    Ok(())
}
