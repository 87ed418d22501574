//! Runs the client against the simulator in the same process.
//!
//! No server or network is needed: the simulator's `Service` is itself a
//! transport.

use std::time::Duration;

use vectorlane::prelude::*;
use vectorlane_server::Service;

fn main() -> vectorlane::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("vectorlane_core=info"))
        .init();

    let client = VectorClient::new(Service::new(Duration::from_millis(600)));

    let schema = CollectionSchema::builder()
        .add_field(
            FieldType::builder()
                .with_name("id")
                .with_data_type(DataType::Int64)
                .with_primary_key(true)
                .build()?,
        )
        .add_field(
            FieldType::builder()
                .with_name("fingerprint")
                .with_data_type(DataType::BinaryVector)
                .with_dimension(64)
                .build()?,
        )
        .build()?;
    client.create_collection(
        &CreateCollection::builder()
            .with_collection_name("molecules")
            .with_schema(schema)
            .with_consistency_level(ConsistencyLevel::Strong)
            .build()?,
    )?;

    // Rejected before anything is sent: Jaccard is not a float metric, but
    // IVF_FLAT is a float index.
    let mismatched = CreateIndex::builder()
        .with_collection_name("molecules")
        .with_field_name("fingerprint")
        .with_index_type(IndexType::IvfFlat)
        .with_metric_type(MetricType::Jaccard)
        .build();
    if let Err(err) = mismatched {
        println!("{:?}: {}", err.code(), err);
    }

    let index = CreateIndex::builder()
        .with_collection_name("molecules")
        .with_field_name("fingerprint")
        .with_index_type(IndexType::BinIvfFlat)
        .with_metric_type(MetricType::Jaccard)
        .with_param("nlist", "64")
        .with_waiting_interval(Duration::from_millis(100))
        .build()?;
    client.create_index(&index)?;

    let load = LoadCollection::builder()
        .with_collection_name("molecules")
        .with_waiting_interval(Duration::from_millis(100))
        .with_waiting_timeout(Duration::from_millis(300))
        .build()?;
    match client.load_collection(&load) {
        Ok(_) => println!("loaded"),
        Err(Error::OperationTimedOut { task, last_state, .. }) => {
            println!("{} still {:?}, resuming", task, last_state);
            client.wait(&task)?;
            println!("loaded");
        }
        Err(e) => return Err(e),
    }

    let description = client.describe_collection(
        &DescribeCollection::builder()
            .with_collection_name("molecules")
            .build()?,
    )?;
    println!(
        "{} ({} shards, {:?}) created at {}",
        description.name, description.num_shards, description.consistency_level, description.created_at
    );
    Ok(())
}
