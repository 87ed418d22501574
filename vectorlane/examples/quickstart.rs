//! Creates a collection, inserts a few rows, builds an index and loads it.
//!
//! Start the simulator first:
//!
//! ```text
//! cargo run -p vectorlane-server
//! cargo run -p vectorlane --example quickstart --features http
//! ```

use std::time::Duration;

use vectorlane::prelude::*;
use vectorlane::json;

fn main() -> vectorlane::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let endpoint =
        std::env::var("VECTORLANE_ENDPOINT").unwrap_or_else(|_| "http://localhost:19530".into());
    let client = VectorClient::connect(endpoint)?
        .with_config(ClientConfig::new().with_request_timeout(Duration::from_secs(5)));

    let schema = CollectionSchema::builder()
        .with_description("quickstart books")
        .add_field(
            FieldType::builder()
                .with_name("id")
                .with_data_type(DataType::Int64)
                .with_primary_key(true)
                .with_auto_id(true)
                .build()?,
        )
        .add_field(
            FieldType::builder()
                .with_name("title")
                .with_data_type(DataType::VarChar)
                .with_max_length(128)
                .build()?,
        )
        .add_field(
            FieldType::builder()
                .with_name("embedding")
                .with_data_type(DataType::FloatVector)
                .with_dimension(4)
                .build()?,
        )
        .build()?;

    let has = HasCollection::builder().with_collection_name("books").build()?;
    if client.has_collection(&has)? {
        client.drop_collection(&DropCollection::builder().with_collection_name("books").build()?)?;
    }
    client.create_collection(
        &CreateCollection::builder()
            .with_collection_name("books")
            .with_schema(schema)
            .build()?,
    )?;

    let insert = Insert::builder()
        .with_collection_name("books")
        .add_field("title", ["Dune", "Emma", "Ulysses"])
        .add_field(
            "embedding",
            [
                json!([0.1, 0.2, 0.3, 0.4]),
                json!([0.5, 0.6, 0.7, 0.8]),
                json!([0.9, 0.1, 0.2, 0.3]),
            ],
        )
        .build()?;
    let inserted = client.insert(&insert)?;
    println!("inserted {} rows, ids {:?}", inserted.insert_count, inserted.ids);

    let index = CreateIndex::builder()
        .with_collection_name("books")
        .with_field_name("embedding")
        .with_index_type(IndexType::IvfFlat)
        .with_metric_type(MetricType::L2)
        .with_param("nlist", "128")
        .with_waiting_interval(Duration::from_millis(250))
        .build()?;
    client.create_index(&index)?;
    println!("index built");

    let load = LoadCollection::builder()
        .with_collection_name("books")
        .with_waiting_timeout(Duration::from_secs(30))
        .build()?;
    client.load_collection(&load)?;

    let stats = client.get_collection_statistics(
        &GetCollectionStatistics::builder()
            .with_collection_name("books")
            .build()?,
    )?;
    println!("books loaded with {:?} rows", stats.row_count());
    Ok(())
}
