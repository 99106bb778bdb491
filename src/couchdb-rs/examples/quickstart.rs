//! Minimal end-to-end usage of the CouchDB client.
//!
//! Expects a CouchDB instance on localhost:5984.
//!
//! Run with: cargo run --example quickstart

use couchdb_rs::{Client, ClientConfig};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("couchdb_rs=debug")),
        )
        .init();

    let config = ClientConfig::new("localhost", 5984, "admin", "secret");
    let client = Client::connect(config).await?;

    if !client.is_database_exists("demo").await? {
        client.create_database("demo", &[]).await?;
        println!("created database demo");
    }

    let created = client
        .create_document("demo", &json!({"title": "hello", "tags": ["demo"]}), &[])
        .await?;
    println!("created document: {}", created);

    let docs = client
        .get_all_documents("demo", &[("include_docs", "true")])
        .await?;
    println!("all documents: {}", docs);

    Ok(())
}
