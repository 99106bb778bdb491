//! CouchDB Client Library
//!
//! HTTP client for the Apache CouchDB REST API: database lifecycle,
//! document CRUD, bulk operations, Mango indexes, the changes feed,
//! security objects, compaction, purge/revision limits and attachments.

mod client;

pub use client::Client;
pub use couchdb_core::{AuthMethod, ClientConfig, Error, Result};
