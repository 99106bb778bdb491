//! CouchDB Client Core Library
//!
//! This crate provides the transport-independent pieces of the client:
//! - Connection configuration
//! - Wire models shared with the HTTP client
//! - The error taxonomy for the CouchDB HTTP API

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{AuthMethod, ClientConfig};
pub use error::{Error, Result};
pub use models::{ErrorBody, SessionRequest};
