//! Chore Service Library
//!
//! Family chore tracking backend: parents define categories and
//! point-valued tasks, members complete them and collect points. Login
//! issues a short-lived bearer token; every other RPC is gated by the
//! authentication layer from `grpc-auth`.
//!
//! ## Modules
//!
//! - `config`: Service configuration
//! - `db`: Database repositories (users, categories, tasks, task feed)
//! - `error`: Error types
//! - `grpc`: gRPC server implementation and generated stubs
//! - `models`: Data models
//! - `security`: Password and PIN hashing

pub mod config;
pub mod db;
pub mod error;
pub mod grpc;
pub mod models;
pub mod security;

// Re-export commonly used types
pub use error::{ChoreError, Result};
pub use grpc::ChoreServer;
