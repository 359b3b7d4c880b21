//! tfplug - Terraform Plugin Framework for Rust
//!
//! A framework for building Terraform providers in Rust, implementing the
//! Terraform Plugin Protocol v6.

// Core modules
pub mod attribute_type;
pub mod error;
pub mod request;
pub mod schema;
pub mod types;

// Provider API
pub mod provider;

// Helper modules
pub mod defaults;
pub mod import;
pub mod plan_modifier;
pub mod validator;

// Protocol plumbing
pub mod grpc;
pub mod proto;
pub mod server;

// Re-exports for convenience
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use provider::{DataSource, Provider, Resource};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use server::{serve, ServerConfig};
pub use types::{AttributePath, Config, Diagnostics, Dynamic, State};
