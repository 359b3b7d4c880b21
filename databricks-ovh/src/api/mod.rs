//! OVH API client for the Databricks endpoints

pub mod client;
pub mod common;
pub mod endpoint;
pub mod error;

pub use client::{Client, Credentials};
pub use common::LenientId;
pub use error::ApiError;

/// Base path of every Databricks collection on the OVH API
pub const DATABRICKS_BASE: &str = "/cloud/project/databricks";
