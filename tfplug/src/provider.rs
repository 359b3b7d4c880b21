//! Provider, resource and data source traits
//!
//! Providers are factories: the gRPC service asks the provider for a fresh
//! resource or data source instance per request, so handlers own nothing
//! beyond what the provider hands them at construction (typically a cloned
//! API client). Schemas are served separately and are expected to be cheap
//! to return, usually from a `OnceLock`.

use crate::import::import_state_passthrough_id;
use crate::request::{
    ConfigureRequest, ConfigureResponse, CreateRequest, CreateResponse, DeleteRequest,
    DeleteResponse, ImportStateRequest, ImportStateResponse, ReadDataSourceRequest,
    ReadDataSourceResponse, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use crate::schema::{DataSourceSchema, ProviderSchema, ResourceSchema};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait Provider: Send + Sync {
    fn provider_schema(&self) -> ProviderSchema;

    async fn configure(&mut self, request: ConfigureRequest) -> ConfigureResponse;

    /// Fails with [`crate::TfplugError::ProviderNotConfigured`] before
    /// `configure` succeeded, or for unknown type names.
    async fn create_resource(&self, name: &str) -> Result<Box<dyn Resource>>;

    async fn create_data_source(&self, name: &str) -> Result<Box<dyn DataSource>>;

    async fn resource_schemas(&self) -> HashMap<String, ResourceSchema>;

    async fn data_source_schemas(&self) -> HashMap<String, DataSourceSchema>;
}

#[async_trait]
pub trait Resource: Send + Sync {
    async fn create(&self, request: CreateRequest) -> CreateResponse;

    async fn read(&self, request: ReadRequest) -> ReadResponse;

    async fn update(&self, request: UpdateRequest) -> UpdateResponse;

    async fn delete(&self, request: DeleteRequest) -> DeleteResponse;

    async fn import_state(&self, request: ImportStateRequest) -> ImportStateResponse {
        import_state_passthrough_id("id", &request)
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn read(&self, request: ReadDataSourceRequest) -> ReadDataSourceResponse;
}
