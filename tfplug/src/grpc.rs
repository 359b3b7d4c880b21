//! gRPC service implementation for the Terraform Plugin Protocol v6
//!
//! [`ProviderService`] adapts a factory-style [`Provider`] to the generated
//! tfplugin6 service. The provider sits behind a `RwLock`; only
//! ConfigureProvider takes the write side. Resource and data source handlers
//! are created per request and run without holding the lock.

use crate::defaults::DefaultRequest;
use crate::plan_modifier::{values_equal, PlanModifyRequest};
use crate::proto::{
    self, apply_resource_change, attribute_path, configure_provider, diagnostic, get_metadata,
    get_provider_schema, import_resource_state, plan_resource_change, provider_server,
    read_data_source, read_resource, stop_provider, upgrade_resource_state,
    validate_data_resource_config, validate_provider_config, validate_resource_config,
    ProviderServer,
};
use crate::provider::Provider;
use crate::request::{
    ConfigureRequest, CreateRequest, DeleteRequest, ImportStateRequest, ReadDataSourceRequest,
    ReadRequest, UpdateRequest,
};
use crate::schema::Schema;
use crate::types::{AttributePath, AttributePathStep, Config, Diagnostics, Dynamic, State};
use crate::TfplugError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tonic::{Request, Response, Status};

const MSGPACK_NIL: u8 = 0xc0;

pub struct ProviderService<P: Provider> {
    provider: Arc<RwLock<P>>,
}

impl<P: Provider + 'static> ProviderService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(RwLock::new(provider)),
        }
    }

    /// Wraps the service in the generated tonic server.
    pub fn into_server(self, max_message_size: usize) -> ProviderServer<Self> {
        ProviderServer::new(self)
            .max_decoding_message_size(max_message_size)
            .max_encoding_message_size(max_message_size)
    }

    async fn resource_schema(&self, type_name: &str) -> Result<Schema, Status> {
        let provider = self.provider.read().await;
        provider
            .resource_schemas()
            .await
            .remove(type_name)
            .ok_or_else(|| TfplugError::ResourceNotFound(type_name.to_string()).into())
    }

    async fn data_source_schema(&self, type_name: &str) -> Result<Schema, Status> {
        let provider = self.provider.read().await;
        provider
            .data_source_schemas()
            .await
            .remove(type_name)
            .ok_or_else(|| TfplugError::DataSourceNotFound(type_name.to_string()).into())
    }
}

#[tonic::async_trait]
impl<P: Provider + 'static> provider_server::Provider for ProviderService<P> {
    async fn get_metadata(
        &self,
        _request: Request<get_metadata::Request>,
    ) -> Result<Response<get_metadata::Response>, Status> {
        let provider = self.provider.read().await;
        let mut resources: Vec<String> = provider.resource_schemas().await.into_keys().collect();
        let mut data_sources: Vec<String> =
            provider.data_source_schemas().await.into_keys().collect();
        resources.sort();
        data_sources.sort();

        Ok(Response::new(get_metadata::Response {
            server_capabilities: Some(server_capabilities()),
            diagnostics: vec![],
            data_sources: data_sources
                .into_iter()
                .map(|type_name| get_metadata::DataSourceMetadata { type_name })
                .collect(),
            resources: resources
                .into_iter()
                .map(|type_name| get_metadata::ResourceMetadata { type_name })
                .collect(),
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<get_provider_schema::Request>,
    ) -> Result<Response<get_provider_schema::Response>, Status> {
        let provider = self.provider.read().await;

        let resource_schemas = provider
            .resource_schemas()
            .await
            .iter()
            .map(|(name, schema)| (name.clone(), schema_to_proto(schema)))
            .collect();
        let data_source_schemas = provider
            .data_source_schemas()
            .await
            .iter()
            .map(|(name, schema)| (name.clone(), schema_to_proto(schema)))
            .collect();

        Ok(Response::new(get_provider_schema::Response {
            provider: Some(schema_to_proto(&provider.provider_schema())),
            resource_schemas,
            data_source_schemas,
            diagnostics: vec![],
            provider_meta: None,
            server_capabilities: Some(server_capabilities()),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<validate_provider_config::Request>,
    ) -> Result<Response<validate_provider_config::Response>, Status> {
        let req = request.into_inner();
        let config = decode_values(req.config.as_ref())?;
        let schema = self.provider.read().await.provider_schema();

        Ok(Response::new(validate_provider_config::Response {
            diagnostics: diagnostics_to_proto(validate_config(&schema, &config)),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<validate_resource_config::Request>,
    ) -> Result<Response<validate_resource_config::Response>, Status> {
        let req = request.into_inner();
        let schema = self.resource_schema(&req.type_name).await?;
        let config = decode_values(req.config.as_ref())?;

        Ok(Response::new(validate_resource_config::Response {
            diagnostics: diagnostics_to_proto(validate_config(&schema, &config)),
        }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<validate_data_resource_config::Request>,
    ) -> Result<Response<validate_data_resource_config::Response>, Status> {
        let req = request.into_inner();
        let schema = self.data_source_schema(&req.type_name).await?;
        let config = decode_values(req.config.as_ref())?;

        Ok(Response::new(validate_data_resource_config::Response {
            diagnostics: diagnostics_to_proto(validate_config(&schema, &config)),
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<upgrade_resource_state::Request>,
    ) -> Result<Response<upgrade_resource_state::Response>, Status> {
        let req = request.into_inner();
        let schema = self.resource_schema(&req.type_name).await?;
        let mut diagnostics = Diagnostics::new();

        let raw = req.raw_state.unwrap_or_default();
        let upgraded_state = if !raw.json.is_empty() {
            let values: HashMap<String, Dynamic> = serde_json::from_slice(&raw.json)
                .map_err(|e| Status::invalid_argument(format!("Failed to decode raw state: {}", e)))?;
            let state = schema.complete_state(State::from(values));
            Some(encode_values(&state.values)?)
        } else if !raw.flatmap.is_empty() {
            diagnostics.add_error(
                "Unsupported state format",
                Some("Flatmap state from Terraform 0.11 and earlier cannot be upgraded"),
            );
            None
        } else {
            None
        };

        Ok(Response::new(upgrade_resource_state::Response {
            upgraded_state,
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<configure_provider::Request>,
    ) -> Result<Response<configure_provider::Response>, Status> {
        let req = request.into_inner();
        let config = decode_values(req.config.as_ref())?;

        tracing::debug!(
            terraform_version = %req.terraform_version,
            "configuring provider"
        );

        let mut provider = self.provider.write().await;
        let response = provider
            .configure(ConfigureRequest {
                config: Config::from(config),
            })
            .await;

        if response.diagnostics.has_errors() {
            tracing::warn!(
                errors = response.diagnostics.errors.len(),
                "provider configuration failed"
            );
        }

        Ok(Response::new(configure_provider::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn read_resource(
        &self,
        request: Request<read_resource::Request>,
    ) -> Result<Response<read_resource::Response>, Status> {
        let req = request.into_inner();
        let schema = self.resource_schema(&req.type_name).await?;
        let resource = self.provider.read().await.create_resource(&req.type_name).await?;

        let current_state = State::from(decode_values(req.current_state.as_ref())?);
        tracing::debug!(type_name = %req.type_name, "reading resource");

        let response = resource.read(ReadRequest { current_state }).await;

        let new_state = match response.state {
            Some(state) => encode_values(&schema.complete_state(state).values)?,
            None => {
                tracing::info!(type_name = %req.type_name, "resource no longer exists, removing from state");
                null_value()
            }
        };

        Ok(Response::new(read_resource::Response {
            new_state: Some(new_state),
            diagnostics: diagnostics_to_proto(response.diagnostics),
            private: req.private,
            deferred: None,
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<plan_resource_change::Request>,
    ) -> Result<Response<plan_resource_change::Response>, Status> {
        let req = request.into_inner();
        let schema = self.resource_schema(&req.type_name).await?;

        let prior_state = decode_values(req.prior_state.as_ref())?;
        let proposed_new_state = decode_values(req.proposed_new_state.as_ref())?;
        let config = decode_values(req.config.as_ref())?;

        // Destroy: nothing to plan
        if proposed_new_state.is_empty() {
            return Ok(Response::new(plan_resource_change::Response {
                planned_state: req.proposed_new_state,
                planned_private: req.prior_private,
                ..Default::default()
            }));
        }

        let plan = plan_change(&schema, &prior_state, proposed_new_state, &config);

        Ok(Response::new(plan_resource_change::Response {
            planned_state: Some(encode_values(&plan.planned_state)?),
            requires_replace: plan.requires_replace.iter().map(path_to_proto).collect(),
            planned_private: req.prior_private,
            diagnostics: diagnostics_to_proto(plan.diagnostics),
            legacy_type_system: false,
            deferred: None,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<apply_resource_change::Request>,
    ) -> Result<Response<apply_resource_change::Response>, Status> {
        let req = request.into_inner();
        let schema = self.resource_schema(&req.type_name).await?;
        let resource = self.provider.read().await.create_resource(&req.type_name).await?;

        let prior_state = decode_values(req.prior_state.as_ref())?;
        let planned_state = decode_values(req.planned_state.as_ref())?;
        let config = decode_values(req.config.as_ref())?;

        let (new_state, diagnostics) = if planned_state.is_empty() {
            tracing::debug!(type_name = %req.type_name, "deleting resource");
            let response = resource
                .delete(DeleteRequest {
                    current_state: State::from(prior_state),
                })
                .await;
            let new_state = if response.diagnostics.has_errors() {
                req.prior_state.unwrap_or_else(null_value)
            } else {
                null_value()
            };
            (new_state, response.diagnostics)
        } else if prior_state.is_empty() {
            tracing::debug!(type_name = %req.type_name, "creating resource");
            let response = resource
                .create(CreateRequest {
                    config: Config::from(config),
                    planned_state: State::from(planned_state),
                })
                .await;
            let new_state = if response.diagnostics.has_errors() {
                null_value()
            } else {
                encode_values(&schema.complete_state(response.state).values)?
            };
            (new_state, response.diagnostics)
        } else {
            tracing::debug!(type_name = %req.type_name, "updating resource");
            let response = resource
                .update(UpdateRequest {
                    config: Config::from(config),
                    planned_state: State::from(planned_state),
                    current_state: State::from(prior_state),
                })
                .await;
            let new_state = if response.diagnostics.has_errors() {
                req.prior_state.unwrap_or_else(null_value)
            } else {
                encode_values(&schema.complete_state(response.state).values)?
            };
            (new_state, response.diagnostics)
        };

        for error in &diagnostics.errors {
            tracing::error!(type_name = %req.type_name, summary = %error.summary, "apply failed");
        }

        Ok(Response::new(apply_resource_change::Response {
            new_state: Some(new_state),
            private: vec![],
            diagnostics: diagnostics_to_proto(diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<import_resource_state::Request>,
    ) -> Result<Response<import_resource_state::Response>, Status> {
        let req = request.into_inner();
        let schema = self.resource_schema(&req.type_name).await?;
        let resource = self.provider.read().await.create_resource(&req.type_name).await?;

        let response = resource
            .import_state(ImportStateRequest { id: req.id })
            .await;

        let imported_resources = match response.state {
            Some(state) if !response.diagnostics.has_errors() => {
                vec![import_resource_state::ImportedResource {
                    type_name: req.type_name,
                    state: Some(encode_values(&schema.complete_state(state).values)?),
                    private: vec![],
                }]
            }
            _ => vec![],
        };

        Ok(Response::new(import_resource_state::Response {
            imported_resources,
            diagnostics: diagnostics_to_proto(response.diagnostics),
            deferred: None,
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<read_data_source::Request>,
    ) -> Result<Response<read_data_source::Response>, Status> {
        let req = request.into_inner();
        let schema = self.data_source_schema(&req.type_name).await?;
        let data_source = self
            .provider
            .read()
            .await
            .create_data_source(&req.type_name)
            .await?;

        let config = Config::from(decode_values(req.config.as_ref())?);
        tracing::debug!(type_name = %req.type_name, "reading data source");

        let response = data_source.read(ReadDataSourceRequest { config }).await;

        let state = match response.state {
            Some(state) => Some(encode_values(&schema.complete_state(state).values)?),
            None => None,
        };

        Ok(Response::new(read_data_source::Response {
            state,
            diagnostics: diagnostics_to_proto(response.diagnostics),
            deferred: None,
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<stop_provider::Request>,
    ) -> Result<Response<stop_provider::Response>, Status> {
        tracing::debug!("stop requested");
        Ok(Response::new(stop_provider::Response {
            error: String::new(),
        }))
    }
}

/// Outcome of planning a create or update
#[derive(Debug)]
pub struct PlannedChange {
    pub planned_state: HashMap<String, Dynamic>,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Diagnostics,
}

/// Computes the planned state for a create (`prior_state` empty) or update.
///
/// 1. Optional+Computed attributes left null in config take their default.
/// 2. If anything differs from the prior state, computed attributes left
///    null in config become unknown.
/// 3. On update, plan modifiers run in declaration order.
pub fn plan_change(
    schema: &Schema,
    prior_state: &HashMap<String, Dynamic>,
    proposed_new_state: HashMap<String, Dynamic>,
    config: &HashMap<String, Dynamic>,
) -> PlannedChange {
    let is_create = prior_state.is_empty();
    let mut planned = proposed_new_state;
    let mut requires_replace = Vec::new();
    let mut diagnostics = Diagnostics::new();

    for attr in schema.sorted_attributes() {
        if let Some(default) = &attr.default {
            let configured = config.get(&attr.name).unwrap_or(&Dynamic::Null);
            if attr.optional && attr.computed && configured.is_null() {
                let response = default.default_value(DefaultRequest {
                    attribute_path: attr.name.clone(),
                });
                planned.insert(attr.name.clone(), response.value);
            }
        }
    }

    let changed = is_create
        || schema.attributes.keys().any(|name| {
            !values_equal(
                planned.get(name).unwrap_or(&Dynamic::Null),
                prior_state.get(name).unwrap_or(&Dynamic::Null),
            )
        });

    if changed {
        for attr in schema.attributes.values() {
            let configured = config.get(&attr.name).unwrap_or(&Dynamic::Null);
            if attr.computed && attr.default.is_none() && configured.is_null() {
                planned.insert(attr.name.clone(), Dynamic::Unknown);
            }
        }
    }

    if !is_create {
        for attr in schema.sorted_attributes() {
            if attr.plan_modifiers.is_empty() {
                continue;
            }

            let state_value = prior_state.get(&attr.name).cloned().unwrap_or_default();
            let config_value = config.get(&attr.name).cloned().unwrap_or_default();
            let mut plan_value = planned.get(&attr.name).cloned().unwrap_or_default();
            let mut replace = false;

            for modifier in &attr.plan_modifiers {
                let response = modifier.modify_plan(PlanModifyRequest {
                    state: state_value.clone(),
                    plan: plan_value,
                    config: config_value.clone(),
                    attribute_path: attr.name.clone(),
                });
                plan_value = response.plan_value;
                replace |= response.requires_replace;
                diagnostics.extend(response.diagnostics);
            }

            if replace {
                requires_replace.push(AttributePath::new(&attr.name));
            }
            planned.insert(attr.name.clone(), plan_value);
        }
    }

    PlannedChange {
        planned_state: planned,
        requires_replace,
        diagnostics,
    }
}

/// Checks configuration against the schema: required attributes are set,
/// types match, nothing undeclared, and attribute validators pass.
pub fn validate_config(schema: &Schema, config: &HashMap<String, Dynamic>) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    for attr in schema.sorted_attributes() {
        let value = config.get(&attr.name).unwrap_or(&Dynamic::Null);

        if attr.required && value.is_null() {
            diagnostics.add_attribute_error(
                AttributePath::new(&attr.name),
                format!("Missing required argument: {}", attr.name),
                format!("The argument \"{}\" is required, but no definition was found.", attr.name),
            );
            continue;
        }

        if !attr.r#type.accepts(value) {
            diagnostics.add_attribute_error(
                AttributePath::new(&attr.name),
                format!("Incorrect attribute value type: {}", attr.name),
                format!(
                    "Attribute \"{}\" expects {} but got {}",
                    attr.name,
                    attr.r#type.to_json(),
                    value.type_name()
                ),
            );
            continue;
        }

        if !value.is_null() && !value.is_unknown() {
            for validator in &attr.validators {
                validator.validate(value, &attr.name, &mut diagnostics);
            }
        }
    }

    let mut undeclared: Vec<&String> = config
        .keys()
        .filter(|name| !schema.attributes.contains_key(*name))
        .collect();
    undeclared.sort();
    for name in undeclared {
        diagnostics.add_attribute_error(
            AttributePath::new(name),
            format!("Unsupported argument: {}", name),
            format!("An argument named \"{}\" is not expected here.", name),
        );
    }

    diagnostics
}

fn server_capabilities() -> proto::ServerCapabilities {
    proto::ServerCapabilities {
        plan_destroy: false,
        get_provider_schema_optional: false,
        move_resource_state: false,
    }
}

fn schema_to_proto(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version,
        block: Some(proto::schema::Block {
            version: schema.version,
            attributes: schema
                .sorted_attributes()
                .into_iter()
                .map(|attr| proto::schema::Attribute {
                    name: attr.name.clone(),
                    r#type: attr.r#type.to_bytes(),
                    description: attr.description.clone(),
                    required: attr.required,
                    optional: attr.optional,
                    computed: attr.computed,
                    sensitive: attr.sensitive,
                    description_kind: proto::StringKind::Plain as i32,
                    deprecated: false,
                    write_only: false,
                })
                .collect(),
            block_types: vec![],
            description: schema.description.clone(),
            description_kind: proto::StringKind::Plain as i32,
            deprecated: false,
        }),
    }
}

#[allow(clippy::result_large_err)]
fn decode_values(value: Option<&proto::DynamicValue>) -> Result<HashMap<String, Dynamic>, Status> {
    let Some(value) = value else {
        return Ok(HashMap::new());
    };

    let decoded = if !value.msgpack.is_empty() {
        rmp_serde::from_slice::<Option<HashMap<String, Dynamic>>>(&value.msgpack)
            .map_err(|e| TfplugError::DecodingError(format!("msgpack: {}", e)))?
    } else if !value.json.is_empty() {
        serde_json::from_slice::<Option<HashMap<String, Dynamic>>>(&value.json)
            .map_err(|e| TfplugError::DecodingError(format!("json: {}", e)))?
    } else {
        None
    };

    Ok(decoded.unwrap_or_default())
}

#[allow(clippy::result_large_err)]
fn encode_values(values: &HashMap<String, Dynamic>) -> Result<proto::DynamicValue, Status> {
    let msgpack = rmp_serde::to_vec_named(values)
        .map_err(|e| TfplugError::EncodingError(format!("msgpack: {}", e)))?;

    Ok(proto::DynamicValue {
        msgpack,
        json: vec![],
    })
}

fn null_value() -> proto::DynamicValue {
    proto::DynamicValue {
        msgpack: vec![MSGPACK_NIL],
        json: vec![],
    }
}

fn path_to_proto(path: &AttributePath) -> proto::AttributePath {
    use attribute_path::step::Selector;

    proto::AttributePath {
        steps: path
            .steps
            .iter()
            .map(|step| attribute_path::Step {
                selector: Some(match step {
                    AttributePathStep::AttributeName(name) => Selector::AttributeName(name.clone()),
                    AttributePathStep::ElementKeyString(key) => {
                        Selector::ElementKeyString(key.clone())
                    }
                    AttributePathStep::ElementKeyInt(idx) => Selector::ElementKeyInt(*idx),
                }),
            })
            .collect(),
    }
}

fn diagnostics_to_proto(diags: Diagnostics) -> Vec<proto::Diagnostic> {
    let errors = diags
        .errors
        .into_iter()
        .map(|d| (diagnostic::Severity::Error, d));
    let warnings = diags
        .warnings
        .into_iter()
        .map(|d| (diagnostic::Severity::Warning, d));

    errors
        .chain(warnings)
        .map(|(severity, d)| proto::Diagnostic {
            severity: severity as i32,
            summary: d.summary,
            detail: d.detail.unwrap_or_default(),
            attribute: d.attribute.as_ref().map(path_to_proto),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::defaults::StaticDefault;
    use crate::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
    use crate::provider::{DataSource, Resource};
    use crate::request::{
        ConfigureResponse, CreateResponse, DeleteResponse, ReadDataSourceResponse, ReadResponse,
        UpdateResponse,
    };
    use crate::schema::{AttributeBuilder, SchemaBuilder};
    use crate::validator::StringOneOfValidator;
    use crate::Result;
    use async_trait::async_trait;
    use provider_server::Provider as _;

    fn widget_schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::string("id")
                    .computed()
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(AttributeBuilder::string("name").required())
            .attribute(
                AttributeBuilder::string("region")
                    .required()
                    .plan_modifier(Box::new(RequiresReplaceIfChanged))
                    .validator(StringOneOfValidator::create(&["eu-west-1", "us-east-1"])),
            )
            .attribute(
                AttributeBuilder::string("tier")
                    .optional()
                    .computed()
                    .default(StaticDefault::string("STANDARD")),
            )
            .attribute(AttributeBuilder::string("status").computed())
            .build_resource(0)
    }

    struct TestProvider {
        configured: bool,
    }

    #[async_trait]
    impl Provider for TestProvider {
        fn provider_schema(&self) -> Schema {
            SchemaBuilder::new()
                .attribute(AttributeBuilder::string("endpoint").optional())
                .build_provider()
        }

        async fn configure(&mut self, _request: ConfigureRequest) -> ConfigureResponse {
            self.configured = true;
            ConfigureResponse {
                diagnostics: Diagnostics::new(),
            }
        }

        async fn create_resource(&self, name: &str) -> Result<Box<dyn Resource>> {
            if !self.configured {
                return Err(TfplugError::ProviderNotConfigured);
            }
            match name {
                "test_widget" => Ok(Box::new(TestResource)),
                _ => Err(TfplugError::ResourceNotFound(name.to_string())),
            }
        }

        async fn create_data_source(&self, name: &str) -> Result<Box<dyn DataSource>> {
            match name {
                "test_widgets" => Ok(Box::new(TestDataSource)),
                _ => Err(TfplugError::DataSourceNotFound(name.to_string())),
            }
        }

        async fn resource_schemas(&self) -> HashMap<String, Schema> {
            HashMap::from([("test_widget".to_string(), widget_schema())])
        }

        async fn data_source_schemas(&self) -> HashMap<String, Schema> {
            HashMap::from([(
                "test_widgets".to_string(),
                SchemaBuilder::new()
                    .attribute(AttributeBuilder::string("id").computed())
                    .attribute(AttributeBuilder::string("value").computed())
                    .build_data_source(0),
            )])
        }
    }

    struct TestResource;

    #[async_trait]
    impl Resource for TestResource {
        async fn create(&self, request: CreateRequest) -> CreateResponse {
            let mut diagnostics = Diagnostics::new();
            let mut state = request.planned_state;
            if state.get_string("name").as_deref() == Some("fail") {
                diagnostics.add_error("Unable to create widget, got error: boom", None::<String>);
            }
            state.set("id", "test-123");
            CreateResponse { state, diagnostics }
        }

        async fn read(&self, request: ReadRequest) -> ReadResponse {
            let gone = request.current_state.get_string("id").as_deref() == Some("gone");
            ReadResponse {
                state: (!gone).then_some(request.current_state),
                diagnostics: Diagnostics::new(),
            }
        }

        async fn update(&self, request: UpdateRequest) -> UpdateResponse {
            UpdateResponse {
                state: request.planned_state,
                diagnostics: Diagnostics::new(),
            }
        }

        async fn delete(&self, _request: DeleteRequest) -> DeleteResponse {
            DeleteResponse {
                diagnostics: Diagnostics::new(),
            }
        }
    }

    struct TestDataSource;

    #[async_trait]
    impl DataSource for TestDataSource {
        async fn read(&self, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
            let mut state = State::new();
            state.set("value", "test-value");
            ReadDataSourceResponse {
                state: Some(state),
                diagnostics: Diagnostics::new(),
            }
        }
    }

    fn service(configured: bool) -> ProviderService<TestProvider> {
        ProviderService::new(TestProvider { configured })
    }

    fn values(pairs: &[(&str, Dynamic)]) -> HashMap<String, Dynamic> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn dv(pairs: &[(&str, Dynamic)]) -> Option<proto::DynamicValue> {
        Some(encode_values(&values(pairs)).unwrap())
    }

    fn decode(value: Option<proto::DynamicValue>) -> HashMap<String, Dynamic> {
        decode_values(value.as_ref()).unwrap()
    }

    #[test]
    fn plan_create_applies_defaults_and_marks_computed_unknown() {
        let config = values(&[
            ("name", Dynamic::from("w1")),
            ("region", Dynamic::from("eu-west-1")),
        ]);
        let mut proposed = config.clone();
        proposed.insert("id".into(), Dynamic::Null);
        proposed.insert("tier".into(), Dynamic::Null);
        proposed.insert("status".into(), Dynamic::Null);

        let plan = plan_change(&widget_schema(), &HashMap::new(), proposed, &config);

        assert_eq!(plan.planned_state["tier"], Dynamic::from("STANDARD"));
        assert!(plan.planned_state["id"].is_unknown());
        assert!(plan.planned_state["status"].is_unknown());
        assert!(plan.requires_replace.is_empty());
    }

    #[test]
    fn plan_without_changes_keeps_prior_state() {
        let prior = values(&[
            ("id", Dynamic::from("abc")),
            ("name", Dynamic::from("w1")),
            ("region", Dynamic::from("eu-west-1")),
            ("tier", Dynamic::from("STANDARD")),
            ("status", Dynamic::from("RUNNING")),
        ]);
        let config = values(&[
            ("name", Dynamic::from("w1")),
            ("region", Dynamic::from("eu-west-1")),
        ]);

        let plan = plan_change(&widget_schema(), &prior, prior.clone(), &config);

        assert_eq!(plan.planned_state, prior);
        assert!(plan.requires_replace.is_empty());
    }

    #[test]
    fn plan_update_keeps_id_and_recomputes_status() {
        let prior = values(&[
            ("id", Dynamic::from("abc")),
            ("name", Dynamic::from("w1")),
            ("region", Dynamic::from("eu-west-1")),
            ("tier", Dynamic::from("STANDARD")),
            ("status", Dynamic::from("RUNNING")),
        ]);
        let config = values(&[
            ("name", Dynamic::from("w2")),
            ("region", Dynamic::from("eu-west-1")),
        ]);
        let mut proposed = prior.clone();
        proposed.insert("name".into(), Dynamic::from("w2"));

        let plan = plan_change(&widget_schema(), &prior, proposed, &config);

        assert_eq!(plan.planned_state["id"], Dynamic::from("abc"));
        assert!(plan.planned_state["status"].is_unknown());
        assert!(plan.requires_replace.is_empty());
    }

    #[test]
    fn plan_reports_replacement_for_changed_region() {
        let prior = values(&[
            ("id", Dynamic::from("abc")),
            ("name", Dynamic::from("w1")),
            ("region", Dynamic::from("eu-west-1")),
            ("tier", Dynamic::from("STANDARD")),
        ]);
        let config = values(&[
            ("name", Dynamic::from("w1")),
            ("region", Dynamic::from("us-east-1")),
        ]);
        let mut proposed = prior.clone();
        proposed.insert("region".into(), Dynamic::from("us-east-1"));

        let plan = plan_change(&widget_schema(), &prior, proposed, &config);

        assert_eq!(plan.requires_replace, vec![AttributePath::new("region")]);
    }

    #[test]
    fn validate_config_reports_missing_mistyped_invalid_and_undeclared() {
        let config = values(&[
            ("name", Dynamic::Number(1.0)),
            ("region", Dynamic::from("mars-1")),
            ("colour", Dynamic::from("blue")),
        ]);

        let diags = validate_config(&widget_schema(), &config);
        let summaries: Vec<&str> = diags.errors.iter().map(|d| d.summary.as_str()).collect();

        assert_eq!(
            summaries,
            vec![
                "Incorrect attribute value type: name",
                "Invalid value for region",
                "Unsupported argument: colour",
            ]
        );

        let diags = validate_config(&widget_schema(), &values(&[("region", Dynamic::Unknown)]));
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].summary, "Missing required argument: name");
    }

    #[tokio::test]
    async fn get_provider_schema_lists_everything() {
        let response = service(false)
            .get_provider_schema(Request::new(get_provider_schema::Request {}))
            .await
            .unwrap()
            .into_inner();

        assert!(response.provider.is_some());
        assert!(response.resource_schemas.contains_key("test_widget"));
        assert!(response.data_source_schemas.contains_key("test_widgets"));

        let block = response.resource_schemas["test_widget"].block.clone().unwrap();
        let names: Vec<&str> = block.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "region", "status", "tier"]);
    }

    #[tokio::test]
    async fn get_metadata_lists_type_names() {
        let response = service(false)
            .get_metadata(Request::new(get_metadata::Request {}))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.resources[0].type_name, "test_widget");
        assert_eq!(response.data_sources[0].type_name, "test_widgets");
    }

    #[tokio::test]
    async fn apply_create_returns_completed_state() {
        let service = service(true);
        let planned = &[
            ("id", Dynamic::Unknown),
            ("name", Dynamic::from("w1")),
            ("region", Dynamic::from("eu-west-1")),
            ("tier", Dynamic::from("STANDARD")),
            ("status", Dynamic::Unknown),
        ];

        let response = service
            .apply_resource_change(Request::new(apply_resource_change::Request {
                type_name: "test_widget".to_string(),
                prior_state: Some(null_value()),
                planned_state: dv(planned),
                config: dv(&planned[1..3]),
                planned_private: vec![],
                provider_meta: None,
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.diagnostics.is_empty());
        let state = decode(response.new_state);
        assert_eq!(state["id"], Dynamic::from("test-123"));
        assert!(state["status"].is_null());
        assert_eq!(state.len(), 5);
    }

    #[tokio::test]
    async fn apply_create_failure_commits_no_state() {
        let response = service(true)
            .apply_resource_change(Request::new(apply_resource_change::Request {
                type_name: "test_widget".to_string(),
                prior_state: Some(null_value()),
                planned_state: dv(&[("name", Dynamic::from("fail"))]),
                config: dv(&[("name", Dynamic::from("fail"))]),
                planned_private: vec![],
                provider_meta: None,
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].severity,
            diagnostic::Severity::Error as i32
        );
        assert!(decode(response.new_state).is_empty());
    }

    #[tokio::test]
    async fn read_resource_returns_null_state_when_gone() {
        let response = service(true)
            .read_resource(Request::new(read_resource::Request {
                type_name: "test_widget".to_string(),
                current_state: dv(&[("id", Dynamic::from("gone"))]),
                private: vec![],
                provider_meta: None,
                client_capabilities: None,
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.new_state.unwrap().msgpack, vec![MSGPACK_NIL]);
    }

    #[tokio::test]
    async fn import_passes_id_through() {
        let response = service(true)
            .import_resource_state(Request::new(import_resource_state::Request {
                type_name: "test_widget".to_string(),
                id: "abc123".to_string(),
                client_capabilities: None,
            }))
            .await
            .unwrap()
            .into_inner();

        let imported = &response.imported_resources[0];
        let state = decode(imported.state.clone());
        assert_eq!(state["id"], Dynamic::from("abc123"));
        assert!(state["name"].is_null());
    }

    #[tokio::test]
    async fn upgrade_state_reencodes_json_as_msgpack() {
        let response = service(true)
            .upgrade_resource_state(Request::new(upgrade_resource_state::Request {
                type_name: "test_widget".to_string(),
                version: 0,
                raw_state: Some(proto::RawState {
                    json: br#"{"id":"abc","name":"w1","legacy":true}"#.to_vec(),
                    flatmap: HashMap::new(),
                }),
            }))
            .await
            .unwrap()
            .into_inner();

        let state = decode(response.upgraded_state);
        assert_eq!(state["id"], Dynamic::from("abc"));
        assert!(!state.contains_key("legacy"));
        assert!(state["region"].is_null());
    }

    #[tokio::test]
    async fn read_data_source_uses_factory() {
        let response = service(true)
            .read_data_source(Request::new(read_data_source::Request {
                type_name: "test_widgets".to_string(),
                config: dv(&[]),
                provider_meta: None,
                client_capabilities: None,
            }))
            .await
            .unwrap()
            .into_inner();

        let state = decode(response.state);
        assert_eq!(state["value"], Dynamic::from("test-value"));
        assert!(state["id"].is_null());
    }

    #[tokio::test]
    async fn unknown_type_names_are_rejected() {
        let result = service(true)
            .apply_resource_change(Request::new(apply_resource_change::Request {
                type_name: "non_existent".to_string(),
                prior_state: None,
                planned_state: None,
                config: None,
                planned_private: vec![],
                provider_meta: None,
            }))
            .await;

        let status = result.unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);
        assert!(status.message().contains("non_existent"));
    }

    #[tokio::test]
    async fn resources_require_configuration() {
        let result = service(false)
            .read_resource(Request::new(read_resource::Request {
                type_name: "test_widget".to_string(),
                current_state: dv(&[("id", Dynamic::from("abc"))]),
                private: vec![],
                provider_meta: None,
                client_capabilities: None,
            }))
            .await;

        assert_eq!(result.unwrap_err().code(), tonic::Code::FailedPrecondition);
    }
}
