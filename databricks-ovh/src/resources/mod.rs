//! Resource implementations
//!
//! Every resource shares one lifecycle, implemented once by
//! [`ManagedResource`]. A [`ResourceKind`] supplies what differs: the schema,
//! the REST collection, and the typed records exchanged with the API.

pub mod cluster_policy;
pub mod fields;
pub mod instance_pool;
pub mod job;
pub mod notebook;
pub mod secret_scope;
pub mod workspace;

pub use cluster_policy::ClusterPolicy;
pub use instance_pool::InstancePool;
pub use job::Job;
pub use notebook::Notebook;
pub use secret_scope::SecretScope;
pub use workspace::Workspace;

use crate::api::common::IdEnvelope;
use crate::api::{ApiError, Client};
use async_trait::async_trait;
use fields::{resolve_from_prior, Changes};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use tfplug::request::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ReadRequest, ReadResponse,
    UpdateRequest, UpdateResponse,
};
use tfplug::schema::ResourceSchema;
use tfplug::{Diagnostics, Resource, State};

/// How a resource is removed upstream
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteCall {
    Delete(String),
    Post(String, Value),
}

/// Response record projected onto Terraform state
pub trait ApplyToState {
    /// Sets every field the record carries; absent fields leave state untouched
    fn apply_to(self, state: &mut State);
}

pub trait ResourceKind: Send + Sync + 'static {
    /// Terraform type name, e.g. `databricks-ovh_workspace`
    const TYPE_NAME: &'static str;
    /// REST collection path; items live at `<COLLECTION>/<id>`
    const COLLECTION: &'static str;
    /// Human label used in diagnostics
    const LABEL: &'static str;

    type CreatePayload: Serialize + Send + Sync;
    type UpdatePayload: Serialize + Send + Sync;
    type Record: DeserializeOwned + ApplyToState + Send;

    fn schema() -> ResourceSchema;

    fn create_payload(plan: &State) -> Self::CreatePayload;

    /// `None` when the resource has no mutable attributes; Update then
    /// refreshes instead of sending a request.
    fn update_payload(changes: &Changes<'_>) -> Option<Self::UpdatePayload>;

    fn delete_call(id: &str, _state: &State) -> DeleteCall {
        DeleteCall::Delete(item_path::<Self>(id))
    }
}

pub fn item_path<S: ResourceKind + ?Sized>(id: &str) -> String {
    format!("{}/{}", S::COLLECTION, id)
}

/// CRUD handler for one resource type
pub struct ManagedResource<S: ResourceKind> {
    client: Client,
    kind: PhantomData<S>,
}

impl<S: ResourceKind> ManagedResource<S> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            kind: PhantomData,
        }
    }

    fn client_error(diagnostics: &mut Diagnostics, operation: &str, err: &ApiError) {
        tracing::error!("Unable to {} {}: {}", operation, S::LABEL, err);
        diagnostics.add_error(
            "Client Error",
            Some(format!(
                "Unable to {} {}, got error: {}",
                operation,
                S::LABEL,
                err
            )),
        );
    }

    fn decode_error(diagnostics: &mut Diagnostics, detail: impl std::fmt::Display) {
        diagnostics.add_error(
            format!("Unable to decode {} response", S::LABEL),
            Some(detail.to_string()),
        );
    }

    /// Decodes a response and overlays it on `state`
    fn apply_response(value: Value, state: &mut State, diagnostics: &mut Diagnostics) {
        match serde_json::from_value::<S::Record>(value) {
            Ok(record) => record.apply_to(state),
            Err(e) => Self::decode_error(diagnostics, e),
        }
    }
}

#[async_trait]
impl<S: ResourceKind> Resource for ManagedResource<S> {
    async fn create(&self, request: CreateRequest) -> CreateResponse {
        let mut diagnostics = Diagnostics::new();
        let mut state = request.planned_state;

        tracing::debug!("creating {}", S::LABEL);

        let payload = S::create_payload(&state);
        let response: Value = match self.client.post(S::COLLECTION, &payload).await {
            Ok(response) => response,
            Err(e) => {
                Self::client_error(&mut diagnostics, "create", &e);
                return CreateResponse { state, diagnostics };
            }
        };

        let id = match serde_json::from_value::<IdEnvelope>(response.clone()) {
            Ok(IdEnvelope { id: Some(id) }) if !id.0.is_empty() => id.into_inner(),
            Ok(_) => {
                Self::decode_error(&mut diagnostics, "response did not include an id");
                return CreateResponse { state, diagnostics };
            }
            Err(e) => {
                Self::decode_error(&mut diagnostics, e);
                return CreateResponse { state, diagnostics };
            }
        };

        state.set("id", id.clone());
        tracing::info!("created {} {}", S::LABEL, id);

        // The object exists upstream now, so state is committed with its id
        // even when the rest of the response does not decode.
        match serde_json::from_value::<S::Record>(response) {
            Ok(record) => record.apply_to(&mut state),
            Err(e) => {
                tracing::warn!("{} {} created but response did not decode: {}", S::LABEL, id, e);
                diagnostics.add_warning(
                    format!("Unable to decode {} response", S::LABEL),
                    Some(format!(
                        "{} {} was created, but the response could not be decoded: {}. Run a refresh to load its attributes.",
                        S::LABEL,
                        id,
                        e
                    )),
                );
            }
        }

        CreateResponse { state, diagnostics }
    }

    async fn read(&self, request: ReadRequest) -> ReadResponse {
        let mut diagnostics = Diagnostics::new();
        let mut state = request.current_state;

        let Some(id) = state.get_string("id").filter(|id| !id.is_empty()) else {
            return ReadResponse {
                state: None,
                diagnostics,
            };
        };

        match self.client.get::<Value>(&item_path::<S>(&id)).await {
            Ok(response) => {
                Self::apply_response(response, &mut state, &mut diagnostics);
                ReadResponse {
                    state: Some(state),
                    diagnostics,
                }
            }
            Err(e @ ApiError::NotFound) => {
                tracing::warn!("{} {} not found, removing from state", S::LABEL, id);
                diagnostics.add_warning(
                    "Resource Not Found",
                    Some(format!(
                        "Unable to read {}, got error: {}. It was removed from state and will be recreated on the next apply.",
                        S::LABEL,
                        e
                    )),
                );
                ReadResponse {
                    state: None,
                    diagnostics,
                }
            }
            Err(e) => {
                Self::client_error(&mut diagnostics, "read", &e);
                ReadResponse {
                    state: None,
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, request: UpdateRequest) -> UpdateResponse {
        let mut diagnostics = Diagnostics::new();
        let prior = request.current_state;
        let mut state = resolve_from_prior(request.planned_state, &prior);

        let Some(payload) = S::update_payload(&Changes::new(&state, &prior)) else {
            let refreshed = self
                .read(ReadRequest {
                    current_state: state.clone(),
                })
                .await;
            return UpdateResponse {
                state: refreshed.state.unwrap_or(state),
                diagnostics: refreshed.diagnostics,
            };
        };

        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => {
                diagnostics.add_error(
                    format!("Unable to encode {} update", S::LABEL),
                    Some(e.to_string()),
                );
                return UpdateResponse { state, diagnostics };
            }
        };

        if body.as_object().is_some_and(|fields| fields.is_empty()) {
            tracing::debug!("no changes to send for {}", S::LABEL);
            return UpdateResponse { state, diagnostics };
        }

        let id = state.get_string("id").unwrap_or_default();
        match self.client.put::<Value, _>(&item_path::<S>(&id), &body).await {
            Ok(Value::Null) => {}
            Ok(response) => Self::apply_response(response, &mut state, &mut diagnostics),
            Err(e) => Self::client_error(&mut diagnostics, "update", &e),
        }

        UpdateResponse { state, diagnostics }
    }

    async fn delete(&self, request: DeleteRequest) -> DeleteResponse {
        let mut diagnostics = Diagnostics::new();
        let state = request.current_state;
        let id = state.get_string("id").unwrap_or_default();

        let result = match S::delete_call(&id, &state) {
            DeleteCall::Delete(path) => self.client.delete::<Value>(&path).await,
            DeleteCall::Post(path, body) => self.client.post::<Value, _>(&path, &body).await,
        };

        match result {
            Ok(_) => tracing::info!("deleted {} {}", S::LABEL, id),
            Err(ApiError::NotFound) => tracing::debug!("{} {} already gone", S::LABEL, id),
            Err(e) => Self::client_error(&mut diagnostics, "delete", &e),
        }

        DeleteResponse { diagnostics }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::Credentials;
    use fields::set_present;
    use mockito::{Matcher, Server};
    use serde::Deserialize;
    use serde_json::json;
    use tfplug::{AttributeBuilder, Dynamic, SchemaBuilder};

    struct Gadget;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct GadgetPayload {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    }

    #[derive(Serialize)]
    struct GadgetUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: fields::Patch<String>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct GadgetRecord {
        name: Option<String>,
        gadget_status: Option<String>,
    }

    impl ApplyToState for GadgetRecord {
        fn apply_to(self, state: &mut State) {
            set_present(state, "name", self.name);
            set_present(state, "gadget_status", self.gadget_status);
        }
    }

    impl ResourceKind for Gadget {
        const TYPE_NAME: &'static str = "databricks-ovh_gadget";
        const COLLECTION: &'static str = "/cloud/project/databricks/gadget";
        const LABEL: &'static str = "gadget";

        type CreatePayload = GadgetPayload;
        type UpdatePayload = GadgetUpdate;
        type Record = GadgetRecord;

        fn schema() -> ResourceSchema {
            SchemaBuilder::new()
                .attribute(AttributeBuilder::string("id").computed())
                .attribute(AttributeBuilder::string("name").required())
                .attribute(AttributeBuilder::string("gadget_status").computed())
                .build_resource(0)
        }

        fn create_payload(plan: &State) -> GadgetPayload {
            GadgetPayload {
                name: plan.get_string("name"),
            }
        }

        fn update_payload(changes: &Changes<'_>) -> Option<GadgetUpdate> {
            Some(GadgetUpdate {
                name: changes.string("name"),
            })
        }
    }

    fn resource(url: &str) -> ManagedResource<Gadget> {
        let client = Client::new(
            url,
            Credentials {
                application_key: "ak".to_string(),
                application_secret: "as".to_string(),
                consumer_key: "ck".to_string(),
            },
        )
        .unwrap();
        ManagedResource::new(client)
    }

    fn state(pairs: &[(&str, Dynamic)]) -> State {
        let mut state = State::new();
        for (name, value) in pairs {
            state.set(name, value.clone());
        }
        state
    }

    #[tokio::test]
    async fn create_rejects_response_without_id() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/cloud/project/databricks/gadget")
            .with_body(r#"{"name":"g1"}"#)
            .create_async()
            .await;

        let response = resource(&server.url())
            .create(CreateRequest {
                config: Default::default(),
                planned_state: state(&[("name", Dynamic::from("g1"))]),
            })
            .await;

        assert!(response.diagnostics.has_errors());
        assert_eq!(
            response.diagnostics.errors[0].summary,
            "Unable to decode gadget response"
        );
    }

    #[tokio::test]
    async fn create_accepts_numeric_id() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/cloud/project/databricks/gadget")
            .with_body(r#"{"id":991,"gadgetStatus":"READY"}"#)
            .create_async()
            .await;

        let response = resource(&server.url())
            .create(CreateRequest {
                config: Default::default(),
                planned_state: state(&[
                    ("name", Dynamic::from("g1")),
                    ("gadget_status", Dynamic::Unknown),
                ]),
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        assert_eq!(response.state.get_string("id"), Some("991".to_string()));
        assert_eq!(
            response.state.get_string("gadget_status"),
            Some("READY".to_string())
        );
    }

    #[tokio::test]
    async fn create_keeps_id_when_record_does_not_decode() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/cloud/project/databricks/gadget")
            .with_body(r#"{"id":"g-7","gadgetStatus":1700000000}"#)
            .create_async()
            .await;

        let response = resource(&server.url())
            .create(CreateRequest {
                config: Default::default(),
                planned_state: state(&[
                    ("name", Dynamic::from("g1")),
                    ("gadget_status", Dynamic::Unknown),
                ]),
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        assert_eq!(
            response.diagnostics.warnings[0].summary,
            "Unable to decode gadget response"
        );
        assert_eq!(response.state.get_string("id"), Some("g-7".to_string()));
        assert_eq!(response.state.get_string("name"), Some("g1".to_string()));
    }

    #[tokio::test]
    async fn read_not_found_clears_state_with_warning() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/cloud/project/databricks/gadget/g-1")
            .with_status(404)
            .create_async()
            .await;

        let response = resource(&server.url())
            .read(ReadRequest {
                current_state: state(&[("id", Dynamic::from("g-1"))]),
            })
            .await;

        assert!(response.state.is_none());
        assert!(!response.diagnostics.has_errors());
        let warning = &response.diagnostics.warnings[0];
        assert_eq!(warning.summary, "Resource Not Found");
        assert!(warning
            .detail
            .as_deref()
            .unwrap()
            .starts_with("Unable to read gadget, got error: Resource not found"));
    }

    #[tokio::test]
    async fn read_keeps_state_on_type_mismatch() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/cloud/project/databricks/gadget/g-1")
            .with_body(r#"{"name":42}"#)
            .create_async()
            .await;

        let current = state(&[("id", Dynamic::from("g-1")), ("name", Dynamic::from("g1"))]);
        let response = resource(&server.url())
            .read(ReadRequest {
                current_state: current.clone(),
            })
            .await;

        assert_eq!(response.state, Some(current));
        assert_eq!(
            response.diagnostics.errors[0].summary,
            "Unable to decode gadget response"
        );
    }

    #[tokio::test]
    async fn read_clears_state_and_reports_server_errors() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/cloud/project/databricks/gadget/g-1")
            .with_status(500)
            .with_body(r#"{"message":"internal"}"#)
            .create_async()
            .await;

        let response = resource(&server.url())
            .read(ReadRequest {
                current_state: state(&[("id", Dynamic::from("g-1"))]),
            })
            .await;

        assert!(response.state.is_none());
        let detail = response.diagnostics.errors[0].detail.clone().unwrap();
        assert!(detail.starts_with("Unable to read gadget, got error:"));
        assert!(detail.contains("internal"));
    }

    #[tokio::test]
    async fn update_without_changes_sends_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let prior = state(&[("id", Dynamic::from("g-1")), ("name", Dynamic::from("g1"))]);
        let response = resource(&server.url())
            .update(UpdateRequest {
                config: Default::default(),
                planned_state: prior.clone(),
                current_state: prior.clone(),
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        assert_eq!(response.state, prior);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_failure_reports_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PUT", "/cloud/project/databricks/gadget/g-1")
            .with_status(400)
            .with_body(r#"{"message":"bad name"}"#)
            .create_async()
            .await;

        let prior = state(&[("id", Dynamic::from("g-1")), ("name", Dynamic::from("g1"))]);
        let planned = state(&[("id", Dynamic::from("g-1")), ("name", Dynamic::from("g2"))]);
        let response = resource(&server.url())
            .update(UpdateRequest {
                config: Default::default(),
                planned_state: planned,
                current_state: prior,
            })
            .await;

        let detail = response.diagnostics.errors[0].detail.clone().unwrap();
        assert!(detail.starts_with("Unable to update gadget, got error:"));
    }

    #[tokio::test]
    async fn delete_treats_not_found_as_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/cloud/project/databricks/gadget/g-1")
            .with_status(404)
            .create_async()
            .await;

        let response = resource(&server.url())
            .delete(DeleteRequest {
                current_state: state(&[("id", Dynamic::from("g-1"))]),
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_reports_other_failures() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/cloud/project/databricks/gadget/g-1")
            .with_status(409)
            .with_body(json!({"message": "in use"}).to_string())
            .create_async()
            .await;

        let response = resource(&server.url())
            .delete(DeleteRequest {
                current_state: state(&[("id", Dynamic::from("g-1"))]),
            })
            .await;

        let detail = response.diagnostics.errors[0].detail.clone().unwrap();
        assert!(detail.starts_with("Unable to delete gadget, got error:"));
        assert!(detail.contains("in use"));
    }

    #[tokio::test]
    async fn import_passes_id_through() {
        let response = resource("http://127.0.0.1:1")
            .import_state(tfplug::request::ImportStateRequest {
                id: "g-9".to_string(),
            })
            .await;

        let state = response.state.unwrap();
        assert_eq!(state.get_string("id"), Some("g-9".to_string()));
        assert_eq!(Gadget::schema().attributes.len(), 3);
    }
}
