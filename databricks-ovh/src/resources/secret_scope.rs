use super::fields::{set_present, Changes};
use super::{ApplyToState, ResourceKind};
use crate::api::LenientId;
use serde::{Deserialize, Serialize};
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use tfplug::schema::ResourceSchema;
use tfplug::validator::StringOneOfValidator;
use tfplug::{AttributeBuilder, SchemaBuilder, State};

pub const PRINCIPALS: &[&str] = &["users", "admins"];

/// `databricks-ovh_secret_scope`. Every attribute is fixed once created.
pub struct SecretScope;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSecretScopeRequest {
    pub workspace_id: Option<String>,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_manage_principal: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretScopeRecord {
    pub workspace_id: Option<LenientId>,
    pub name: Option<String>,
    pub initial_manage_principal: Option<String>,
    pub backend_type: Option<String>,
    pub scope_id: Option<LenientId>,
    pub created_time: Option<LenientId>,
}

impl ApplyToState for SecretScopeRecord {
    fn apply_to(self, state: &mut State) {
        set_present(
            state,
            "workspace_id",
            self.workspace_id.map(LenientId::into_inner),
        );
        set_present(state, "name", self.name);
        set_present(
            state,
            "initial_manage_principal",
            self.initial_manage_principal,
        );
        set_present(state, "backend_type", self.backend_type);
        set_present(state, "scope_id", self.scope_id.map(LenientId::into_inner));
        set_present(
            state,
            "created_time",
            self.created_time.map(LenientId::into_inner),
        );
    }
}

impl ResourceKind for SecretScope {
    const TYPE_NAME: &'static str = "databricks-ovh_secret_scope";
    const COLLECTION: &'static str = "/cloud/project/databricks/secret-scope";
    const LABEL: &'static str = "secret scope";

    type CreatePayload = CreateSecretScopeRequest;
    type UpdatePayload = ();
    type Record = SecretScopeRecord;

    fn schema() -> ResourceSchema {
        SchemaBuilder::new()
            .description("Manages a Databricks secret scope on OVH infrastructure")
            .attribute(
                AttributeBuilder::string("id")
                    .computed()
                    .description("Secret scope identifier")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("workspace_id")
                    .required()
                    .description("Workspace ID where the secret scope will be created")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::string("name")
                    .required()
                    .description("Secret scope name")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::string("initial_manage_principal")
                    .optional()
                    .computed()
                    .description("Principal initially granted MANAGE on the scope")
                    .default(StaticDefault::string("users"))
                    .plan_modifier(Box::new(RequiresReplaceIfChanged))
                    .validator(StringOneOfValidator::create(PRINCIPALS)),
            )
            .attribute(
                AttributeBuilder::string("backend_type")
                    .computed()
                    .description("Secret scope backend type")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("scope_id")
                    .computed()
                    .description("Secret scope ID")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("created_time")
                    .computed()
                    .description("Creation timestamp")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .build_resource(0)
    }

    fn create_payload(plan: &State) -> CreateSecretScopeRequest {
        CreateSecretScopeRequest {
            workspace_id: plan.get_string("workspace_id"),
            name: plan.get_string("name"),
            initial_manage_principal: plan.get_string("initial_manage_principal"),
        }
    }

    fn update_payload(_changes: &Changes<'_>) -> Option<()> {
        None
    }
}
