use super::fields::{integer, set_present, Changes, Patch};
use super::{ApplyToState, ResourceKind};
use crate::api::LenientId;
use serde::{Deserialize, Serialize};
use tfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use tfplug::schema::ResourceSchema;
use tfplug::validator::{JsonObjectValidator, NumberRangeValidator, WholeNumberValidator};
use tfplug::{AttributeBuilder, SchemaBuilder, State};

/// `databricks-ovh_cluster_policy`
pub struct ClusterPolicy;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterPolicyRequest {
    pub workspace_id: Option<String>,
    pub name: Option<String>,
    /// Policy document, passed through as the JSON text the user wrote
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_clusters_per_user: Option<i64>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClusterPolicyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Patch<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Patch<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Patch<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_clusters_per_user: Patch<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPolicyRecord {
    pub workspace_id: Option<LenientId>,
    pub name: Option<String>,
    pub definition: Option<String>,
    pub description: Option<String>,
    pub max_clusters_per_user: Option<i64>,
    pub policy_id: Option<LenientId>,
    pub created_time: Option<LenientId>,
}

impl ApplyToState for ClusterPolicyRecord {
    fn apply_to(self, state: &mut State) {
        set_present(
            state,
            "workspace_id",
            self.workspace_id.map(LenientId::into_inner),
        );
        set_present(state, "name", self.name);
        set_present(state, "definition", self.definition);
        set_present(state, "description", self.description);
        set_present(state, "max_clusters_per_user", self.max_clusters_per_user);
        set_present(state, "policy_id", self.policy_id.map(LenientId::into_inner));
        set_present(
            state,
            "created_time",
            self.created_time.map(LenientId::into_inner),
        );
    }
}

impl ResourceKind for ClusterPolicy {
    const TYPE_NAME: &'static str = "databricks-ovh_cluster_policy";
    const COLLECTION: &'static str = "/cloud/project/databricks/cluster-policy";
    const LABEL: &'static str = "cluster policy";

    type CreatePayload = CreateClusterPolicyRequest;
    type UpdatePayload = UpdateClusterPolicyRequest;
    type Record = ClusterPolicyRecord;

    fn schema() -> ResourceSchema {
        SchemaBuilder::new()
            .description("Manages a Databricks cluster policy on OVH infrastructure")
            .attribute(
                AttributeBuilder::string("id")
                    .computed()
                    .description("Cluster policy identifier")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("workspace_id")
                    .required()
                    .description("Workspace ID where the policy will be created")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::string("name")
                    .required()
                    .description("Cluster policy name"),
            )
            .attribute(
                AttributeBuilder::string("definition")
                    .required()
                    .description("Policy definition as a JSON document")
                    .validator(Box::new(JsonObjectValidator)),
            )
            .attribute(
                AttributeBuilder::string("description")
                    .optional()
                    .description("Cluster policy description"),
            )
            .attribute(
                AttributeBuilder::number("max_clusters_per_user")
                    .optional()
                    .description("Maximum clusters a single user may create with this policy")
                    .validator(NumberRangeValidator::at_least(1.0))
                    .validator(WholeNumberValidator::create()),
            )
            .attribute(
                AttributeBuilder::string("policy_id")
                    .computed()
                    .description("Cluster policy ID")
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

    fn create_payload(plan: &State) -> CreateClusterPolicyRequest {
        CreateClusterPolicyRequest {
            workspace_id: plan.get_string("workspace_id"),
            name: plan.get_string("name"),
            definition: plan.get_string("definition"),
            description: plan.get_string("description"),
            max_clusters_per_user: integer(plan.get("max_clusters_per_user")),
        }
    }

    fn update_payload(changes: &Changes<'_>) -> Option<UpdateClusterPolicyRequest> {
        Some(UpdateClusterPolicyRequest {
            name: changes.string("name"),
            definition: changes.string("definition"),
            description: changes.string("description"),
            max_clusters_per_user: changes.integer("max_clusters_per_user"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::{Client, Credentials};
    use crate::resources::ManagedResource;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tfplug::request::UpdateRequest;
    use tfplug::{Config, Diagnostics, Dynamic, Resource};

    fn validate_definition(definition: &str) -> Diagnostics {
        let schema = ClusterPolicy::schema();
        let mut diags = Diagnostics::new();
        for validator in &schema.attributes["definition"].validators {
            validator.validate(&Dynamic::from(definition), "definition", &mut diags);
        }
        diags
    }

    #[test]
    fn definition_must_be_a_json_object() {
        assert!(!validate_definition(r#"{"spark_version":{"type":"fixed","value":"13.3"}}"#)
            .has_errors());

        let diags = validate_definition("[1, 2]");
        assert_eq!(diags.errors[0].summary, "definition must be a JSON object");

        let diags = validate_definition("{not json");
        assert_eq!(diags.errors[0].summary, "definition must be valid JSON");
    }

    #[tokio::test]
    async fn test_update_changes_definition_and_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/cloud/project/databricks/cluster-policy/cp-1")
            .match_body(Matcher::Json(json!({
                "definition": "{\"autotermination_minutes\":{\"type\":\"fixed\",\"value\":30}}",
                "maxClustersPerUser": 3,
            })))
            .with_body("")
            .create_async()
            .await;

        let mut prior = State::new();
        prior.set("id", "cp-1");
        prior.set("workspace_id", "ws-1");
        prior.set("name", "small");
        prior.set("definition", "{}");
        prior.set("policy_id", "P-1");

        let mut planned = prior.clone();
        planned.set(
            "definition",
            r#"{"autotermination_minutes":{"type":"fixed","value":30}}"#,
        );
        planned.set("max_clusters_per_user", 3i64);

        let client = Client::new(
            &server.url(),
            Credentials {
                application_key: "ak".to_string(),
                application_secret: "as".to_string(),
                consumer_key: "ck".to_string(),
            },
        )
        .unwrap();
        let response = ManagedResource::<ClusterPolicy>::new(client)
            .update(UpdateRequest {
                config: Config::new(),
                planned_state: planned,
                current_state: prior,
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        assert_eq!(response.state.get_string("policy_id"), Some("P-1".to_string()));
        assert_eq!(response.state.get_number("max_clusters_per_user"), Some(3.0));
        mock.assert_async().await;
    }
}
