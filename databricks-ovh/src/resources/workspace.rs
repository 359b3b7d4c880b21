use super::fields::{map_value, set_present, string_map, Changes, Patch};
use super::{ApplyToState, ResourceKind};
use crate::api::LenientId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use tfplug::schema::ResourceSchema;
use tfplug::validator::StringOneOfValidator;
use tfplug::{AttributeBuilder, AttributeType, SchemaBuilder, State};

pub const REGIONS: &[&str] = &[
    "eu-west-1",
    "eu-central-1",
    "us-east-1",
    "us-west-2",
    "ap-southeast-1",
];
pub const TIERS: &[&str] = &["STANDARD", "PREMIUM", "ENTERPRISE"];

/// `databricks-ovh_workspace`
pub struct Workspace;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    pub name: Option<String>,
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_configuration_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_managed_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ovh_optimization: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_tracking: Option<bool>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkspaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Patch<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Patch<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_tier: Patch<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Patch<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRecord {
    pub name: Option<String>,
    pub region: Option<String>,
    pub tier: Option<String>,
    pub deployment_name: Option<String>,
    pub aws_region: Option<String>,
    pub credentials_id: Option<String>,
    pub storage_configuration_id: Option<String>,
    pub network_id: Option<String>,
    pub customer_managed_key_id: Option<String>,
    pub pricing_tier: Option<String>,
    pub custom_tags: Option<HashMap<String, String>>,
    pub ovh_optimization: Option<bool>,
    pub cost_tracking: Option<bool>,
    pub workspace_id: Option<LenientId>,
    pub workspace_url: Option<String>,
    pub workspace_status: Option<String>,
    pub creation_time: Option<LenientId>,
}

impl ApplyToState for WorkspaceRecord {
    fn apply_to(self, state: &mut State) {
        set_present(state, "name", self.name);
        set_present(state, "region", self.region);
        set_present(state, "tier", self.tier);
        set_present(state, "deployment_name", self.deployment_name);
        set_present(state, "aws_region", self.aws_region);
        set_present(state, "credentials_id", self.credentials_id);
        set_present(state, "storage_configuration_id", self.storage_configuration_id);
        set_present(state, "network_id", self.network_id);
        set_present(state, "customer_managed_key_id", self.customer_managed_key_id);
        set_present(state, "pricing_tier", self.pricing_tier);
        set_present(state, "custom_tags", self.custom_tags.map(map_value));
        set_present(state, "ovh_optimization", self.ovh_optimization);
        set_present(state, "cost_tracking", self.cost_tracking);
        set_present(
            state,
            "workspace_id",
            self.workspace_id.map(LenientId::into_inner),
        );
        set_present(state, "workspace_url", self.workspace_url);
        set_present(state, "workspace_status", self.workspace_status);
        set_present(
            state,
            "creation_time",
            self.creation_time.map(LenientId::into_inner),
        );
    }
}

fn fixed_after_create(builder: AttributeBuilder) -> AttributeBuilder {
    builder
        .optional()
        .plan_modifier(Box::new(RequiresReplaceIfChanged))
}

impl ResourceKind for Workspace {
    const TYPE_NAME: &'static str = "databricks-ovh_workspace";
    const COLLECTION: &'static str = "/cloud/project/databricks/workspace";
    const LABEL: &'static str = "workspace";

    type CreatePayload = CreateWorkspaceRequest;
    type UpdatePayload = UpdateWorkspaceRequest;
    type Record = WorkspaceRecord;

    fn schema() -> ResourceSchema {
        SchemaBuilder::new()
            .description("Manages a Databricks workspace on OVH infrastructure")
            .attribute(
                AttributeBuilder::string("id")
                    .computed()
                    .description("Workspace identifier")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("name")
                    .required()
                    .description("Workspace name"),
            )
            .attribute(
                AttributeBuilder::string("region")
                    .required()
                    .description("OVH region")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged))
                    .validator(StringOneOfValidator::create(REGIONS)),
            )
            .attribute(
                AttributeBuilder::string("tier")
                    .optional()
                    .computed()
                    .description("Databricks tier")
                    .default(StaticDefault::string("STANDARD"))
                    .validator(StringOneOfValidator::create(TIERS)),
            )
            .attribute(
                AttributeBuilder::string("deployment_name")
                    .optional()
                    .computed()
                    .description("Deployment name")
                    .plan_modifier(Box::new(UseStateForUnknown))
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::string("aws_region")
                    .optional()
                    .computed()
                    .description("AWS region for workspace")
                    .plan_modifier(Box::new(UseStateForUnknown))
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                fixed_after_create(AttributeBuilder::string("credentials_id"))
                    .description("Credentials ID"),
            )
            .attribute(
                fixed_after_create(AttributeBuilder::string("storage_configuration_id"))
                    .description("Storage configuration ID"),
            )
            .attribute(
                fixed_after_create(AttributeBuilder::string("network_id"))
                    .description("Network configuration ID"),
            )
            .attribute(
                fixed_after_create(AttributeBuilder::string("customer_managed_key_id"))
                    .description("Customer managed key ID"),
            )
            .attribute(
                AttributeBuilder::string("pricing_tier")
                    .optional()
                    .computed()
                    .description("Pricing tier")
                    .default(StaticDefault::string("STANDARD")),
            )
            .attribute(
                AttributeBuilder::map("custom_tags", AttributeType::String)
                    .optional()
                    .description("Custom tags"),
            )
            .attribute(
                AttributeBuilder::bool("ovh_optimization")
                    .optional()
                    .computed()
                    .description("Enable OVH infrastructure optimization")
                    .default(StaticDefault::bool(true))
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::bool("cost_tracking")
                    .optional()
                    .computed()
                    .description("Enable cost tracking")
                    .default(StaticDefault::bool(true))
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::string("workspace_id")
                    .computed()
                    .description("Workspace ID")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("workspace_url")
                    .computed()
                    .description("Workspace URL")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("workspace_status")
                    .computed()
                    .description("Workspace status"),
            )
            .attribute(
                AttributeBuilder::string("creation_time")
                    .computed()
                    .description("Creation timestamp")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .build_resource(0)
    }

    fn create_payload(plan: &State) -> CreateWorkspaceRequest {
        CreateWorkspaceRequest {
            name: plan.get_string("name"),
            region: plan.get_string("region"),
            tier: plan.get_string("tier"),
            deployment_name: plan.get_string("deployment_name"),
            aws_region: plan.get_string("aws_region"),
            credentials_id: plan.get_string("credentials_id"),
            storage_configuration_id: plan.get_string("storage_configuration_id"),
            network_id: plan.get_string("network_id"),
            customer_managed_key_id: plan.get_string("customer_managed_key_id"),
            pricing_tier: plan.get_string("pricing_tier"),
            custom_tags: string_map(plan.get("custom_tags")),
            ovh_optimization: plan.get_bool("ovh_optimization"),
            cost_tracking: plan.get_bool("cost_tracking"),
        }
    }

    fn update_payload(changes: &Changes<'_>) -> Option<UpdateWorkspaceRequest> {
        Some(UpdateWorkspaceRequest {
            name: changes.string("name"),
            tier: changes.string("tier"),
            pricing_tier: changes.string("pricing_tier"),
            custom_tags: changes.string_map("custom_tags"),
        })
    }
}

#[cfg(test)]
#[path = "./workspace_test.rs"]
mod workspace_test;
