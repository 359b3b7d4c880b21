use super::fields::{
    integer, list_value, map_value, set_present, string_list, string_map, Changes, Patch,
};
use super::{ApplyToState, ResourceKind};
use crate::api::LenientId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use tfplug::schema::ResourceSchema;
use tfplug::validator::{NumberRangeValidator, WholeNumberValidator};
use tfplug::{AttributeBuilder, AttributeType, SchemaBuilder, State};

/// `databricks-ovh_instance_pool`
pub struct InstancePool;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstancePoolRequest {
    pub workspace_id: Option<String>,
    pub name: Option<String>,
    pub node_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_idle_instances: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_instance_autotermination_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_elastic_disk: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preloaded_spark_versions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInstancePoolRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Patch<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_idle_instances: Patch<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_capacity: Patch<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_instance_autotermination_minutes: Patch<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_tags: Patch<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePoolRecord {
    pub workspace_id: Option<LenientId>,
    pub name: Option<String>,
    pub node_type_id: Option<String>,
    pub min_idle_instances: Option<i64>,
    pub max_capacity: Option<i64>,
    pub idle_instance_autotermination_minutes: Option<i64>,
    pub enable_elastic_disk: Option<bool>,
    pub preloaded_spark_versions: Option<Vec<String>>,
    pub custom_tags: Option<HashMap<String, String>>,
    pub pool_id: Option<LenientId>,
    pub status: Option<String>,
    pub created_time: Option<LenientId>,
}

impl ApplyToState for InstancePoolRecord {
    fn apply_to(self, state: &mut State) {
        set_present(
            state,
            "workspace_id",
            self.workspace_id.map(LenientId::into_inner),
        );
        set_present(state, "name", self.name);
        set_present(state, "node_type_id", self.node_type_id);
        set_present(state, "min_idle_instances", self.min_idle_instances);
        set_present(state, "max_capacity", self.max_capacity);
        set_present(
            state,
            "idle_instance_autotermination_minutes",
            self.idle_instance_autotermination_minutes,
        );
        set_present(state, "enable_elastic_disk", self.enable_elastic_disk);
        set_present(
            state,
            "preloaded_spark_versions",
            self.preloaded_spark_versions.map(list_value),
        );
        set_present(state, "custom_tags", self.custom_tags.map(map_value));
        set_present(state, "pool_id", self.pool_id.map(LenientId::into_inner));
        set_present(state, "status", self.status);
        set_present(
            state,
            "created_time",
            self.created_time.map(LenientId::into_inner),
        );
    }
}

impl ResourceKind for InstancePool {
    const TYPE_NAME: &'static str = "databricks-ovh_instance_pool";
    const COLLECTION: &'static str = "/cloud/project/databricks/instance-pool";
    const LABEL: &'static str = "instance pool";

    type CreatePayload = CreateInstancePoolRequest;
    type UpdatePayload = UpdateInstancePoolRequest;
    type Record = InstancePoolRecord;

    fn schema() -> ResourceSchema {
        SchemaBuilder::new()
            .description("Manages a Databricks instance pool on OVH infrastructure")
            .attribute(
                AttributeBuilder::string("id")
                    .computed()
                    .description("Instance pool identifier")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("workspace_id")
                    .required()
                    .description("Workspace ID where the pool will be created")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::string("name")
                    .required()
                    .description("Instance pool name"),
            )
            .attribute(
                AttributeBuilder::string("node_type_id")
                    .required()
                    .description("OVH node type for pool instances")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::number("min_idle_instances")
                    .optional()
                    .computed()
                    .description("Minimum number of idle instances")
                    .default(StaticDefault::number(0.0))
                    .validator(NumberRangeValidator::at_least(0.0))
                    .validator(WholeNumberValidator::create()),
            )
            .attribute(
                AttributeBuilder::number("max_capacity")
                    .optional()
                    .description("Maximum number of instances")
                    .validator(NumberRangeValidator::at_least(1.0))
                    .validator(WholeNumberValidator::create()),
            )
            .attribute(
                AttributeBuilder::number("idle_instance_autotermination_minutes")
                    .optional()
                    .computed()
                    .description("Minutes before idle instances are terminated")
                    .default(StaticDefault::number(60.0))
                    .validator(NumberRangeValidator::at_least(10.0))
                    .validator(WholeNumberValidator::create()),
            )
            .attribute(
                AttributeBuilder::bool("enable_elastic_disk")
                    .optional()
                    .description("Enable autoscaling local storage")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::list("preloaded_spark_versions", AttributeType::String)
                    .optional()
                    .description("Spark versions preloaded on pool instances")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::map("custom_tags", AttributeType::String)
                    .optional()
                    .description("Custom tags"),
            )
            .attribute(
                AttributeBuilder::string("pool_id")
                    .computed()
                    .description("Instance pool ID")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("status")
                    .computed()
                    .description("Instance pool status"),
            )
            .attribute(
                AttributeBuilder::string("created_time")
                    .computed()
                    .description("Creation timestamp")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .build_resource(0)
    }

    fn create_payload(plan: &State) -> CreateInstancePoolRequest {
        CreateInstancePoolRequest {
            workspace_id: plan.get_string("workspace_id"),
            name: plan.get_string("name"),
            node_type_id: plan.get_string("node_type_id"),
            min_idle_instances: integer(plan.get("min_idle_instances")),
            max_capacity: integer(plan.get("max_capacity")),
            idle_instance_autotermination_minutes: integer(
                plan.get("idle_instance_autotermination_minutes"),
            ),
            enable_elastic_disk: plan.get_bool("enable_elastic_disk"),
            preloaded_spark_versions: string_list(plan.get("preloaded_spark_versions")),
            custom_tags: string_map(plan.get("custom_tags")),
        }
    }

    fn update_payload(changes: &Changes<'_>) -> Option<UpdateInstancePoolRequest> {
        Some(UpdateInstancePoolRequest {
            name: changes.string("name"),
            min_idle_instances: changes.integer("min_idle_instances"),
            max_capacity: changes.integer("max_capacity"),
            idle_instance_autotermination_minutes: changes
                .integer("idle_instance_autotermination_minutes"),
            custom_tags: changes.string_map("custom_tags"),
        })
    }
}
