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
use tfplug::{AttributeBuilder, AttributeType, Dynamic, SchemaBuilder, State};

/// `databricks-ovh_job`
pub struct Job;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCluster {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spark_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_parameters: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quartz_cron_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotifications {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_start: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_success: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<Vec<String>>,
}

fn object_fields(fields: &[(&str, AttributeType)]) -> HashMap<String, AttributeType> {
    fields
        .iter()
        .map(|(name, ty)| (name.to_string(), ty.clone()))
        .collect()
}

fn object(fields: Vec<(&str, Dynamic)>) -> Dynamic {
    Dynamic::Map(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

static NULL: Dynamic = Dynamic::Null;

fn field<'a>(map: &'a HashMap<String, Dynamic>, name: &str) -> &'a Dynamic {
    map.get(name).unwrap_or(&NULL)
}

impl NewCluster {
    fn attribute_type() -> AttributeType {
        AttributeType::Object(object_fields(&[
            ("spark_version", AttributeType::String),
            ("node_type_id", AttributeType::String),
            ("num_workers", AttributeType::Number),
        ]))
    }

    fn from_dynamic(value: &Dynamic) -> Option<Self> {
        let map = value.as_map()?;
        Some(Self {
            spark_version: field(map, "spark_version").as_string().cloned(),
            node_type_id: field(map, "node_type_id").as_string().cloned(),
            num_workers: integer(field(map, "num_workers")),
        })
    }

    fn into_dynamic(self) -> Dynamic {
        object(vec![
            ("spark_version", self.spark_version.into()),
            ("node_type_id", self.node_type_id.into()),
            ("num_workers", self.num_workers.into()),
        ])
    }
}

impl NotebookTask {
    fn attribute_type() -> AttributeType {
        AttributeType::Object(object_fields(&[
            ("notebook_path", AttributeType::String),
            (
                "base_parameters",
                AttributeType::Map(Box::new(AttributeType::String)),
            ),
        ]))
    }

    fn from_dynamic(value: &Dynamic) -> Option<Self> {
        let map = value.as_map()?;
        Some(Self {
            notebook_path: field(map, "notebook_path").as_string().cloned(),
            base_parameters: string_map(field(map, "base_parameters")),
        })
    }

    fn into_dynamic(self) -> Dynamic {
        object(vec![
            ("notebook_path", self.notebook_path.into()),
            (
                "base_parameters",
                self.base_parameters.map(map_value).unwrap_or_default(),
            ),
        ])
    }
}

impl Schedule {
    fn attribute_type() -> AttributeType {
        AttributeType::Object(object_fields(&[
            ("quartz_cron_expression", AttributeType::String),
            ("timezone_id", AttributeType::String),
            ("pause_status", AttributeType::String),
        ]))
    }

    fn from_dynamic(value: &Dynamic) -> Option<Self> {
        let map = value.as_map()?;
        Some(Self {
            quartz_cron_expression: field(map, "quartz_cron_expression").as_string().cloned(),
            timezone_id: field(map, "timezone_id").as_string().cloned(),
            pause_status: field(map, "pause_status").as_string().cloned(),
        })
    }

    fn into_dynamic(self) -> Dynamic {
        object(vec![
            ("quartz_cron_expression", self.quartz_cron_expression.into()),
            ("timezone_id", self.timezone_id.into()),
            ("pause_status", self.pause_status.into()),
        ])
    }
}

impl EmailNotifications {
    fn attribute_type() -> AttributeType {
        let list = || AttributeType::List(Box::new(AttributeType::String));
        AttributeType::Object(object_fields(&[
            ("on_start", list()),
            ("on_success", list()),
            ("on_failure", list()),
        ]))
    }

    fn from_dynamic(value: &Dynamic) -> Option<Self> {
        let map = value.as_map()?;
        Some(Self {
            on_start: string_list(field(map, "on_start")),
            on_success: string_list(field(map, "on_success")),
            on_failure: string_list(field(map, "on_failure")),
        })
    }

    fn into_dynamic(self) -> Dynamic {
        let list = |l: Option<Vec<String>>| l.map(list_value).unwrap_or_default();
        object(vec![
            ("on_start", list(self.on_start)),
            ("on_success", list(self.on_success)),
            ("on_failure", list(self.on_failure)),
        ])
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub workspace_id: Option<String>,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_cluster_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_cluster: Option<NewCluster>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook_task: Option<NotebookTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<EmailNotifications>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_runs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Patch<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_cluster_id: Patch<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_cluster: Patch<NewCluster>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook_task: Patch<NotebookTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Patch<Schedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_notifications: Patch<EmailNotifications>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Patch<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Patch<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_runs: Patch<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Patch<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub workspace_id: Option<LenientId>,
    pub name: Option<String>,
    pub existing_cluster_id: Option<String>,
    pub new_cluster: Option<NewCluster>,
    pub notebook_task: Option<NotebookTask>,
    pub schedule: Option<Schedule>,
    pub email_notifications: Option<EmailNotifications>,
    pub timeout_seconds: Option<i64>,
    pub max_retries: Option<i64>,
    pub max_concurrent_runs: Option<i64>,
    pub tags: Option<HashMap<String, String>>,
    pub job_id: Option<LenientId>,
    pub status: Option<String>,
    pub created_time: Option<LenientId>,
}

impl ApplyToState for JobRecord {
    fn apply_to(self, state: &mut State) {
        set_present(
            state,
            "workspace_id",
            self.workspace_id.map(LenientId::into_inner),
        );
        set_present(state, "name", self.name);
        set_present(state, "existing_cluster_id", self.existing_cluster_id);
        set_present(state, "new_cluster", self.new_cluster.map(NewCluster::into_dynamic));
        set_present(
            state,
            "notebook_task",
            self.notebook_task.map(NotebookTask::into_dynamic),
        );
        set_present(state, "schedule", self.schedule.map(Schedule::into_dynamic));
        set_present(
            state,
            "email_notifications",
            self.email_notifications.map(EmailNotifications::into_dynamic),
        );
        set_present(state, "timeout_seconds", self.timeout_seconds);
        set_present(state, "max_retries", self.max_retries);
        set_present(state, "max_concurrent_runs", self.max_concurrent_runs);
        set_present(state, "tags", self.tags.map(map_value));
        set_present(state, "job_id", self.job_id.map(LenientId::into_inner));
        set_present(state, "status", self.status);
        set_present(
            state,
            "created_time",
            self.created_time.map(LenientId::into_inner),
        );
    }
}

impl ResourceKind for Job {
    const TYPE_NAME: &'static str = "databricks-ovh_job";
    const COLLECTION: &'static str = "/cloud/project/databricks/job";
    const LABEL: &'static str = "job";

    type CreatePayload = CreateJobRequest;
    type UpdatePayload = UpdateJobRequest;
    type Record = JobRecord;

    fn schema() -> ResourceSchema {
        SchemaBuilder::new()
            .description("Manages a Databricks job on OVH infrastructure")
            .attribute(
                AttributeBuilder::string("id")
                    .computed()
                    .description("Job identifier")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("workspace_id")
                    .required()
                    .description("Workspace ID where the job will be created")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::string("name")
                    .required()
                    .description("Job name"),
            )
            .attribute(
                AttributeBuilder::string("existing_cluster_id")
                    .optional()
                    .description("ID of an existing cluster to run the job on"),
            )
            .attribute(
                AttributeBuilder::new("new_cluster", NewCluster::attribute_type())
                    .optional()
                    .description("Cluster created for each run"),
            )
            .attribute(
                AttributeBuilder::new("notebook_task", NotebookTask::attribute_type())
                    .optional()
                    .description("Notebook task configuration"),
            )
            .attribute(
                AttributeBuilder::new("schedule", Schedule::attribute_type())
                    .optional()
                    .description("Job schedule"),
            )
            .attribute(
                AttributeBuilder::new("email_notifications", EmailNotifications::attribute_type())
                    .optional()
                    .description("Email notification settings"),
            )
            .attribute(
                AttributeBuilder::number("timeout_seconds")
                    .optional()
                    .description("Timeout in seconds")
                    .validator(WholeNumberValidator::create()),
            )
            .attribute(
                AttributeBuilder::number("max_retries")
                    .optional()
                    .description("Maximum number of retries")
                    .validator(WholeNumberValidator::create()),
            )
            .attribute(
                AttributeBuilder::number("max_concurrent_runs")
                    .optional()
                    .computed()
                    .description("Maximum concurrent runs")
                    .default(StaticDefault::number(1.0))
                    .validator(NumberRangeValidator::at_least(1.0))
                    .validator(WholeNumberValidator::create()),
            )
            .attribute(
                AttributeBuilder::map("tags", AttributeType::String)
                    .optional()
                    .description("Job tags"),
            )
            .attribute(
                AttributeBuilder::string("job_id")
                    .computed()
                    .description("Job ID")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("status")
                    .computed()
                    .description("Job status"),
            )
            .attribute(
                AttributeBuilder::string("created_time")
                    .computed()
                    .description("Creation timestamp")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .build_resource(0)
    }

    fn create_payload(plan: &State) -> CreateJobRequest {
        CreateJobRequest {
            workspace_id: plan.get_string("workspace_id"),
            name: plan.get_string("name"),
            existing_cluster_id: plan.get_string("existing_cluster_id"),
            new_cluster: NewCluster::from_dynamic(plan.get("new_cluster")),
            notebook_task: NotebookTask::from_dynamic(plan.get("notebook_task")),
            schedule: Schedule::from_dynamic(plan.get("schedule")),
            email_notifications: EmailNotifications::from_dynamic(
                plan.get("email_notifications"),
            ),
            timeout_seconds: integer(plan.get("timeout_seconds")),
            max_retries: integer(plan.get("max_retries")),
            max_concurrent_runs: integer(plan.get("max_concurrent_runs")),
            tags: string_map(plan.get("tags")),
        }
    }

    fn update_payload(changes: &Changes<'_>) -> Option<UpdateJobRequest> {
        Some(UpdateJobRequest {
            name: changes.string("name"),
            existing_cluster_id: changes.string("existing_cluster_id"),
            new_cluster: changes.value("new_cluster", NewCluster::from_dynamic),
            notebook_task: changes.value("notebook_task", NotebookTask::from_dynamic),
            schedule: changes.value("schedule", Schedule::from_dynamic),
            email_notifications: changes
                .value("email_notifications", EmailNotifications::from_dynamic),
            timeout_seconds: changes.integer("timeout_seconds"),
            max_retries: changes.integer("max_retries"),
            max_concurrent_runs: changes.integer("max_concurrent_runs"),
            tags: changes.string_map("tags"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serde_json::json;
    use tfplug::Diagnostics;

    fn planned_job() -> State {
        let mut plan = State::new();
        plan.set("workspace_id", "ws-1");
        plan.set("name", "nightly-etl");
        plan.set("max_concurrent_runs", 1i64);
        plan.set(
            "new_cluster",
            object(vec![
                ("spark_version", Dynamic::from("13.3.x-scala2.12")),
                ("node_type_id", Dynamic::from("b3-8")),
                ("num_workers", Dynamic::Number(2.0)),
            ]),
        );
        plan.set(
            "notebook_task",
            object(vec![
                ("notebook_path", Dynamic::from("/Shared/etl")),
                ("base_parameters", Dynamic::Null),
            ]),
        );
        plan.set("id", Dynamic::Unknown);
        plan.set("job_id", Dynamic::Unknown);
        plan
    }

    #[test]
    fn fractional_counts_are_rejected() {
        let schema = Job::schema();

        for name in ["timeout_seconds", "max_retries", "max_concurrent_runs"] {
            let mut diags = Diagnostics::new();
            for validator in &schema.attributes[name].validators {
                validator.validate(&Dynamic::Number(1.5), name, &mut diags);
            }
            assert_eq!(diags.errors.len(), 1, "{}", name);
            assert_eq!(
                diags.errors[0].summary,
                format!("{} must be a whole number", name)
            );
        }
    }

    #[test]
    fn create_payload_nests_camel_case_objects() {
        let payload = serde_json::to_value(Job::create_payload(&planned_job())).unwrap();

        assert_eq!(
            payload,
            json!({
                "workspaceId": "ws-1",
                "name": "nightly-etl",
                "newCluster": {
                    "sparkVersion": "13.3.x-scala2.12",
                    "nodeTypeId": "b3-8",
                    "numWorkers": 2,
                },
                "notebookTask": {"notebookPath": "/Shared/etl"},
                "maxConcurrentRuns": 1,
            })
        );
    }

    #[test]
    fn record_round_trips_through_state() {
        let record: JobRecord = serde_json::from_value(json!({
            "jobId": 8812,
            "name": "nightly-etl",
            "newCluster": {"sparkVersion": "13.3.x-scala2.12", "numWorkers": 4},
            "schedule": {"quartzCronExpression": "0 0 2 * * ?", "timezoneId": "UTC"},
            "emailNotifications": {"onFailure": ["ops@example.com"]},
            "createdTime": 1700000000000i64,
        }))
        .unwrap();

        let mut state = planned_job();
        record.apply_to(&mut state);

        assert_eq!(state.get_string("job_id"), Some("8812".to_string()));
        assert_eq!(
            state.get_string("created_time"),
            Some("1700000000000".to_string())
        );

        let cluster = NewCluster::from_dynamic(state.get("new_cluster")).unwrap();
        assert_eq!(cluster.num_workers, Some(4));
        assert_eq!(cluster.node_type_id, None);

        let schedule = state.get("schedule").as_map().unwrap();
        assert_eq!(schedule["pause_status"], Dynamic::Null);
        assert_eq!(schedule["timezone_id"], Dynamic::from("UTC"));

        let notifications =
            EmailNotifications::from_dynamic(state.get("email_notifications")).unwrap();
        assert_eq!(
            notifications.on_failure,
            Some(vec!["ops@example.com".to_string()])
        );
        assert!(Job::schema()
            .attributes["email_notifications"]
            .r#type
            .accepts(state.get("email_notifications")));
    }

    #[test]
    fn removed_schedule_is_sent_as_null() {
        let mut prior = planned_job();
        prior.set(
            "schedule",
            Schedule {
                quartz_cron_expression: Some("0 0 2 * * ?".to_string()),
                timezone_id: Some("UTC".to_string()),
                pause_status: None,
            }
            .into_dynamic(),
        );
        let mut plan = prior.clone();
        plan.set("schedule", Dynamic::Null);

        let payload = Job::update_payload(&Changes::new(&plan, &prior)).unwrap();

        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({"schedule": null})
        );
    }

    #[test]
    fn update_payload_contains_changed_objects_only() {
        let prior = planned_job();
        let mut plan = prior.clone();
        plan.set(
            "new_cluster",
            object(vec![
                ("spark_version", Dynamic::from("13.3.x-scala2.12")),
                ("node_type_id", Dynamic::from("b3-8")),
                ("num_workers", Dynamic::Number(8.0)),
            ]),
        );
        plan.set("timeout_seconds", 3600i64);

        let payload = Job::update_payload(&Changes::new(&plan, &prior)).unwrap();

        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({
                "newCluster": {
                    "sparkVersion": "13.3.x-scala2.12",
                    "nodeTypeId": "b3-8",
                    "numWorkers": 8,
                },
                "timeoutSeconds": 3600,
            })
        );
    }
}
