use super::fields::{set_present, Changes, Patch};
use super::{ApplyToState, DeleteCall, ResourceKind};
use crate::api::{LenientId, DATABRICKS_BASE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use tfplug::schema::ResourceSchema;
use tfplug::validator::StringOneOfValidator;
use tfplug::{AttributeBuilder, SchemaBuilder, State};

pub const LANGUAGES: &[&str] = &["SCALA", "PYTHON", "SQL", "R"];
pub const FORMATS: &[&str] = &["SOURCE", "HTML", "JUPYTER", "DBC"];

/// `databricks-ovh_notebook`
pub struct Notebook;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotebookRequest {
    pub workspace_id: Option<String>,
    pub path: Option<String>,
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotebookRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Patch<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Patch<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookRecord {
    pub workspace_id: Option<LenientId>,
    pub path: Option<String>,
    pub language: Option<String>,
    pub content: Option<String>,
    pub format: Option<String>,
    pub notebook_id: Option<LenientId>,
    pub created_time: Option<LenientId>,
}

impl ApplyToState for NotebookRecord {
    fn apply_to(self, state: &mut State) {
        set_present(
            state,
            "workspace_id",
            self.workspace_id.map(LenientId::into_inner),
        );
        set_present(state, "path", self.path);
        set_present(state, "language", self.language);
        set_present(state, "content", self.content);
        set_present(state, "format", self.format);
        set_present(
            state,
            "notebook_id",
            self.notebook_id.map(LenientId::into_inner),
        );
        set_present(
            state,
            "created_time",
            self.created_time.map(LenientId::into_inner),
        );
    }
}

impl ResourceKind for Notebook {
    const TYPE_NAME: &'static str = "databricks-ovh_notebook";
    const COLLECTION: &'static str = "/cloud/project/databricks/notebook";
    const LABEL: &'static str = "notebook";

    type CreatePayload = CreateNotebookRequest;
    type UpdatePayload = UpdateNotebookRequest;
    type Record = NotebookRecord;

    fn schema() -> ResourceSchema {
        SchemaBuilder::new()
            .description("Manages a Databricks notebook on OVH infrastructure")
            .attribute(
                AttributeBuilder::string("id")
                    .computed()
                    .description("Notebook identifier")
                    .plan_modifier(Box::new(UseStateForUnknown)),
            )
            .attribute(
                AttributeBuilder::string("workspace_id")
                    .required()
                    .description("Workspace ID where the notebook will be created")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::string("path")
                    .required()
                    .description("Notebook path in the workspace")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged)),
            )
            .attribute(
                AttributeBuilder::string("language")
                    .required()
                    .description("Notebook language")
                    .plan_modifier(Box::new(RequiresReplaceIfChanged))
                    .validator(StringOneOfValidator::create(LANGUAGES)),
            )
            .attribute(
                AttributeBuilder::string("content")
                    .optional()
                    .description("Notebook content"),
            )
            .attribute(
                AttributeBuilder::string("format")
                    .optional()
                    .computed()
                    .description("Notebook format")
                    .default(StaticDefault::string("SOURCE"))
                    .validator(StringOneOfValidator::create(FORMATS)),
            )
            .attribute(
                AttributeBuilder::string("notebook_id")
                    .computed()
                    .description("Notebook ID")
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

    fn create_payload(plan: &State) -> CreateNotebookRequest {
        CreateNotebookRequest {
            workspace_id: plan.get_string("workspace_id"),
            path: plan.get_string("path"),
            language: plan.get_string("language"),
            content: plan.get_string("content"),
            format: plan.get_string("format"),
        }
    }

    fn update_payload(changes: &Changes<'_>) -> Option<UpdateNotebookRequest> {
        Some(UpdateNotebookRequest {
            content: changes.string("content"),
            format: changes.string("format"),
        })
    }

    /// Notebooks are removed by path through a dedicated endpoint
    fn delete_call(_id: &str, state: &State) -> DeleteCall {
        DeleteCall::Post(
            format!("{}/notebook/delete", DATABRICKS_BASE),
            json!({
                "path": state.get_string("path"),
                "recursive": false,
            }),
        )
    }
}
