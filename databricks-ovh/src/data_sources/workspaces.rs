//! `databricks-ovh_workspaces`: lists workspaces, optionally filtered by
//! region and status.

use crate::api::{Client, LenientId, DATABRICKS_BASE};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tfplug::request::{ReadDataSourceRequest, ReadDataSourceResponse};
use tfplug::schema::DataSourceSchema;
use tfplug::{AttributeBuilder, AttributeType, DataSource, Diagnostics, Dynamic, SchemaBuilder, State};

pub const TYPE_NAME: &str = "databricks-ovh_workspaces";

const SUMMARY_FIELDS: &[&str] = &[
    "id",
    "name",
    "region",
    "tier",
    "workspace_id",
    "workspace_url",
    "status",
    "created_time",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSummary {
    pub id: Option<LenientId>,
    pub name: Option<String>,
    pub region: Option<String>,
    pub tier: Option<String>,
    pub workspace_id: Option<LenientId>,
    pub workspace_url: Option<String>,
    pub status: Option<String>,
    pub created_time: Option<LenientId>,
}

impl WorkspaceSummary {
    /// Exact, case-sensitive match; an empty filter matches everything
    fn matches(&self, region: &str, status: &str) -> bool {
        (region.is_empty() || self.region.as_deref() == Some(region))
            && (status.is_empty() || self.status.as_deref() == Some(status))
    }

    fn into_dynamic(self) -> Dynamic {
        let id = |value: Option<LenientId>| Dynamic::from(value.map(LenientId::into_inner));
        Dynamic::Map(HashMap::from([
            ("id".to_string(), id(self.id)),
            ("name".to_string(), Dynamic::from(self.name)),
            ("region".to_string(), Dynamic::from(self.region)),
            ("tier".to_string(), Dynamic::from(self.tier)),
            ("workspace_id".to_string(), id(self.workspace_id)),
            ("workspace_url".to_string(), Dynamic::from(self.workspace_url)),
            ("status".to_string(), Dynamic::from(self.status)),
            ("created_time".to_string(), id(self.created_time)),
        ]))
    }
}

pub struct WorkspacesDataSource {
    client: Client,
}

impl WorkspacesDataSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema() -> DataSourceSchema {
        let summary = SUMMARY_FIELDS
            .iter()
            .map(|name| (name.to_string(), AttributeType::String))
            .collect();

        SchemaBuilder::new()
            .description("Lists Databricks workspaces on OVH infrastructure")
            .attribute(
                AttributeBuilder::string("id")
                    .computed()
                    .description("Identifier of this lookup"),
            )
            .attribute(
                AttributeBuilder::string("region")
                    .optional()
                    .description("Only return workspaces in this region"),
            )
            .attribute(
                AttributeBuilder::string("status")
                    .optional()
                    .description("Only return workspaces with this status"),
            )
            .attribute(
                AttributeBuilder::list("workspaces", AttributeType::Object(summary))
                    .computed()
                    .description("Matching workspaces"),
            )
            .build_data_source(0)
    }
}

#[async_trait]
impl DataSource for WorkspacesDataSource {
    async fn read(&self, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = Diagnostics::new();
        let config = request.config;

        let region = config.get_string("region").unwrap_or_default();
        let status = config.get_string("status").unwrap_or_default();

        let path = format!("{}/workspace", DATABRICKS_BASE);
        let summaries = match self.client.get::<Vec<WorkspaceSummary>>(&path).await {
            Ok(summaries) => summaries,
            Err(e) => {
                tracing::error!("Unable to read workspaces: {}", e);
                diagnostics.add_error(
                    "Client Error",
                    Some(format!("Unable to read workspaces, got error: {}", e)),
                );
                return ReadDataSourceResponse {
                    state: None,
                    diagnostics,
                };
            }
        };

        let total = summaries.len();
        let workspaces: Vec<Dynamic> = summaries
            .into_iter()
            .filter(|summary| summary.matches(&region, &status))
            .map(WorkspaceSummary::into_dynamic)
            .collect();
        tracing::debug!("{} of {} workspaces matched", workspaces.len(), total);

        let mut state = State::new();
        state.set("id", chrono::Utc::now().timestamp().to_string());
        state.set("region", config.get("region").clone());
        state.set("status", config.get("status").clone());
        state.set("workspaces", Dynamic::List(workspaces));

        ReadDataSourceResponse {
            state: Some(state),
            diagnostics,
        }
    }
}
