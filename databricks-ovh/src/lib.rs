pub mod api;
pub mod data_sources;
pub mod resources;

use async_trait::async_trait;
use resources::{
    ClusterPolicy, InstancePool, Job, ManagedResource, Notebook, ResourceKind, SecretScope,
    Workspace,
};
use std::collections::HashMap;
use std::sync::OnceLock;
use tfplug::request::{ConfigureRequest, ConfigureResponse};
use tfplug::schema::{DataSourceSchema, ProviderSchema, ResourceSchema};
use tfplug::{
    AttributeBuilder, AttributePath, Config, DataSource, Diagnostics, Provider, Resource,
    SchemaBuilder, TfplugError,
};

pub const REGISTRY_ADDRESS: &str = "registry.terraform.io/swcstudio/databricks-ovh";

/// Required settings: attribute, environment fallback, diagnostic label
const OVH_SETTINGS: [(&str, &str, &str); 4] = [
    ("ovh_endpoint", "OVH_ENDPOINT", "OVH API Endpoint"),
    ("ovh_application_key", "OVH_APPLICATION_KEY", "OVH Application Key"),
    (
        "ovh_application_secret",
        "OVH_APPLICATION_SECRET",
        "OVH Application Secret",
    ),
    ("ovh_consumer_key", "OVH_CONSUMER_KEY", "OVH Consumer Key"),
];

/// Resolved provider configuration
#[derive(Clone, Default)]
pub struct ProviderSettings {
    pub endpoint: String,
    pub application_key: String,
    pub application_secret: String,
    pub consumer_key: String,
    pub project_id: Option<String>,
    pub databricks_account_id: Option<String>,
    pub databricks_username: Option<String>,
    pub databricks_password: Option<String>,
    pub databricks_token: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("endpoint", &self.endpoint)
            .field("application_key", &self.application_key)
            .field("project_id", &self.project_id)
            .field("databricks_account_id", &self.databricks_account_id)
            .field("databricks_username", &self.databricks_username)
            .finish_non_exhaustive()
    }
}

/// Config value, falling back to `env` when unset or empty
fn setting(config: &Config, name: &str, env: &str) -> Option<String> {
    config
        .get_string(name)
        .filter(|value| !value.is_empty())
        .or_else(|| std::env::var(env).ok())
        .filter(|value| !value.is_empty())
}

impl ProviderSettings {
    /// Resolves settings from provider configuration and environment. Unknown
    /// values are reported first; missing values only once everything is known.
    pub fn from_config(config: &Config) -> Result<Self, Diagnostics> {
        let mut diagnostics = Diagnostics::new();

        for (name, _, label) in OVH_SETTINGS.iter() {
            if config.get(name).is_unknown() {
                diagnostics.add_attribute_error(
                    AttributePath::new(name),
                    format!("Unknown {}", label),
                    format!(
                        "The provider cannot create the OVH API client as there is an unknown configuration value for the {}. Either target apply the source of the value first, set the value statically in the configuration, or use an environment variable.",
                        label
                    ),
                );
            }
        }
        if diagnostics.has_errors() {
            return Err(diagnostics);
        }

        let [endpoint, application_key, application_secret, consumer_key] =
            OVH_SETTINGS.map(|(name, env, label)| {
                let value = setting(config, name, env);
                if value.is_none() {
                    diagnostics.add_attribute_error(
                        AttributePath::new(name),
                        format!("Missing {}", label),
                        format!(
                            "The provider cannot create the OVH API client as there is a missing or empty value for the {}. Set the {} value in the configuration or use the {} environment variable.",
                            label, name, env
                        ),
                    );
                }
                value
            });

        let (Some(endpoint), Some(application_key), Some(application_secret), Some(consumer_key)) =
            (endpoint, application_key, application_secret, consumer_key)
        else {
            return Err(diagnostics);
        };

        Ok(Self {
            endpoint,
            application_key,
            application_secret,
            consumer_key,
            project_id: setting(config, "ovh_project_id", "OVH_PROJECT_ID"),
            databricks_account_id: setting(config, "databricks_account_id", "DATABRICKS_ACCOUNT_ID"),
            databricks_username: setting(config, "databricks_username", "DATABRICKS_USERNAME"),
            databricks_password: setting(config, "databricks_password", "DATABRICKS_PASSWORD"),
            databricks_token: setting(config, "databricks_token", "DATABRICKS_TOKEN"),
        })
    }

    fn credentials(&self) -> api::Credentials {
        api::Credentials {
            application_key: self.application_key.clone(),
            application_secret: self.application_secret.clone(),
            consumer_key: self.consumer_key.clone(),
        }
    }
}

pub struct DatabricksOvhProvider {
    client: Option<api::Client>,
    settings: Option<ProviderSettings>,
}

impl Default for DatabricksOvhProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabricksOvhProvider {
    pub fn new() -> Self {
        Self {
            client: None,
            settings: None,
        }
    }

    pub fn settings(&self) -> Option<&ProviderSettings> {
        self.settings.as_ref()
    }

    fn client(&self) -> tfplug::Result<api::Client> {
        self.client
            .clone()
            .ok_or(TfplugError::ProviderNotConfigured)
    }
}

fn managed<S: ResourceKind>(client: api::Client) -> Box<dyn Resource> {
    Box::new(ManagedResource::<S>::new(client))
}

#[async_trait]
impl Provider for DatabricksOvhProvider {
    fn provider_schema(&self) -> ProviderSchema {
        static SCHEMA: OnceLock<ProviderSchema> = OnceLock::new();

        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .description("Terraform provider for Databricks on OVH infrastructure")
                    .attribute(
                        AttributeBuilder::string("ovh_endpoint")
                            .optional()
                            .description("OVH API endpoint, e.g. ovh-eu. May also be provided via OVH_ENDPOINT."),
                    )
                    .attribute(
                        AttributeBuilder::string("ovh_application_key")
                            .optional()
                            .description("OVH application key. May also be provided via OVH_APPLICATION_KEY."),
                    )
                    .attribute(
                        AttributeBuilder::string("ovh_application_secret")
                            .optional()
                            .sensitive()
                            .description("OVH application secret. May also be provided via OVH_APPLICATION_SECRET."),
                    )
                    .attribute(
                        AttributeBuilder::string("ovh_consumer_key")
                            .optional()
                            .sensitive()
                            .description("OVH consumer key. May also be provided via OVH_CONSUMER_KEY."),
                    )
                    .attribute(
                        AttributeBuilder::string("ovh_project_id")
                            .optional()
                            .description("OVH Public Cloud project ID. May also be provided via OVH_PROJECT_ID."),
                    )
                    .attribute(
                        AttributeBuilder::string("databricks_account_id")
                            .optional()
                            .description("Databricks account ID. May also be provided via DATABRICKS_ACCOUNT_ID."),
                    )
                    .attribute(
                        AttributeBuilder::string("databricks_username")
                            .optional()
                            .description("Databricks username. May also be provided via DATABRICKS_USERNAME."),
                    )
                    .attribute(
                        AttributeBuilder::string("databricks_password")
                            .optional()
                            .sensitive()
                            .description("Databricks password. May also be provided via DATABRICKS_PASSWORD."),
                    )
                    .attribute(
                        AttributeBuilder::string("databricks_token")
                            .optional()
                            .sensitive()
                            .description("Databricks personal access token. May also be provided via DATABRICKS_TOKEN."),
                    )
                    .build_provider()
            })
            .clone()
    }

    async fn configure(&mut self, request: ConfigureRequest) -> ConfigureResponse {
        let mut diagnostics = Diagnostics::new();

        let settings = match ProviderSettings::from_config(&request.config) {
            Ok(settings) => settings,
            Err(errors) => {
                return ConfigureResponse {
                    diagnostics: errors,
                }
            }
        };

        match api::Client::new(&settings.endpoint, settings.credentials()) {
            Ok(client) => {
                tracing::info!("configured OVH API client for {}", client.base_url());
                self.client = Some(client);
                self.settings = Some(settings);
            }
            Err(e) => {
                tracing::error!("Unable to create OVH API client: {}", e);
                diagnostics.add_error(
                    "Unable to Create OVH API Client",
                    Some(format!(
                        "An unexpected error occurred when creating the OVH API client. OVH Client Error: {}",
                        e
                    )),
                );
            }
        }

        ConfigureResponse { diagnostics }
    }

    async fn create_resource(&self, name: &str) -> tfplug::Result<Box<dyn Resource>> {
        let client = self.client()?;

        match name {
            Workspace::TYPE_NAME => Ok(managed::<Workspace>(client)),
            Job::TYPE_NAME => Ok(managed::<Job>(client)),
            Notebook::TYPE_NAME => Ok(managed::<Notebook>(client)),
            SecretScope::TYPE_NAME => Ok(managed::<SecretScope>(client)),
            InstancePool::TYPE_NAME => Ok(managed::<InstancePool>(client)),
            ClusterPolicy::TYPE_NAME => Ok(managed::<ClusterPolicy>(client)),
            _ => Err(TfplugError::ResourceNotFound(name.to_string())),
        }
    }

    async fn create_data_source(&self, name: &str) -> tfplug::Result<Box<dyn DataSource>> {
        let client = self.client()?;

        match name {
            data_sources::workspaces::TYPE_NAME => {
                Ok(Box::new(data_sources::WorkspacesDataSource::new(client)))
            }
            _ => Err(TfplugError::DataSourceNotFound(name.to_string())),
        }
    }

    async fn resource_schemas(&self) -> HashMap<String, ResourceSchema> {
        static SCHEMAS: OnceLock<HashMap<String, ResourceSchema>> = OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                HashMap::from([
                    (Workspace::TYPE_NAME.to_string(), Workspace::schema()),
                    (Job::TYPE_NAME.to_string(), Job::schema()),
                    (Notebook::TYPE_NAME.to_string(), Notebook::schema()),
                    (SecretScope::TYPE_NAME.to_string(), SecretScope::schema()),
                    (InstancePool::TYPE_NAME.to_string(), InstancePool::schema()),
                    (ClusterPolicy::TYPE_NAME.to_string(), ClusterPolicy::schema()),
                ])
            })
            .clone()
    }

    async fn data_source_schemas(&self) -> HashMap<String, DataSourceSchema> {
        static SCHEMAS: OnceLock<HashMap<String, DataSourceSchema>> = OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                HashMap::from([(
                    data_sources::workspaces::TYPE_NAME.to_string(),
                    data_sources::WorkspacesDataSource::schema(),
                )])
            })
            .clone()
    }
}
