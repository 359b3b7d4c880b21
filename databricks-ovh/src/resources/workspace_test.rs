#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::super::*;
    use crate::api::{Client, Credentials};
    use crate::resources::ManagedResource;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tfplug::request::{CreateRequest, ReadRequest, UpdateRequest};
    use tfplug::{Config, Dynamic, Resource};

    fn create_test_resource(url: &str) -> ManagedResource<Workspace> {
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

    fn planned_workspace() -> State {
        let mut plan = State::new();
        plan.set("name", "w1");
        plan.set("region", "eu-west-1");
        plan.set("tier", "STANDARD");
        plan.set("pricing_tier", "STANDARD");
        plan.set("ovh_optimization", true);
        plan.set("cost_tracking", true);
        for computed in [
            "id",
            "deployment_name",
            "aws_region",
            "workspace_id",
            "workspace_url",
            "workspace_status",
            "creation_time",
        ] {
            plan.set(computed, Dynamic::Unknown);
        }
        plan
    }

    #[test]
    fn test_schema_attributes() {
        let schema = Workspace::schema();

        assert_eq!(schema.attributes.len(), 18);
        assert!(schema.attributes["name"].required);
        assert!(schema.attributes["region"].required);
        assert!(schema.attributes["tier"].optional && schema.attributes["tier"].computed);
        assert!(schema.attributes["tier"].default.is_some());
        assert!(schema.attributes["workspace_url"].computed);
        assert_eq!(schema.attributes["region"].plan_modifiers.len(), 1);
        assert_eq!(
            schema.attributes["custom_tags"].r#type,
            AttributeType::Map(Box::new(AttributeType::String))
        );
    }

    #[test]
    fn test_create_payload_omits_unset_fields() {
        let payload = serde_json::to_value(Workspace::create_payload(&planned_workspace())).unwrap();

        assert_eq!(
            payload,
            json!({
                "name": "w1",
                "region": "eu-west-1",
                "tier": "STANDARD",
                "pricingTier": "STANDARD",
                "ovhOptimization": true,
                "costTracking": true,
            })
        );
    }

    #[tokio::test]
    async fn test_create_workspace() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/cloud/project/databricks/workspace")
            .match_body(Matcher::PartialJson(json!({
                "name": "w1",
                "region": "eu-west-1",
            })))
            .with_body(r#"{"id":"abc123","workspaceStatus":"RUNNING"}"#)
            .create_async()
            .await;

        let response = create_test_resource(&server.url())
            .create(CreateRequest {
                config: Config::new(),
                planned_state: planned_workspace(),
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        let state = response.state;
        assert_eq!(state.get_string("id"), Some("abc123".to_string()));
        assert_eq!(state.get_string("name"), Some("w1".to_string()));
        assert_eq!(state.get_string("region"), Some("eu-west-1".to_string()));
        assert_eq!(
            state.get_string("workspace_status"),
            Some("RUNNING".to_string())
        );
        assert!(state.get("workspace_url").is_unknown());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_reports_client_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/cloud/project/databricks/workspace")
            .with_status(400)
            .with_body(r#"{"message":"Invalid region"}"#)
            .create_async()
            .await;

        let response = create_test_resource(&server.url())
            .create(CreateRequest {
                config: Config::new(),
                planned_state: planned_workspace(),
            })
            .await;

        assert!(response.diagnostics.has_errors());
        assert_eq!(response.diagnostics.errors[0].summary, "Client Error");
        assert_eq!(
            response.diagnostics.errors[0].detail.as_deref(),
            Some("Unable to create workspace, got error: API returned error (HTTP 400): Invalid region")
        );
    }

    #[tokio::test]
    async fn test_read_overwrites_present_fields_only() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/cloud/project/databricks/workspace/abc123")
            .with_body(
                json!({
                    "id": "abc123",
                    "name": "renamed",
                    "workspaceId": 4211,
                    "workspaceUrl": "https://adb-4211.ovh.databricks.net",
                    "customTags": {"team": "data"},
                    "somethingNew": [1, 2, 3],
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut current = State::new();
        current.set("id", "abc123");
        current.set("name", "w1");
        current.set("region", "eu-west-1");

        let response = create_test_resource(&server.url())
            .read(ReadRequest {
                current_state: current,
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        let state = response.state.unwrap();
        assert_eq!(state.get_string("name"), Some("renamed".to_string()));
        assert_eq!(state.get_string("region"), Some("eu-west-1".to_string()));
        assert_eq!(state.get_string("workspace_id"), Some("4211".to_string()));
        assert_eq!(
            state.get("custom_tags").as_map().unwrap()["team"],
            Dynamic::from("data")
        );
    }

    #[tokio::test]
    async fn test_read_missing_workspace_clears_state() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/cloud/project/databricks/workspace/gone")
            .with_status(404)
            .create_async()
            .await;

        let mut current = State::new();
        current.set("id", "gone");

        let response = create_test_resource(&server.url())
            .read(ReadRequest {
                current_state: current,
            })
            .await;

        assert!(response.state.is_none());
        assert!(!response.diagnostics.has_errors());
        assert_eq!(response.diagnostics.warnings.len(), 1);
        assert!(response.diagnostics.warnings[0]
            .detail
            .as_deref()
            .unwrap()
            .starts_with("Unable to read workspace, got error:"));
    }

    #[tokio::test]
    async fn test_create_accepts_numeric_creation_time() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/cloud/project/databricks/workspace")
            .with_body(r#"{"id":"abc123","workspaceStatus":"RUNNING","creationTime":1700000000}"#)
            .create_async()
            .await;

        let response = create_test_resource(&server.url())
            .create(CreateRequest {
                config: Config::new(),
                planned_state: planned_workspace(),
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        assert!(response.diagnostics.warnings.is_empty());
        assert_eq!(
            response.state.get_string("creation_time"),
            Some("1700000000".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_clears_removed_custom_tags() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/cloud/project/databricks/workspace/abc123")
            .match_body(Matcher::Json(json!({"customTags": null})))
            .with_body("")
            .create_async()
            .await;

        let mut prior = State::new();
        prior.set("id", "abc123");
        prior.set("name", "w1");
        prior.set("region", "eu-west-1");
        prior.set(
            "custom_tags",
            Dynamic::Map([("team".to_string(), Dynamic::from("data"))].into()),
        );

        let mut planned = prior.clone();
        planned.set("custom_tags", Dynamic::Null);

        let response = create_test_resource(&server.url())
            .update(UpdateRequest {
                config: Config::new(),
                planned_state: planned,
                current_state: prior,
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        assert!(response.state.get("custom_tags").is_null());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_sends_only_changed_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/cloud/project/databricks/workspace/abc123")
            .match_body(Matcher::Json(json!({"name": "w2", "tier": "PREMIUM"})))
            .with_body(r#"{"workspaceStatus":"UPDATING"}"#)
            .create_async()
            .await;

        let mut prior = State::new();
        prior.set("id", "abc123");
        prior.set("name", "w1");
        prior.set("region", "eu-west-1");
        prior.set("tier", "STANDARD");
        prior.set("pricing_tier", "STANDARD");
        prior.set("workspace_status", "RUNNING");
        prior.set("workspace_url", "https://adb-1.ovh.databricks.net");

        let mut planned = prior.clone();
        planned.set("name", "w2");
        planned.set("tier", "PREMIUM");
        planned.set("workspace_status", Dynamic::Unknown);

        let response = create_test_resource(&server.url())
            .update(UpdateRequest {
                config: Config::new(),
                planned_state: planned,
                current_state: prior,
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        let state = response.state;
        assert_eq!(state.get_string("name"), Some("w2".to_string()));
        assert_eq!(
            state.get_string("workspace_status"),
            Some("UPDATING".to_string())
        );
        assert_eq!(
            state.get_string("workspace_url"),
            Some("https://adb-1.ovh.databricks.net".to_string())
        );

        mock.assert_async().await;
    }
}
