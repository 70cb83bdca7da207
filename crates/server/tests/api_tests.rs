use std::sync::Arc;

use axum_test::TestServer;
use orchestrator::WorkflowConfig;
use provider::{InstanceProvider, ProviderError, ScriptedProvider, SimulatedConfig};
use resize_core::{Address, InstanceState, InstanceSummary, InstanceType};
use serde_json::Value;
use server::config::ServerConfig;
use server::{create_router, state::AppState};

fn simulated_server() -> TestServer {
    let state = AppState::from_config(&ServerConfig::default());
    TestServer::new(create_router(state)).expect("Failed to create test server")
}

fn scripted_server(provider: ScriptedProvider) -> TestServer {
    let provider: Arc<dyn InstanceProvider> = Arc::new(provider);
    let state = AppState::new(provider, WorkflowConfig::default());
    TestServer::new(create_router(state)).expect("Failed to create test server")
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = simulated_server();

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["provider"], "simulated");
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let server = simulated_server();

        let response = server.get("/api/openapi.json").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["paths"]["/health"].is_object());
        assert!(body["paths"]["/api/instances/{id}/status"].is_object());
        assert!(body["paths"]["/api/addresses"].is_object());
        assert!(body["paths"]["/api/instances"].is_object());
        assert!(body["paths"]["/api/instance-types"].is_object());
    }
}

mod instances {
    use super::*;

    #[tokio::test]
    async fn test_status_of_seeded_instance() {
        let server = simulated_server();
        let seeds = SimulatedConfig::default();
        let seed = &seeds.instances[0];

        let response = server
            .get(&format!("/api/instances/{}/status", seed.id))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["instance_id"], seed.id.as_str());
        assert_eq!(body["code"], 16);
        assert_eq!(body["name"], "running");
        assert_eq!(body["state"], "running");
    }

    #[tokio::test]
    async fn test_status_reports_transitional_state() {
        let server =
            scripted_server(ScriptedProvider::new().with_states([InstanceState::Stopping]));

        let response = server.get("/api/instances/i-1/status").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["code"], 64);
        assert_eq!(body["state"], "stopping");
    }

    #[tokio::test]
    async fn test_unknown_instance_is_not_found() {
        let server = simulated_server();

        let response = server.get("/api/instances/i-missing/status").await;

        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_bad_gateway() {
        let server = scripted_server(
            ScriptedProvider::new()
                .with_query_error(ProviderError::Unreachable("connection refused".to_string())),
        );

        let response = server.get("/api/instances/i-1/status").await;

        response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
        let body: Value = response.json();
        assert_eq!(body["error"], "provider_unreachable");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("connection refused"));
    }
}

mod listings {
    use super::*;

    #[tokio::test]
    async fn test_lists_seeded_instances() {
        let server = simulated_server();

        let response = server.get("/api/instances").await;

        response.assert_status_ok();
        let body: Value = response.json();
        let instances = body.as_array().unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0]["instance_id"], "i-0a1b2c3d4e5f60001");
        assert_eq!(instances[0]["instance_type"], "t3.micro");
        assert_eq!(instances[0]["state"], "running");
        assert_eq!(instances[1]["state"], "stopped");
    }

    #[tokio::test]
    async fn test_lists_scripted_instances() {
        let server = scripted_server(ScriptedProvider::new().with_instances(vec![
            InstanceSummary {
                instance_id: "i-1".to_string(),
                instance_type: "m5.large".to_string(),
                state: InstanceState::Stopping,
            },
        ]));

        let response = server.get("/api/instances").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body[0]["instance_id"], "i-1");
        assert_eq!(body[0]["state"], "stopping");
    }

    #[tokio::test]
    async fn test_instance_type_catalogue() {
        let server = simulated_server();

        let response = server.get("/api/instance-types").await;

        response.assert_status_ok();
        let body: Value = response.json();
        let types = body.as_array().unwrap();
        assert!(!types.is_empty());
        let large = types
            .iter()
            .find(|t| t["name"] == "m5.large")
            .expect("m5.large in catalogue");
        assert_eq!(large["vcpus"], 2);
        assert_eq!(large["memory_mib"], 8192);
    }

    #[tokio::test]
    async fn test_scripted_instance_types_are_passed_through() {
        let server = scripted_server(ScriptedProvider::new().with_instance_types(vec![
            InstanceType::new("t3.nano", 2, 512, "EBS only", "Up to 5 Gigabit"),
        ]));

        let response = server.get("/api/instance-types").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "t3.nano");
        assert_eq!(body[0]["network_performance"], "Up to 5 Gigabit");
    }

    #[tokio::test]
    async fn test_listing_failure_is_bad_gateway() {
        let server = scripted_server(
            ScriptedProvider::new()
                .fail_listing(ProviderError::Unreachable("throttled".to_string())),
        );

        server
            .get("/api/instances")
            .await
            .assert_status(axum::http::StatusCode::BAD_GATEWAY);
        let response = server.get("/api/instance-types").await;
        response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
        let body: Value = response.json();
        assert_eq!(body["error"], "provider_unreachable");
    }
}

mod addresses {
    use super::*;

    #[tokio::test]
    async fn test_lists_only_open_addresses() {
        let mut attached = Address::new("198.51.100.2", "eipalloc-2");
        attached.association_id = Some("eipassoc-2".to_string());
        attached.instance_id = Some("i-1".to_string());
        let server = scripted_server(ScriptedProvider::new().with_addresses(vec![
            Address::new("198.51.100.1", "eipalloc-1"),
            attached,
        ]));

        let response = server.get("/api/addresses").await;

        response.assert_status_ok();
        let body: Value = response.json();
        let addresses = body.as_array().unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0]["allocation_id"], "eipalloc-1");
        assert!(addresses[0].get("association_id").is_none());
    }

    #[tokio::test]
    async fn test_simulated_seed_address_is_open() {
        let server = simulated_server();

        let response = server.get("/api/addresses").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}

mod workflow_sockets {
    use super::*;

    #[tokio::test]
    async fn test_plain_get_is_not_upgraded() {
        let server = simulated_server();

        let response = server
            .get("/api/instances/i-1/resize")
            .add_query_param("state", "running")
            .await;

        assert!(response.status_code().is_client_error());
    }
}
