use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path, query_param},
};

use crate::core::domain::model::auth::{Auth, CsrfToken, Ticket};
use crate::{
    ActionRequest, ApiClient, ClusterApi, Connection, EngineConfig, Operation, PveError,
    RemoteTaskState, ResolvedTarget, ResourceKind, TaskHandle,
};

fn test_connection(server_url: &str) -> Connection {
    let url = Url::parse(server_url).unwrap();
    Connection::new(
        url.host_str().unwrap(),
        url.port().unwrap(),
        "testuser",
        "testpass",
        "pam",
        false,
        true,
    )
    .unwrap()
}

async fn authenticated_client(mock_server: &MockServer) -> ApiClient {
    let connection = test_connection(&mock_server.uri());
    let client = ApiClient::new(connection, &EngineConfig::default()).unwrap();
    client
        .set_auth(Auth::new(
            Ticket::new("PVE:testuser@pam:4EEC61E2::sig"),
            CsrfToken::new("4EEC61E2:token"),
        ))
        .await;
    client
}

fn vm_target(vmid: u32, node: &str) -> ResolvedTarget {
    ResolvedTarget {
        kind: ResourceKind::Vm,
        id: vmid.to_string(),
        node: node.to_string(),
        name: format!("vm-{}", vmid),
    }
}

#[tokio::test]
async fn submit_start_hits_the_status_endpoint_and_returns_a_handle() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api2/json/nodes/pve1/qemu/100/status/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": "UPID:pve1:0009C3E2:0B4F12AA:66F0A1C3:qmstart:100:root@pam:"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = ActionRequest {
        target: vm_target(100, "pve1"),
        operation: Operation::Start,
    };
    let handle = client.submit_action(&request).await.unwrap();
    assert_eq!(handle.node, "pve1");
    assert!(handle.upid.starts_with("UPID:pve1:"));
}

#[tokio::test]
async fn submit_shutdown_serializes_its_parameters() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api2/json/nodes/pve1/qemu/100/status/shutdown"))
        .and(body_json(serde_json::json!({"timeout": 30, "forceStop": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": "UPID:pve1:0009C3E3:0B4F12AB:66F0A1C4:qmshutdown:100:root@pam:"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = ActionRequest {
        target: vm_target(100, "pve1"),
        operation: Operation::Shutdown {
            timeout: Some(30),
            force_stop: true,
        },
    };
    client.submit_action(&request).await.unwrap();
}

#[tokio::test]
async fn submit_remove_issues_a_delete_with_purge_flags() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("DELETE"))
        .and(path("/api2/json/nodes/pve2/lxc/200"))
        .and(query_param("purge", "1"))
        .and(query_param("destroy-unreferenced-disks", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": "UPID:pve2:0009C3E4:0B4F12AC:66F0A1C5:vzdestroy:200:root@pam:"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = ActionRequest {
        target: ResolvedTarget {
            kind: ResourceKind::Container,
            id: "200".to_string(),
            node: "pve2".to_string(),
            name: "ct-200".to_string(),
        },
        operation: Operation::Remove {
            purge: true,
            destroy_unreferenced: true,
        },
    };
    client.submit_action(&request).await.unwrap();
}

#[tokio::test]
async fn submit_rejection_surfaces_as_an_api_error() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api2/json/nodes/pve1/qemu/100/status/start"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Permission check failed"))
        .mount(&mock_server)
        .await;

    let request = ActionRequest {
        target: vm_target(100, "pve1"),
        operation: Operation::Start,
    };
    let result = client.submit_action(&request).await;
    assert!(matches!(
        result,
        Err(PveError::Api { status: 403, message }) if message.contains("Permission")
    ));
}

#[tokio::test]
async fn submit_for_a_node_target_is_rejected_client_side() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    let request = ActionRequest {
        target: ResolvedTarget {
            kind: ResourceKind::Node,
            id: "pve1".to_string(),
            node: "pve1".to_string(),
            name: "pve1".to_string(),
        },
        operation: Operation::Start,
    };
    let result = client.submit_action(&request).await;
    assert!(matches!(result, Err(PveError::Api { status: 400, .. })));
}

#[tokio::test]
async fn poll_decodes_running_and_terminal_states() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve1/tasks/UPID-running/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"status": "running"}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve1/tasks/UPID-ok/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"status": "stopped", "exitstatus": "OK"}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve1/tasks/UPID-bad/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"status": "stopped", "exitstatus": "command failed with exit code 1"}
        })))
        .mount(&mock_server)
        .await;

    let handle = |upid: &str| TaskHandle {
        node: "pve1".to_string(),
        upid: upid.to_string(),
    };

    assert_eq!(
        client.poll_task(&handle("UPID-running")).await.unwrap(),
        RemoteTaskState::Running
    );
    assert_eq!(
        client.poll_task(&handle("UPID-ok")).await.unwrap(),
        RemoteTaskState::Succeeded
    );
    assert!(matches!(
        client.poll_task(&handle("UPID-bad")).await.unwrap(),
        RemoteTaskState::Failed(reason) if reason.contains("exit code 1")
    ));
}

#[tokio::test]
async fn fetch_inventory_parses_the_heterogeneous_resource_list() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api2/json/cluster/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"type": "qemu", "vmid": 100, "node": "pve1", "name": "web-01",
                 "status": "running", "tags": "prod;web"},
                {"type": "lxc", "vmid": 200, "node": "pve2", "name": "cache-01",
                 "status": "stopped"},
                {"type": "node", "node": "pve1", "status": "online"},
                {"type": "storage", "storage": "local", "node": "pve1", "status": "available"},
                {"type": "pool", "pool": "production"},
                {"type": "sdn", "sdn": "zone0", "node": "pve1", "status": "ok"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let inventory = client.fetch_inventory().await.unwrap();

    let guests: Vec<_> = inventory.guests().collect();
    assert_eq!(guests.len(), 2);
    assert_eq!(guests[0].1.vmid, 100);
    assert_eq!(guests[0].1.tag_list(), ["prod", "web"]);
    assert_eq!(guests[1].0, ResourceKind::Container);
    assert_eq!(inventory.node_names(), ["pve1"]);
    assert_eq!(inventory.known_tags(), ["prod", "web"]);
}

#[tokio::test]
async fn unauthorized_triggers_one_refresh_and_retry() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api2/json/cluster/resources"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api2/json/access/ticket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "ticket": "PVE:testuser@pam:4EEC61E2::new_sig",
                "CSRFPreventionToken": "4EEC61E2:abc123"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api2/json/cluster/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": []
        })))
        .mount(&mock_server)
        .await;

    let inventory = client.fetch_inventory().await.unwrap();
    assert_eq!(inventory.guests().count(), 0);
}

#[tokio::test]
async fn failed_refresh_surfaces_an_authentication_error() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api2/json/cluster/resources"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api2/json/access/ticket"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let result = client.fetch_inventory().await;
    assert!(matches!(result, Err(PveError::Authentication(_))));
}
