//! Authenticated HTTP client implementing the [`ClusterApi`] contract.
//!
//! Adds the `PVEAuthCookie` and `CSRFPreventionToken` headers to each
//! request. A `401 Unauthorized` response triggers exactly one ticket
//! refresh with the stored credentials before the request is retried.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::{
    auth::application::service::login_service::LoginService,
    core::domain::{
        api::{ClusterApi, RemoteTaskState},
        error::{PveError, PveResult},
        model::{
            auth::Auth,
            config::EngineConfig,
            connection::Connection,
            inventory::{ClusterResource, InventorySnapshot},
            operation::{GuestPowerParams, Operation},
            target::ResourceKind,
            task::{ActionRequest, TaskHandle},
        },
    },
};

/// Every Proxmox API response wraps its payload in a `data` field.
#[derive(Deserialize)]
struct ApiData<T> {
    data: T,
}

/// Task status as returned by `/nodes/{node}/tasks/{upid}/status`.
#[derive(Deserialize)]
struct TaskStatusData {
    status: String,
    #[serde(default)]
    exitstatus: Option<String>,
}

/// HTTP client for the Proxmox API.
#[derive(Debug)]
pub struct ApiClient {
    http_client: Client,
    connection: Arc<Connection>,
    auth: Arc<RwLock<Option<Auth>>>,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl ApiClient {
    /// Creates a new `ApiClient`. The client starts unauthenticated.
    ///
    /// # Errors
    /// Returns `PveError::Connection` if the HTTP client cannot be built.
    pub fn new(connection: Connection, config: &EngineConfig) -> PveResult<Self> {
        let http_client = Client::builder()
            .danger_accept_invalid_certs(connection.accept_invalid_certs())
            .build()
            .map_err(|e| PveError::Connection(e.to_string()))?;

        let rate_limiter = config.rate_limit.map(|rl| {
            let quota = Quota::per_second(
                NonZeroU32::new(rl.requests_per_second.max(1)).unwrap(),
            )
            .allow_burst(NonZeroU32::new(rl.burst_size.max(1)).unwrap());
            Arc::new(DefaultDirectRateLimiter::direct(quota))
        });

        Ok(Self {
            http_client,
            connection: Arc::new(connection),
            auth: Arc::new(RwLock::new(None)),
            rate_limiter,
        })
    }

    /// Returns a reference to the underlying connection details.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Sets the authentication state (after a successful login).
    pub async fn set_auth(&self, auth: Auth) {
        let mut lock = self.auth.write().await;
        *lock = Some(auth);
    }

    /// Returns `true` if a ticket is present.
    pub async fn is_authenticated(&self) -> bool {
        self.auth.read().await.is_some()
    }

    /// Performs an authenticated GET request, unwrapping the `data` envelope.
    pub async fn get<T>(&self, path: &str) -> PveResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.execute_request(reqwest::Method::GET, path, None::<&()>)
            .await
    }

    /// Performs an authenticated POST request with an optional JSON body.
    pub async fn post<B, T>(&self, path: &str, body: Option<&B>) -> PveResult<T>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        self.execute_request(reqwest::Method::POST, path, body).await
    }

    /// Performs an authenticated DELETE request.
    pub async fn delete<T>(&self, path: &str) -> PveResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.execute_request(reqwest::Method::DELETE, path, None::<&()>)
            .await
    }

    /// Core request execution. Ensures authentication, applies rate
    /// limiting, sends the request, handles 401 by refreshing once, and
    /// parses the enveloped response.
    async fn execute_request<B, T>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> PveResult<T>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        self.ensure_authenticated().await?;

        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let response = self.send(method.clone(), path, body).await?;

        // One refresh, one retry, no recursion.
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            self.refresh_auth().await?;
            self.send(method, path, body).await?
        } else {
            response
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(PveError::Api { status, message });
        }

        let envelope = response
            .json::<ApiData<T>>()
            .await
            .map_err(|e| PveError::Connection(format!("Failed to parse response: {}", e)))?;
        Ok(envelope.data)
    }

    async fn send<B>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> PveResult<reqwest::Response>
    where
        B: serde::Serialize,
    {
        let base = self.connection.url().as_str().trim_end_matches('/');
        let url = format!("{}/api2/json/{}", base, path.trim_start_matches('/'));

        let mut req_builder = self.http_client.request(method, &url);

        {
            let auth_guard = self.auth.read().await;
            if let Some(auth) = auth_guard.as_ref() {
                req_builder = req_builder
                    .header("Cookie", auth.ticket().as_cookie_header())
                    .header("CSRFPreventionToken", auth.csrf_token().as_str());
            }
        }

        if let Some(body) = body {
            req_builder = req_builder.json(body);
        }

        req_builder
            .send()
            .await
            .map_err(|e| PveError::Connection(format!("HTTP request failed: {}", e)))
    }

    async fn ensure_authenticated(&self) -> PveResult<()> {
        let missing = self.auth.read().await.is_none();
        if missing {
            self.refresh_auth().await?;
        }
        Ok(())
    }

    /// Performs a fresh login with the stored credentials.
    async fn refresh_auth(&self) -> PveResult<()> {
        let service = LoginService::new();
        let auth = service.execute(&self.connection).await?;
        let mut lock = self.auth.write().await;
        *lock = Some(auth);
        Ok(())
    }

    fn guest_segment(kind: ResourceKind) -> Option<&'static str> {
        match kind {
            ResourceKind::Vm => Some("qemu"),
            ResourceKind::Container => Some("lxc"),
            _ => None,
        }
    }
}

#[async_trait]
impl ClusterApi for ApiClient {
    async fn fetch_inventory(&self) -> PveResult<InventorySnapshot> {
        let resources: Vec<ClusterResource> = self.get("cluster/resources").await?;
        Ok(InventorySnapshot::new(resources))
    }

    async fn submit_action(&self, request: &ActionRequest) -> PveResult<TaskHandle> {
        let target = &request.target;
        let segment = Self::guest_segment(target.kind).ok_or_else(|| PveError::Api {
            status: 400,
            message: format!(
                "operation '{}' is not supported for {} targets",
                request.operation, target.kind
            ),
        })?;

        let upid: String = match &request.operation {
            Operation::Remove {
                purge,
                destroy_unreferenced,
            } => {
                let mut path = format!("nodes/{}/{}/{}", target.node, segment, target.id);
                let mut query = Vec::new();
                if *purge {
                    query.push("purge=1");
                }
                if *destroy_unreferenced {
                    query.push("destroy-unreferenced-disks=1");
                }
                if !query.is_empty() {
                    path = format!("{}?{}", path, query.join("&"));
                }
                self.delete(&path).await?
            }
            op => {
                let endpoint = op
                    .status_endpoint()
                    .expect("non-Remove operations have a status endpoint");
                let path = format!(
                    "nodes/{}/{}/{}/status/{}",
                    target.node, segment, target.id, endpoint
                );
                let body = match op {
                    Operation::Stop { timeout } | Operation::Reboot { timeout } => {
                        GuestPowerParams::new(*timeout, false)
                    }
                    Operation::Shutdown {
                        timeout,
                        force_stop,
                    } => GuestPowerParams::new(*timeout, *force_stop),
                    _ => None,
                };
                self.post(&path, body.as_ref()).await?
            }
        };

        Ok(TaskHandle {
            node: target.node.clone(),
            upid,
        })
    }

    async fn poll_task(&self, handle: &TaskHandle) -> PveResult<RemoteTaskState> {
        let path = format!("nodes/{}/tasks/{}/status", handle.node, handle.upid);
        let status: TaskStatusData = self.get(&path).await?;

        if status.status == "stopped" {
            match status.exitstatus.as_deref() {
                Some("OK") => Ok(RemoteTaskState::Succeeded),
                Some(other) => Ok(RemoteTaskState::Failed(other.to_string())),
                None => Ok(RemoteTaskState::Failed("unknown exit status".to_string())),
            }
        } else {
            Ok(RemoteTaskState::Running)
        }
    }
}
