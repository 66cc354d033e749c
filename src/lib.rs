mod auth;
mod batch;
mod core;

#[cfg(test)]
mod tests;

use std::sync::Arc;

pub use tokio_util::sync::CancellationToken;

pub use crate::batch::{
    aggregator::ResultAggregator,
    confirm::{AlwaysConfirm, ConfirmPrompt, GateDecision},
    engine::{BatchEngine, BatchOptions},
    resolver::{TargetResolver, parse_id_list},
};
pub use crate::core::domain::{
    api::{ClusterApi, RemoteTaskState},
    error::{PveError, PveResult, ResolveError},
    model::{
        auth::{Auth, CsrfToken, Ticket},
        config::{EngineConfig, RateLimitConfig, TimeoutTable},
        connection::Connection,
        inventory::{ClusterResource, GuestResource, InventorySnapshot},
        operation::Operation,
        target::{ResolvedTarget, ResourceKind, TargetQuery, TargetSpec},
        task::{ActionRequest, BatchReport, ExitStatus, TargetResult, TaskHandle, TaskStatus},
    },
};
pub use crate::core::infrastructure::api_client::ApiClient;

/// A client for running batch operations against a Proxmox VE cluster.
///
/// The client wraps an authenticated [`ApiClient`] and the batch engine:
/// target resolution, confirmation, parallel dispatch, task polling and
/// result aggregation for one command at a time.
///
/// # Examples
///
/// ```no_run
/// use pvebatch::{AlwaysConfirm, BatchOptions, Operation, PveClient, PveResult, TargetSpec};
///
/// #[tokio::main]
/// async fn main() -> PveResult<()> {
///     let client = PveClient::builder()
///         .host("proxmox.example.com")
///         .port(8006)
///         .credentials("user", "password", "pve")
///         .secure(true)
///         .build()?;
///
///     let report = client
///         .run_batch(
///             &TargetSpec::List("100,101,102".to_string()),
///             &Operation::Start,
///             &AlwaysConfirm,
///             &BatchOptions::default(),
///         )
///         .await?;
///
///     std::process::exit(report.exit_status().code());
/// }
/// ```
pub struct PveClient {
    api: Arc<ApiClient>,
    config: EngineConfig,
}

/// Builder for [`PveClient`] configuration.
#[derive(Debug, Default)]
pub struct PveClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    realm: Option<String>,
    secure: bool,
    accept_invalid_certs: bool,
    config: Option<EngineConfig>,
}

impl PveClientBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        realm: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self.realm = Some(realm.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Overrides the default engine configuration.
    pub fn engine_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> PveResult<PveClient> {
        let host = self
            .host
            .ok_or_else(|| PveError::Connection("Host is required".to_string()))?;
        let username = self
            .username
            .ok_or_else(|| PveError::Connection("Credentials are required".to_string()))?;
        let password = self
            .password
            .ok_or_else(|| PveError::Connection("Credentials are required".to_string()))?;
        let realm = self
            .realm
            .ok_or_else(|| PveError::Connection("Credentials are required".to_string()))?;

        let connection = Connection::new(
            host,
            self.port.unwrap_or(8006),
            username,
            password,
            realm,
            self.secure,
            self.accept_invalid_certs,
        )?;

        let config = self.config.unwrap_or_default();
        let api = Arc::new(ApiClient::new(connection, &config)?);
        Ok(PveClient { api, config })
    }
}

impl PveClient {
    /// Creates a new builder for client configuration.
    pub fn builder() -> PveClientBuilder {
        PveClientBuilder::default()
    }

    /// Authenticates with the cluster.
    ///
    /// Calling this up front is optional: the first request triggers a
    /// login automatically. It exists so callers can fail fast on bad
    /// credentials before resolving targets.
    ///
    /// # Errors
    /// Returns `PveError::Authentication` on invalid credentials and
    /// `PveError::Connection` if the endpoint is unreachable.
    pub async fn login(&self) -> PveResult<()> {
        let service = auth::application::service::login_service::LoginService::new();
        let auth = service.execute(self.api.connection()).await?;
        self.api.set_auth(auth).await;
        Ok(())
    }

    /// Returns `true` if the client holds a ticket.
    pub async fn is_authenticated(&self) -> bool {
        self.api.is_authenticated().await
    }

    /// Direct access to the underlying API client.
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Runs one batch command to completion.
    ///
    /// See [`BatchEngine::run`] for error semantics. The returned report
    /// lists every resolved target in resolution order together with the
    /// overall [`ExitStatus`] mapping.
    pub async fn run_batch<P: ConfirmPrompt + ?Sized>(
        &self,
        spec: &TargetSpec,
        operation: &Operation,
        prompt: &P,
        options: &BatchOptions,
    ) -> PveResult<BatchReport> {
        self.engine(CancellationToken::new())
            .run(spec, operation, prompt, options)
            .await
    }

    /// Like [`run_batch`](Self::run_batch), with an external cancellation
    /// token (typically wired to Ctrl-C by the CLI layer).
    pub async fn run_batch_with_cancel<P: ConfirmPrompt + ?Sized>(
        &self,
        spec: &TargetSpec,
        operation: &Operation,
        prompt: &P,
        options: &BatchOptions,
        cancel: CancellationToken,
    ) -> PveResult<BatchReport> {
        self.engine(cancel).run(spec, operation, prompt, options).await
    }

    fn engine(&self, cancel: CancellationToken) -> BatchEngine<ApiClient> {
        BatchEngine::new(Arc::clone(&self.api), self.config.clone()).with_cancellation(cancel)
    }
}
