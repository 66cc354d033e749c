use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap},
};

use crate::{
    auth::application::{
        request::login_request::LoginRequest, response::login_response::LoginResponse,
    },
    core::domain::{
        error::{PveError, PveResult},
        model::{
            auth::{Auth, CsrfToken, Ticket},
            connection::Connection,
        },
    },
};

/// Performs the `POST /access/ticket` exchange against a cluster endpoint.
pub struct LoginService {
    default_headers: HeaderMap,
}

impl LoginService {
    pub fn new() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        default_headers.insert(ACCEPT, "application/json".parse().unwrap());

        Self { default_headers }
    }

    /// Exchanges the connection's credentials for a ticket and CSRF token.
    ///
    /// # Errors
    /// Returns `PveError::Authentication` on invalid credentials and
    /// `PveError::Connection` for transport or endpoint problems.
    pub async fn execute(&self, connection: &Connection) -> PveResult<Auth> {
        let http_client = Client::builder()
            .danger_accept_invalid_certs(connection.accept_invalid_certs())
            .build()
            .map_err(|e| PveError::Connection(e.to_string()))?;

        let base = connection.url().as_str().trim_end_matches('/');
        let url = format!("{}/api2/json/access/ticket", base);
        let request = LoginRequest {
            username: connection.username().to_string(),
            password: connection.password().to_string(),
            realm: connection.realm().to_string(),
        };

        let response = http_client
            .post(&url)
            .headers(self.default_headers.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| PveError::Connection(e.to_string()))?;

        match response.status() {
            StatusCode::OK => self.handle_successful_login(response).await,
            StatusCode::UNAUTHORIZED => Err(PveError::Authentication(
                "Invalid credentials provided".to_string(),
            )),
            StatusCode::NOT_FOUND => {
                Err(PveError::Connection("Login endpoint not found".to_string()))
            }
            StatusCode::SERVICE_UNAVAILABLE => Err(PveError::Connection(
                "Proxmox service is currently unavailable".to_string(),
            )),
            status => Err(PveError::Connection(format!(
                "Unexpected response status: {}",
                status
            ))),
        }
    }

    async fn handle_successful_login(&self, response: reqwest::Response) -> PveResult<Auth> {
        let login_response = response
            .json::<LoginResponse>()
            .await
            .map_err(|e| PveError::Connection(format!("Failed to parse login response: {}", e)))?;

        Ok(Auth::new(
            Ticket::new(login_response.data.ticket),
            CsrfToken::new(login_response.data.csrf_token),
        ))
    }
}

impl Default for LoginService {
    fn default() -> Self {
        Self::new()
    }
}
