//! HTTP implementation of [`TodoBackend`].

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::providers::TodoBackend;
use crate::types::{Session, Todo, TodoFilter, TodoId};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use std::future::Future;

/// Error body returned by the backend on non-2xx responses
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// `reqwest`-based backend client
///
/// Authenticated requests carry the token in the `Authorization` header. By
/// default the header is the bare token; [`HttpBackend::with_auth_scheme`]
/// prefixes it (for example `Bearer <token>`).
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    auth_scheme: Option<String>,
}

impl HttpBackend {
    /// Create a client for the backend at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_scheme: None,
        }
    }

    /// Create a client from configuration
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        let backend = Self::new(config.api_url.clone());
        match &config.auth_scheme {
            Some(scheme) => backend.with_auth_scheme(scheme.clone()),
            None => backend,
        }
    }

    /// Prefix the token with an authorization scheme
    #[must_use]
    pub fn with_auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = Some(scheme.into());
        self
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        let value = match &self.auth_scheme {
            Some(scheme) => format!("{scheme} {token}"),
            None => token.to_string(),
        };
        request.header(reqwest::header::AUTHORIZATION, value)
    }

    /// Send a request and decode a JSON body
    async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send a request whose body is ignored
    async fn execute_empty(request: RequestBuilder) -> Result<(), ApiError> {
        Self::send(request).await.map(|_| ())
    }

    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty());

        tracing::debug!(status = status.as_u16(), ?message, "Backend rejected request");

        Err(match status {
            StatusCode::CONFLICT => ApiError::Conflict { message },
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { message },
            status => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }
}

impl TodoBackend for HttpBackend {
    fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send {
        let request = self
            .client
            .post(self.url("/user/create"))
            .json(&json!({ "name": name, "email": email, "password": password }));
        Self::execute(request)
    }

    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send {
        let request = self
            .client
            .post(self.url("/user/login"))
            .json(&json!({ "email": email, "password": password }));
        Self::execute(request)
    }

    fn logout(&self, token: &str) -> impl Future<Output = Result<(), ApiError>> + Send {
        let request = self.authorized(self.client.post(self.url("/user/logout")), token);
        Self::execute_empty(request.json(&json!({})))
    }

    fn fetch_todos(
        &self,
        token: &str,
        filter: TodoFilter,
    ) -> impl Future<Output = Result<Vec<Todo>, ApiError>> + Send {
        let request = self.authorized(self.client.get(self.url(filter.path())), token);
        Self::execute(request)
    }

    fn fetch_todo(
        &self,
        token: &str,
        id: &TodoId,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send {
        let request = self.authorized(self.client.get(self.url(&format!("/todo/get/{id}"))), token);
        Self::execute(request)
    }

    fn create_todo(
        &self,
        token: &str,
        name: &str,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send {
        let request = self
            .authorized(self.client.post(self.url("/todo/create")), token)
            .json(&json!({ "name": name }));
        Self::execute(request)
    }

    fn toggle_todo(
        &self,
        token: &str,
        id: &TodoId,
        is_completed: bool,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send {
        let request = self
            .authorized(self.client.put(self.url(&format!("/todo/toggle/{id}"))), token)
            .json(&json!({ "isCompleted": is_completed }));
        Self::execute(request)
    }

    fn update_todo(
        &self,
        token: &str,
        id: &TodoId,
        name: &str,
        is_completed: bool,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send {
        let request = self
            .authorized(self.client.patch(self.url(&format!("/todo/update/{id}"))), token)
            .json(&json!({ "name": name, "isCompleted": is_completed }));
        Self::execute(request)
    }

    fn delete_todo(
        &self,
        token: &str,
        id: &TodoId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        let request =
            self.authorized(self.client.delete(self.url(&format!("/todo/delete/{id}"))), token);
        Self::execute_empty(request)
    }
}
