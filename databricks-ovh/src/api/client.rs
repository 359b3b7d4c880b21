use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::common::ApiErrorResponse;
use super::endpoint::{resolve_endpoint, sign};
use super::error::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OVH application credentials used to sign every request
#[derive(Clone)]
pub struct Credentials {
    pub application_key: String,
    pub application_secret: String,
    pub consumer_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("application_key", &self.application_key)
            .finish_non_exhaustive()
    }
}

/// OVH API client
///
/// Cheap to clone; clones share the HTTP connection pool and credentials.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl Client {
    /// `endpoint` is an alias such as `ovh-eu` or a full base URL
    pub fn new(endpoint: &str, credentials: Credentials) -> Result<Self, ApiError> {
        let base_url = resolve_endpoint(endpoint)?;
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                credentials,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::GET, path, None::<&()>).await
    }

    /// Execute a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::POST, path, Some(body)).await
    }

    /// Execute a PUT request
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    /// Execute a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::DELETE, path, None::<&()>).await
    }

    async fn execute<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        let body = match body {
            Some(body) => serde_json::to_string(body)
                .map_err(|e| ApiError::ParseError(format!("Failed to encode body: {}", e)))?,
            None => String::new(),
        };

        let timestamp = chrono::Utc::now().timestamp();
        let credentials = &self.inner.credentials;
        let signature = sign(
            &credentials.application_secret,
            &credentials.consumer_key,
            method.as_str(),
            &url,
            &body,
            timestamp,
        );

        tracing::debug!("{} request to: {}", method, url);

        let mut request = self
            .inner
            .http_client
            .request(method, &url)
            .header("X-Ovh-Application", &credentials.application_key)
            .header("X-Ovh-Consumer", &credentials.consumer_key)
            .header("X-Ovh-Timestamp", timestamp.to_string())
            .header("X-Ovh-Signature", signature);

        if !body.is_empty() {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if status.is_success() {
            return self.parse_success_response(response).await;
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::AuthError),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            _ => self.handle_error_response(response).await,
        }
    }

    /// Parse successful response; an empty body reads as JSON `null`
    async fn parse_success_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str::<T>(text).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::ParseError(format!("Failed to parse response: {}", e))
        })
    }

    /// Handle error response
    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::error!("API error response: {}", text);

        let message = serde_json::from_str::<ApiErrorResponse>(&text)
            .ok()
            .and_then(|err| err.message)
            .unwrap_or(text);

        Err(ApiError::ApiError { status, message })
    }
}
