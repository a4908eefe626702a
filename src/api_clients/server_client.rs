use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, error};
use reqwest::{Client, header};
use std::time::Duration;

use super::client_trait::{ByteStream, GenerationTransport};
use super::error_handling;
use crate::config::ClientConfig;
use crate::constants::{EXECUTE_PATH, GENERATE_PATH, HISTORY_PATH, USER_STATUS_PATH};
use crate::error::{AppError, AppResult};
use crate::models::{
    ExecuteRequest, GenerateRequest, RemoteHistoryItem, TestExecutionResult, UserStatus,
};

/// HTTP transport to the TestGen server. Credentials travel as a bearer
/// header on every request.
pub struct ServerApiClient {
    http_client: Client,
    server_url: String,
}

impl ServerApiClient {
    pub fn new(config: &ClientConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::HttpError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            server_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> AppResult<T> {
        let url = self.endpoint(path);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", url, e);
                AppError::HttpError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error text".to_string());
            return Err(error_handling::map_server_error(status.as_u16(), &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::SerdeError(format!("Failed to parse response from {}: {}", url, e)))
    }
}

#[async_trait]
impl GenerationTransport for ServerApiClient {
    async fn submit_generation(
        &self,
        request: &GenerateRequest,
        access_token: &str,
    ) -> AppResult<ByteStream> {
        let url = self.endpoint(GENERATE_PATH);
        debug!(
            "Submitting generation request to {} ({} bytes of {} input)",
            url,
            request.input_code.len(),
            request.language
        );

        let response = self
            .http_client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send generation request to {}: {}", url, e);
                AppError::HttpError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error text".to_string());
            return Err(error_handling::map_server_error(status.as_u16(), &body));
        }

        // The server answers a pre-flight rejection with 200 + JSON instead
        // of an event stream, so the content type decides how to proceed
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        if content_type.starts_with("application/json") {
            let body = response
                .text()
                .await
                .map_err(|e| AppError::HttpError(e.to_string()))?;
            return Err(error_handling::map_inband_error(&body));
        }

        let stream = response
            .bytes_stream()
            .map(|fragment| fragment.map_err(|e| AppError::HttpError(e.to_string())));
        Ok(Box::pin(stream))
    }

    async fn fetch_history(&self, access_token: &str) -> AppResult<Vec<RemoteHistoryItem>> {
        self.get_json(HISTORY_PATH, access_token).await
    }

    async fn fetch_user_status(&self, access_token: &str) -> AppResult<UserStatus> {
        self.get_json(USER_STATUS_PATH, access_token).await
    }

    async fn execute_test(
        &self,
        request: &ExecuteRequest,
        access_token: &str,
    ) -> AppResult<TestExecutionResult> {
        let url = self.endpoint(EXECUTE_PATH);
        let response = self
            .http_client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send execution request to {}: {}", url, e);
                AppError::HttpError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error text".to_string());
            return Err(error_handling::map_server_error(status.as_u16(), &body));
        }

        response
            .json::<TestExecutionResult>()
            .await
            .map_err(|e| AppError::SerdeError(format!("Failed to parse execution result: {}", e)))
    }
}
