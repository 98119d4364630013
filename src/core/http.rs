//! Shared HTTP plumbing for the completion provider.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::error::LlmError;

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Applied to the blocking completion request only. Streaming requests run
    /// until the server closes the body.
    pub timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

/// A fully-read response: status plus raw body text.
#[derive(Debug)]
pub struct RawResponse {
    pub status: reqwest::StatusCode,
    pub body: String,
}

/// Thin wrapper over `reqwest::Client`. No retries: each call is exactly one
/// outbound request.
pub struct HttpClient {
    client: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig, user_agent: Option<&str>) -> Result<Self, LlmError> {
        let default_ua = format!("chatbox/{}", env!("CARGO_PKG_VERSION"));
        let ua = user_agent.unwrap_or(&default_ua);

        // No client-wide timeout; it would also cut off long streams.
        let client = reqwest::Client::builder()
            .user_agent(ua)
            .build()
            .map_err(|e| {
                LlmError::ProviderConfiguration(format!("Failed to build reqwest client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    fn request<Req: Serialize>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Req,
    ) -> reqwest::RequestBuilder {
        let mut req_builder = self.client.post(url).json(body);
        for (name, value) in headers {
            req_builder = req_builder.header(name, value);
        }
        req_builder
    }

    /// POST a JSON body and read the whole response as text, whatever the status.
    #[tracing::instrument(name = "http_post_json", skip(self, headers, body), fields(url = %url), err)]
    pub async fn post_json<Req: Serialize>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Req,
    ) -> Result<RawResponse, LlmError> {
        let res = self
            .request(url, headers, body)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| LlmError::network("No response from provider", e))?;

        let status = res.status();
        debug!(status = %status, "HTTP response received");

        let body = res
            .text()
            .await
            .map_err(|e| LlmError::network("Failed to read response body", e))?;

        Ok(RawResponse { status, body })
    }

    /// POST a JSON body and hand back the open response so the caller can
    /// consume the body incrementally.
    #[tracing::instrument(name = "http_post_stream", skip(self, headers, body), fields(url = %url), err)]
    pub async fn post_stream<Req: Serialize>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Req,
    ) -> Result<reqwest::Response, LlmError> {
        let res = self
            .request(url, headers, body)
            .send()
            .await
            .map_err(|e| LlmError::network("Streaming request failed", e))?;

        debug!(status = %res.status(), "Streaming response opened");
        Ok(res)
    }
}
