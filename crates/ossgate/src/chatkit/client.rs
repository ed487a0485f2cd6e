//! HTTP client for the ChatKit endpoint

use bytes::Bytes;
use futures::stream::Stream;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::{GatewayError, Result};
use crate::proxy::{ProxyError, RequestOptions};

use super::request::{ThreadRequest, request_headers};

/// Connection to the upstream ChatKit API, shared by all requests
#[derive(Debug, Clone)]
pub struct ChatKitClient {
    client: reqwest::Client,
    url: String,
    base_headers: HeaderMap,
}

impl ChatKitClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Upstream(format!("Failed to create HTTP client: {e}")))?;

        let mut base_headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| GatewayError::Config(format!("Invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                GatewayError::Config(format!("Invalid value for header '{name}': {e}"))
            })?;
            base_headers.insert(name, value);
        }

        Ok(Self {
            client,
            url: config.url.clone(),
            base_headers,
        })
    }

    /// Send one user turn upstream and return the response body as a frame stream.
    ///
    /// Only connect-time failures are reported; problems while reading the
    /// body surface later as stream errors.
    pub async fn open(
        &self,
        model: &str,
        text: String,
        options: &RequestOptions,
    ) -> std::result::Result<UpstreamBody, ProxyError> {
        let mut headers = self.base_headers.clone();
        for (name, value) in request_headers(model, options) {
            let value = HeaderValue::from_str(&value)
                .map_err(|e| ProxyError::Internal(format!("Invalid {name} header value: {e}")))?;
            headers.insert(name, value);
        }

        let body = ThreadRequest::new(text, options.thread_id.clone());
        tracing::debug!(op = body.op, model, "Opening upstream ChatKit stream");

        let response = self
            .client
            .post(&self.url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProxyError::Network(format!("Request timed out: {e}"))
                } else if e.is_connect() {
                    ProxyError::Network(format!("Failed to connect to upstream: {e}"))
                } else {
                    ProxyError::Network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
            });
        }

        Ok(UpstreamBody { response })
    }
}

/// An open upstream response whose body has not been read yet
#[derive(Debug)]
pub struct UpstreamBody {
    response: reqwest::Response,
}

impl UpstreamBody {
    /// Raw body frames in arrival order. Dropping the stream closes the connection.
    pub fn frames(self) -> impl Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send {
        self.response.bytes_stream()
    }
}
