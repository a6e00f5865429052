//! DomRobot JSON-RPC over HTTP

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};

use crate::error::{ProviderError, Result};
use crate::http_client::{HttpUtils, create_http_client};
use crate::providers::PROVIDER_ID;
use crate::traits::{RpcChannel, RpcConnector};
use crate::utils::log_sanitizer::{redact_params, truncate_for_log};

use super::types::ResponseEnvelope;

/// Opens HTTP channels against one endpoint.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    endpoint: String,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl HttpConnector {
    pub fn new(endpoint: impl Into<String>, connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout,
            request_timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RpcConnector for HttpConnector {
    fn connect(&self) -> Result<Box<dyn RpcChannel>> {
        let client = create_http_client(self.connect_timeout, self.request_timeout, PROVIDER_ID)?;
        Ok(Box::new(DomrobotClient {
            client,
            endpoint: self.endpoint.clone(),
        }))
    }
}

/// One HTTP client, one cookie jar, one DomRobot session.
struct DomrobotClient {
    client: Client,
    endpoint: String,
}

#[async_trait]
impl RpcChannel for DomrobotClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        log::debug!("[{PROVIDER_ID}] {method} params: {}", redact_params(&params));

        let body = json!({ "method": method, "params": params });
        let payload = serde_json::to_string(&body).map_err(|e| ProviderError::SerializationError {
            provider: PROVIDER_ID.to_string(),
            detail: e.to_string(),
        })?;

        let request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(payload);

        let (status, response_text) =
            HttpUtils::execute_request(request, PROVIDER_ID, "POST", method).await?;

        // 网关错误页（502/503 等）不是 JSON，按网络错误处理
        let envelope: ResponseEnvelope = match HttpUtils::parse_json(&response_text, PROVIDER_ID) {
            Ok(envelope) => envelope,
            Err(_) if !(200..300).contains(&status) => {
                return Err(ProviderError::NetworkError {
                    provider: PROVIDER_ID.to_string(),
                    detail: format!("HTTP {status}: {}", truncate_for_log(&response_text)),
                });
            }
            Err(e) => return Err(e),
        };

        envelope.into_result(method)
    }
}
