//! Optional remote scoring and pricing service.
//!
//! When configured, the service is asked first; any failure (transport,
//! non-2xx status, undecodable body, timeout) becomes a `DependencyError`
//! and the caller serves a fallback instead.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{MatchRequest, PredictionRequest, PriceRequest};
use crate::config::ExternalServiceConfig;
use crate::error::DependencyError;
use crate::matching::MatchResult;
use crate::prediction::PredictionResult;
use crate::pricing::PricingResult;

#[async_trait]
pub trait ExternalIntelligence: Send + Sync {
    async fn score(&self, request: &MatchRequest) -> Result<Vec<MatchResult>, DependencyError>;
    async fn price(&self, request: &PriceRequest) -> Result<PricingResult, DependencyError>;
    async fn predict(&self, request: &PredictionRequest)
    -> Result<PredictionResult, DependencyError>;
}

/// JSON-over-HTTP client: `POST {base}/match`, `/price`, `/predict-success`.
pub struct HttpExternalIntelligence {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpExternalIntelligence {
    pub fn new(config: &ExternalServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        }
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, DependencyError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let call = async {
            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| DependencyError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(DependencyError::Status(status.as_u16()));
            }

            response
                .json::<Resp>()
                .await
                .map_err(|e| DependencyError::Decode(e.to_string()))
        };

        let result = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| DependencyError::Timeout(self.timeout.as_millis() as u64))?;
        debug!(%url, ok = result.is_ok(), "external intelligence call finished");
        result
    }
}

#[async_trait]
impl ExternalIntelligence for HttpExternalIntelligence {
    async fn score(&self, request: &MatchRequest) -> Result<Vec<MatchResult>, DependencyError> {
        self.post("match", request).await
    }

    async fn price(&self, request: &PriceRequest) -> Result<PricingResult, DependencyError> {
        self.post("price", request).await
    }

    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, DependencyError> {
        self.post("predict-success", request).await
    }
}
