//! Network boundary for submissions.

use async_trait::async_trait;
use reqwest::Url;

use crate::error::SubmitResult;
use crate::payload::FormPayload;

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Status in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one POST per call. Never retries on its own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, destination: &Url, payload: &FormPayload)
    -> SubmitResult<TransportResponse>;
}

/// Multipart POST over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        destination: &Url,
        payload: &FormPayload,
    ) -> SubmitResult<TransportResponse> {
        let response = self
            .client
            .post(destination.clone())
            .multipart(payload.to_multipart())
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(TransportResponse { status, body })
    }
}
