use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::{
    models::GameMode,
    routes::{
        leaderboard::LeaderboardResponse,
        session::{
            ClaimRequest, ClaimResponse, GuessRequest, GuessResponse, InitRequest, InitResponse,
            ResumeRequest, ResumeResponse,
        },
    },
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl ClientError {
    /// HTTP status for server-side rejections
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }

    /// Text suitable for an error toast
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Status { status, .. } => format!("The server rejected the request ({})", status),
            ClientError::Transport(_) => "Could not reach the server. Please try again.".to_string(),
        }
    }
}

/// The game endpoints as seen from a client
#[async_trait]
pub trait GameApi: Send + Sync {
    async fn init(&self, mode: GameMode, clear_token: Option<Uuid>) -> Result<InitResponse, ClientError>;
    async fn resume(&self, token: Uuid) -> Result<ResumeResponse, ClientError>;
    async fn guess(&self, request: &GuessRequest) -> Result<GuessResponse, ClientError>;
    async fn leaderboard(&self, mode: GameMode) -> Result<LeaderboardResponse, ClientError>;
    async fn claim(&self, token: Uuid, name: &str) -> Result<ClaimResponse, ClientError>;
}

/// `GameApi` over HTTP
pub struct HttpGameApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGameApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or(text);

        tracing::warn!("Game API request failed: {} - {}", status, message);
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn init(&self, mode: GameMode, clear_token: Option<Uuid>) -> Result<InitResponse, ClientError> {
        let body = InitRequest {
            clear_token: clear_token.map(|t| t.to_string()),
        };
        self.post(&format!("/api/init/{}", mode), &body).await
    }

    async fn resume(&self, token: Uuid) -> Result<ResumeResponse, ClientError> {
        self.post("/api/resume", &ResumeRequest { token }).await
    }

    async fn guess(&self, request: &GuessRequest) -> Result<GuessResponse, ClientError> {
        self.post("/api/guess", request).await
    }

    async fn leaderboard(&self, mode: GameMode) -> Result<LeaderboardResponse, ClientError> {
        self.get(&format!("/api/leaderboard/{}", mode)).await
    }

    async fn claim(&self, token: Uuid, name: &str) -> Result<ClaimResponse, ClientError> {
        let body = ClaimRequest {
            token,
            name: name.to_string(),
        };
        self.post("/api/claim", &body).await
    }
}
