use crate::error::{SttError, SttResult};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Exchanges a long-lived API key for a short-lived bearer token
#[async_trait::async_trait]
pub trait TokenAuthority: Send + Sync {
    async fn fetch_token(&self, apikey: &str) -> SttResult<String>;
}

/// IAM token endpoint client
pub struct IamTokenAuthority {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
}

impl IamTokenAuthority {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl TokenAuthority for IamTokenAuthority {
    async fn fetch_token(&self, apikey: &str) -> SttResult<String> {
        debug!("Requesting token from {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
                ("apikey", apikey),
            ])
            .send()
            .await
            .map_err(|e| SttError::Token(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SttError::Token(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let body: IamTokenResponse = response
            .json()
            .await
            .map_err(|e| SttError::Token(format!("invalid token response: {}", e)))?;

        Ok(body.access_token)
    }
}

/// A bearer token and when it was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub issued_at: Instant,
}

impl Token {
    pub fn is_expired(&self, validity: Duration) -> bool {
        self.issued_at.elapsed() >= validity
    }
}

/// Caches the session's token and serializes refreshes.
///
/// The cache lock is held across the fetch, so a concurrent caller waits for
/// the in-flight refresh and then reuses its result.
pub struct TokenManager {
    authority: Arc<dyn TokenAuthority>,
    apikey: String,
    validity: Duration,
    cached: Mutex<Option<Token>>,
}

impl TokenManager {
    pub fn new(authority: Arc<dyn TokenAuthority>, apikey: String, validity: Duration) -> Self {
        Self {
            authority,
            apikey,
            validity,
            cached: Mutex::new(None),
        }
    }

    /// Current token, refreshed if missing or past its validity window
    pub async fn token(&self) -> SttResult<Token> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired(self.validity) {
                return Ok(token.clone());
            }
            info!("Token expired, refreshing");
        }

        let value = self.authority.fetch_token(&self.apikey).await.map_err(|e| {
            warn!("Token refresh failed: {}", e);
            e
        })?;

        let token = Token {
            value,
            issued_at: Instant::now(),
        };
        *cached = Some(token.clone());
        debug!("Token refreshed");

        Ok(token)
    }

    /// Force a refresh on the next `token()` call
    pub async fn invalidate(&self) {
        let mut cached = self.cached.lock().await;
        if cached.take().is_some() {
            info!("Token invalidated");
        }
    }
}
