//! OAuth2 client-credentials token cache.

use crate::config::CtpConfig;
use catsync_sync::{CatalogError, CatalogResult};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    /// `None` when the server did not say; such a token is kept until
    /// rejected.
    refresh_at: Option<Instant>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.refresh_at.is_none_or(|at| Instant::now() < at)
    }
}

pub(crate) struct TokenCache {
    token: RwLock<Option<AccessToken>>,
}

impl TokenCache {
    pub(crate) fn new() -> Self {
        Self {
            token: RwLock::new(None),
        }
    }

    /// A valid access token, fetching a new one when the cached one is
    /// missing or about to expire.
    pub(crate) async fn access_token(&self, http: &Client, config: &CtpConfig) -> CatalogResult<String> {
        if let Some(token) = self.token.read().await.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let mut slot = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = fetch_token(http, config).await?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    /// Drops the cached token so the next request authenticates again.
    pub(crate) async fn invalidate(&self) {
        *self.token.write().await = None;
    }
}

async fn fetch_token(http: &Client, config: &CtpConfig) -> CatalogResult<AccessToken> {
    debug!("Requesting access token for project '{}'", config.project_key);

    let response = http
        .post(format!("{}/oauth/token", config.auth_base()))
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(&[
            ("grant_type", "client_credentials".to_string()),
            ("scope", config.scope()),
        ])
        .send()
        .await
        .map_err(|e| CatalogError::Transient(format!("token request failed: {e}")))?;

    let status = response.status();
    if status.is_server_error() {
        return Err(CatalogError::Transient(format!(
            "token request failed with status {status}"
        )));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CatalogError::Auth(format!(
            "token request rejected ({status}): {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| CatalogError::Auth(format!("failed to parse token response: {e}")))?;

    let refresh_at = token
        .expires_in
        .map(|secs| Instant::now() + Duration::from_secs(secs).saturating_sub(EXPIRY_MARGIN));

    Ok(AccessToken {
        value: token.access_token,
        refresh_at,
    })
}
