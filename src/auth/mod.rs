//! Periodic OAuth token refresh against the seller identity endpoint.
//!
//! The refresh job runs once at startup and then on a fixed 40 minute
//! schedule. A failed exchange is never fatal: the previous token stays in
//! the store and consumers keep using it until the next attempt succeeds.

use std::time::Duration;

use reqwest::Client;
use tracing::{error, info};

use crate::config::AuthConfig;
use crate::credentials::CredentialStore;
use crate::error::Error;
use crate::models::TokenResponse;

const TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";

/// Deadline for a single refresh attempt so a hung identity endpoint cannot
/// pin the scheduled job until process exit
const REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct TokenRefresher {
    client: Client,
    token_url: String,
    config: AuthConfig,
    store: CredentialStore,
}

impl TokenRefresher {
    pub fn new(config: AuthConfig, store: CredentialStore) -> Self {
        Self::with_url(config, store, TOKEN_URL.to_string())
    }

    /// Creates a refresher against a custom identity endpoint.
    pub fn with_url(config: AuthConfig, store: CredentialStore, token_url: String) -> Self {
        let client = Client::builder()
            .timeout(REFRESH_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            token_url,
            config,
            store,
        }
    }

    /// Exchanges the refresh credential for a fresh access token.
    ///
    /// Failures are logged and swallowed; consumers keep the prior token
    /// until the next scheduled attempt.
    pub async fn refresh(&self) {
        match self.try_refresh().await {
            Ok(()) => info!("Seller API token refreshed"),
            Err(e) => error!("Token refresh failed, keeping previous token: {e}"),
        }
    }

    async fn try_refresh(&self) -> Result<(), Error> {
        let params = [
            ("grant_type", self.config.grant_type.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", self.config.refresh_token.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&text)?;
        self.store.replace(token.access_token).await;
        Ok(())
    }
}

impl Clone for TokenRefresher {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            token_url: self.token_url.clone(),
            config: self.config.clone(),
            store: self.store.clone(),
        }
    }
}
