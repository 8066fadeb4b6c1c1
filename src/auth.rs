//! OAuth 2.0 user tokens for X.
//!
//! X access tokens last about two hours and every refresh rotates the refresh
//! token, so the current pair lives in a token file that each run reads,
//! refreshes when needed, and writes back before posting.

use chrono::{DateTime, Utc};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{load_json_file, save_json_file, LoadOutcome};
use crate::errors::{AppError, AppResult};

pub const CLIENT_ID_VAR: &str = "X_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "X_CLIENT_SECRET";
pub const REFRESH_TOKEN_VAR: &str = "X_REFRESH_TOKEN";

pub const X_AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";
pub const X_TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";

/// Refresh when fewer than this many minutes of validity remain
const EXPIRY_MARGIN_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    /// Only confidential clients have one
    pub client_secret: Option<String>,
    /// Seeds the token file on the first run
    pub refresh_token: Option<String>,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn load_credentials() -> AppResult<OAuthCredentials> {
    let client_id =
        env_var(CLIENT_ID_VAR).ok_or_else(|| AppError::missing_credentials(CLIENT_ID_VAR))?;

    Ok(OAuthCredentials {
        client_id,
        client_secret: env_var(CLIENT_SECRET_VAR),
        refresh_token: env_var(REFRESH_TOKEN_VAR),
    })
}

/// Contents of the token file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// A token without a known expiry is never treated as fresh
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| at - chrono::Duration::minutes(EXPIRY_MARGIN_MINUTES) > now)
    }
}

pub struct TokenManager {
    oauth: BasicClient,
    seed_refresh_token: Option<String>,
    token_file: PathBuf,
}

impl TokenManager {
    pub fn new(credentials: OAuthCredentials, token_file: &Path) -> AppResult<Self> {
        Self::with_token_url(credentials, token_file, X_TOKEN_URL)
    }

    pub fn with_token_url(
        credentials: OAuthCredentials,
        token_file: &Path,
        token_url: &str,
    ) -> AppResult<Self> {
        let auth_url = AuthUrl::new(X_AUTHORIZE_URL.to_string())
            .map_err(|e| AppError::Config(format!("Invalid authorize URL: {}", e)))?;
        let token_url = TokenUrl::new(token_url.to_string())
            .map_err(|e| AppError::Config(format!("Invalid token URL: {}", e)))?;

        let oauth = BasicClient::new(
            ClientId::new(credentials.client_id),
            credentials.client_secret.map(ClientSecret::new),
            auth_url,
            Some(token_url),
        );

        Ok(Self {
            oauth,
            seed_refresh_token: credentials.refresh_token,
            token_file: token_file.to_path_buf(),
        })
    }

    /// Returns an access token valid for this run, refreshing it and saving
    /// the rotated pair when the stored one is close to expiry.
    pub async fn access_token(&self) -> AppResult<String> {
        let stored = match load_json_file::<StoredToken>(&self.token_file) {
            LoadOutcome::Found(token) => Some(token),
            LoadOutcome::NotFound => None,
            LoadOutcome::ParseError(e) => {
                log::warn!(
                    "Ignoring unreadable token file {}: {}",
                    self.token_file.display(),
                    e
                );
                None
            }
        };

        if let Some(token) = &stored {
            if token.is_fresh(Utc::now()) {
                log::info!("Using stored access token");
                return Ok(token.access_token.clone());
            }
        }

        let refresh_token = stored
            .map(|token| token.refresh_token)
            .or_else(|| self.seed_refresh_token.clone())
            .ok_or_else(|| AppError::missing_credentials(REFRESH_TOKEN_VAR))?;

        let token = self.refresh(&refresh_token).await?;

        // The old refresh token is now revoked; losing the new one locks the bot out
        save_json_file(&self.token_file, &token)?;
        log::info!(
            "Refreshed access token, saved to {}",
            self.token_file.display()
        );

        Ok(token.access_token)
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<StoredToken> {
        let response = self
            .oauth
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(response) => AppError::Auth(response.to_string()),
                other => AppError::Auth(other.to_string()),
            })?;

        let expires_at = response
            .expires_in()
            .and_then(|lifetime| chrono::Duration::from_std(lifetime).ok())
            .map(|lifetime| Utc::now() + lifetime);

        Ok(StoredToken {
            access_token: response.access_token().secret().clone(),
            refresh_token: response
                .refresh_token()
                .map(|token| token.secret().clone())
                .unwrap_or_else(|| refresh_token.to_string()),
            expires_at,
        })
    }
}
