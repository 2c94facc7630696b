//! Client-credentials token exchange and broadcaster lookup.

use serde::Deserialize;

use super::error::SupplierError;
use super::http;
use crate::config::TwitchConfig;

/// Short-lived app access token plus the client id it was issued for.
#[derive(Debug, Clone)]
pub struct AppToken {
    client_id: String,
    access_token: String,
}

impl AppToken {
    /// Headers required by every Helix request.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Client-ID".to_string(), self.client_id.clone()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.access_token),
            ),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    data: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    id: String,
}

/// Exchanges the configured client id/secret for an app access token.
pub fn exchange_token(cfg: &TwitchConfig) -> Result<AppToken, SupplierError> {
    if cfg.client_id.is_empty() || cfg.client_secret.is_empty() {
        return Err(SupplierError::Auth(
            "twitch.client_id and twitch.client_secret must be set".to_string(),
        ));
    }
    let resp = http::post_form(
        &cfg.token_url,
        &[
            ("client_id", cfg.client_id.as_str()),
            ("client_secret", cfg.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ],
    )
    .map_err(|e| SupplierError::Auth(format!("{:#}", e)))?;
    if !resp.is_success() {
        return Err(SupplierError::Auth(format!(
            "token endpoint returned HTTP {}: {}",
            resp.status,
            resp.body_text()
        )));
    }
    let access_token = parse_token(&resp.body)?;
    tracing::debug!("obtained app access token");
    Ok(AppToken {
        client_id: cfg.client_id.clone(),
        access_token,
    })
}

fn parse_token(body: &[u8]) -> Result<String, SupplierError> {
    let parsed: TokenResponse = serde_json::from_slice(body)
        .map_err(|e| SupplierError::Auth(format!("token response: {}", e)))?;
    parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SupplierError::Auth("token response has no access_token".to_string()))
}

/// Resolves a channel login to its broadcaster id.
pub fn lookup_broadcaster_id(
    cfg: &TwitchConfig,
    token: &AppToken,
    login: &str,
) -> Result<String, SupplierError> {
    let url = url::Url::parse_with_params(&format!("{}/users", cfg.api_base), &[("login", login)])
        .map_err(|e| SupplierError::Auth(format!("users URL: {}", e)))?;
    let resp = http::get(url.as_str(), &token.headers())
        .map_err(|e| SupplierError::Auth(format!("{:#}", e)))?;
    if !resp.is_success() {
        return Err(SupplierError::Auth(format!(
            "user lookup returned HTTP {}",
            resp.status
        )));
    }
    parse_user_id(&resp.body, login)
}

fn parse_user_id(body: &[u8], login: &str) -> Result<String, SupplierError> {
    let parsed: UsersResponse = serde_json::from_slice(body)
        .map_err(|e| SupplierError::Auth(format!("users response: {}", e)))?;
    parsed
        .data
        .into_iter()
        .next()
        .map(|u| u.id)
        .ok_or_else(|| SupplierError::Auth(format!("unknown channel: {}", login)))
}
