//! Google sign-in via the OAuth 2.0 authorization-code flow.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::session::UserProfile;

pub const PROVIDER: &str = "google";
const SCOPES: &str = "openid email profile";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("identity provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("identity provider returned no email")]
    MissingEmail,

    #[error("sign-in was cancelled: {0}")]
    Denied(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to sign in.
    fn authorize_url(&self, state: &str) -> Result<String, AuthError>;

    /// Trades an authorization code for the signed-in user's profile.
    async fn exchange(&self, code: &str) -> Result<UserProfile, AuthError>;
}

#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token: "https://oauth2.googleapis.com/token".to_string(),
            userinfo: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
        }
    }
}

pub struct GoogleOAuth {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    endpoints: GoogleEndpoints,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    email: Option<String>,
    name: Option<String>,
}

pub fn callback_url(public_url: &str) -> String {
    format!("{public_url}/auth/{PROVIDER}/callback")
}

impl GoogleOAuth {
    pub fn new(
        client: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            endpoints: GoogleEndpoints::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Identity provider returned {status}: {body}");
        Err(AuthError::Provider {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuth {
    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let mut url = Url::parse(&self.endpoints.authorize)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPES)
            .append_pair("state", state);
        Ok(url.into())
    }

    async fn exchange(&self, code: &str) -> Result<UserProfile, AuthError> {
        let response = self
            .client
            .post(&self.endpoints.token)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        let token: TokenResponse = Self::check(response).await?.json().await?;

        let response = self
            .client
            .get(&self.endpoints.userinfo)
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        let info: UserInfo = Self::check(response).await?.json().await?;

        let email = info.email.filter(|e| !e.is_empty()).ok_or(AuthError::MissingEmail)?;
        info!("Signed in {email}");

        Ok(UserProfile {
            display_name: info.name.unwrap_or_else(|| email.clone()),
            email,
        })
    }
}
