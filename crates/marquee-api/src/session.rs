// Sign-in, token rotation, and the session capability endpoint.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::auth::{TokenPair, TokenResponse};
use crate::client::CatalogClient;
use crate::error::Error;

/// Identity block of `GET auth/session`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A single `(resource, action)` grant as the API spells it.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantResponse {
    pub resource: String,
    pub action: String,
}

/// Response of `GET auth/session`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub user: SessionUser,
    #[serde(default, alias = "grants")]
    pub permissions: Vec<GrantResponse>,
    #[serde(default, alias = "expiresAt")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CatalogClient {
    /// Exchange email + password for a bearer token pair.
    ///
    /// The pair is stored on the client and attached to every later
    /// request.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), Error> {
        debug!(email, "signing in");
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let tokens: TokenResponse = match self.post("auth/login", &body).await {
            Ok(t) => t,
            Err(Error::SessionExpired) => {
                return Err(Error::Authentication {
                    message: "invalid email or password".into(),
                });
            }
            Err(Error::Api { message, .. }) => return Err(Error::Authentication { message }),
            Err(e) => return Err(e),
        };

        self.set_tokens(Some(TokenPair::from(tokens)));
        debug!("sign-in successful");
        Ok(())
    }

    /// Rotate the bearer token using the stored refresh token.
    pub async fn refresh_token(&self) -> Result<(), Error> {
        let refresh = self.refresh_secret().ok_or(Error::SessionExpired)?;
        let body = json!({ "refresh_token": refresh.expose_secret() });

        let tokens: TokenResponse = self.post("auth/refresh", &body).await?;
        let mut pair = TokenPair::from(tokens);
        // Servers that do not rotate refresh tokens omit them.
        if pair.refresh.is_none() {
            pair.refresh = Some(refresh);
        }
        self.set_tokens(Some(pair));
        debug!("access token rotated");
        Ok(())
    }

    /// End the session server-side and drop local tokens.
    ///
    /// Tokens are cleared even if the server call fails.
    pub async fn logout(&self) -> Result<(), Error> {
        let result = if self.has_token() {
            self.post_no_response("auth/logout", &json!({})).await
        } else {
            Ok(())
        };
        self.set_tokens(None);
        result
    }

    /// Read the current identity and capability grants.
    pub async fn session(&self) -> Result<SessionResponse, Error> {
        self.get("auth/session").await
    }
}
