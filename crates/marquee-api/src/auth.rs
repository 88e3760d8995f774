use secrecy::SecretString;
use serde::Deserialize;

/// Credentials for authenticating with the catalog API.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Static service key sent as `X-API-KEY` on every request.
    ApiKey { key: SecretString },

    /// Interactive sign-in. Exchanged for a bearer [`TokenPair`] at
    /// `POST auth/login`.
    Password { email: String, password: SecretString },
}

/// Bearer tokens issued by `auth/login` and rotated by `auth/refresh`.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: SecretString,
    pub refresh: Option<SecretString>,
}

/// Wire shape of the login / refresh response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

impl From<TokenResponse> for TokenPair {
    fn from(resp: TokenResponse) -> Self {
        Self {
            access: SecretString::from(resp.access_token),
            refresh: resp.refresh_token.map(SecretString::from),
        }
    }
}
