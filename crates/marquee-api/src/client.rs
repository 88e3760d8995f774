// Catalog API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token handling,
// and uniform error parsing. Endpoint groups (resources, session, upload)
// are inherent methods in sibling modules so this file stays focused on
// transport mechanics.

use std::sync::RwLock;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{Credentials, TokenPair};
use crate::error::Error;
use crate::transport::TransportConfig;

// ── Error response shape from the catalog API ────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the catalog API.
///
/// All paths are relative to `base_url`, which is normalized to end in
/// `/` so that `join("genres")` lands under the API root rather than
/// replacing its last segment.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
    /// Bearer tokens after a password sign-in. `None` for API-key auth.
    tokens: RwLock<Option<TokenPair>>,
    /// Whether requests authenticate with a static API key.
    api_key_auth: bool,
}

impl CatalogClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for the given credentials.
    ///
    /// API keys are installed as a sensitive default header. Password
    /// credentials are NOT exchanged here; call [`login`](Self::login).
    pub fn new(
        base_url: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        match credentials {
            Credentials::ApiKey { key } => {
                let mut headers = HeaderMap::new();
                let mut value = HeaderValue::from_str(key.expose_secret()).map_err(|e| {
                    Error::Authentication {
                        message: format!("invalid API key header value: {e}"),
                    }
                })?;
                value.set_sensitive(true);
                headers.insert("X-API-KEY", value);
                Ok(Self {
                    http: transport.build_client_with_headers(headers)?,
                    base_url,
                    tokens: RwLock::new(None),
                    api_key_auth: true,
                })
            }
            Credentials::Password { .. } => Ok(Self {
                http: transport.build_client()?,
                base_url,
                tokens: RwLock::new(None),
                api_key_auth: false,
            }),
        }
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            tokens: RwLock::new(None),
            api_key_auth: false,
        })
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The API root URL (always ends in `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Token management ─────────────────────────────────────────────

    pub(crate) fn set_tokens(&self, tokens: Option<TokenPair>) {
        trace!(present = tokens.is_some(), "replacing bearer tokens");
        *self.tokens.write().expect("token lock poisoned") = tokens;
    }

    pub(crate) fn refresh_secret(&self) -> Option<SecretString> {
        self.tokens
            .read()
            .expect("token lock poisoned")
            .as_ref()
            .and_then(|t| t.refresh.clone())
    }

    /// Whether a bearer access token is currently held.
    pub fn has_token(&self) -> bool {
        self.tokens.read().expect("token lock poisoned").is_some()
    }

    /// Apply the stored bearer token to a request builder.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.tokens.read().expect("token lock poisoned");
        match guard.as_ref() {
            Some(tokens) => builder.bearer_auth(tokens.access.expose_secret()),
            None => builder,
        }
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"genres/42"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// `{collection}/{id}` with `id` percent-encoded as one path segment,
    /// so `/`, `?` and `#` inside an id never reach another endpoint.
    pub(crate) fn record_url(&self, collection: &str, id: &str) -> Result<Url, Error> {
        if matches!(id, "" | "." | "..") {
            return Err(Error::InvalidRecordId { id: id.to_owned() });
        }
        let mut url = self.url(collection)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.authorize(self.http.get(url)).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self
            .authorize(self.http.get(url).query(params))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url).json(body)).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url).json(body)).send().await?;
        self.handle_empty(resp).await
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("PATCH {url}");

        let resp = self
            .authorize(self.http.patch(url).json(body))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");

        let resp = self.authorize(self.http.delete(url)).send().await?;
        self.handle_empty(resp).await
    }

    pub(crate) async fn post_bytes<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        content_type: &str,
        body: bytes::Bytes,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url} ({} bytes, {content_type})", body.len());

        let builder = self
            .http
            .post(url)
            .query(params)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);
        let resp = self.authorize(builder).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    pub(crate) async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return if self.api_key_auth {
                Error::InvalidApiKey
            } else {
                Error::SessionExpired
            };
        }

        let raw = resp.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
            Error::Api {
                status: status.as_u16(),
                message: err
                    .message
                    .or(err.error)
                    .unwrap_or_else(|| status.to_string()),
                code: err.code,
            }
        } else {
            Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                code: None,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client =
            CatalogClient::with_client(reqwest::Client::new(), "https://api.example.com/v1")
                .unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example.com/v1/");
        assert_eq!(
            client.url("genres/7").unwrap().as_str(),
            "https://api.example.com/v1/genres/7"
        );
    }

    #[test]
    fn leading_slash_does_not_escape_base_path() {
        let client =
            CatalogClient::with_client(reqwest::Client::new(), "https://api.example.com/v1/")
                .unwrap();
        assert_eq!(
            client.url("/movies").unwrap().as_str(),
            "https://api.example.com/v1/movies"
        );
    }

    #[test]
    fn api_key_client_holds_no_bearer_token() {
        let creds = Credentials::ApiKey {
            key: SecretString::from("k-123".to_string()),
        };
        let client =
            CatalogClient::new("https://api.example.com", &creds, &TransportConfig::default())
                .unwrap();
        assert!(!client.has_token());
    }
}
