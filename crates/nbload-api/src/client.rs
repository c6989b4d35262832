// Async HTTP client for NetBox-style REST APIs.
//
// Base path: /api/
// Auth: `Authorization: Token <token>` header

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::models::{Object, Page};
use crate::resource::Resource;
use crate::transport::TransportConfig;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for a NetBox-style REST API.
///
/// Every collection is addressed through [`Resource`]; lookups go through
/// query filters, writes are JSON `POST` / `PATCH`.
pub struct NetboxClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NetboxClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a token and transport config.
    ///
    /// Injects `Authorization: Token <token>` as a default header on every
    /// request.
    pub fn from_token(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Normalize the server URL so it always ends with `/api/`.
    ///
    /// Accepts both `https://host` and `https://host/api`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    /// The normalized API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Collection operations ────────────────────────────────────────

    /// List one page of a collection matching the given filters.
    pub async fn list(
        &self,
        resource: Resource,
        filter: &[(&str, String)],
    ) -> Result<Page<Object>, Error> {
        let url = self.url(resource.path())?;
        debug!("GET {url} params={filter:?}");

        let resp = self.http.get(url).query(filter).send().await?;
        self.handle_response(resp).await
    }

    /// Fetch the single object matching `filter`.
    ///
    /// Returns `Ok(None)` when nothing matches and [`Error::Ambiguous`]
    /// when more than one object does.
    pub async fn get(
        &self,
        resource: Resource,
        filter: &[(&str, String)],
    ) -> Result<Option<Object>, Error> {
        let page = self.list(resource, filter).await?;
        if page.count > 1 || page.results.len() > 1 {
            return Err(Error::Ambiguous {
                resource: resource.label(),
                count: page.count,
            });
        }
        Ok(page.results.into_iter().next())
    }

    /// Create an object in a collection, returning the stored representation.
    pub async fn create<B: Serialize + Sync>(
        &self,
        resource: Resource,
        body: &B,
    ) -> Result<Object, Error> {
        let url = self.url(resource.path())?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    /// Partially update the object `id` in a collection.
    pub async fn update<B: Serialize + Sync>(
        &self,
        resource: Resource,
        id: u64,
        body: &B,
    ) -> Result<Object, Error> {
        let url = self.url(&resource.object_path(id))?;
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
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

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|e| e.detail);

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Error::Authentication {
                message: detail.unwrap_or_else(|| status.to_string()),
            };
        }

        let message = match detail {
            Some(detail) => detail,
            None if raw.is_empty() => status.to_string(),
            None => raw,
        };

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}
