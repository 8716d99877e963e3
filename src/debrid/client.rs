use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::types::{AddedMagnet, AvailableHost, Torrent, UnrestrictedLink, User};
use crate::error::{classify, AppError};

pub const DEFAULT_BASE_URL: &str = "https://api.real-debrid.com/rest/1.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Files to keep when selecting files of a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
  All,
  Ids(Vec<u64>),
}

impl FileSelection {
  /// Value of the `files` form field: `all` or a comma separated id list.
  pub fn to_form_value(&self) -> String {
    match self {
      Self::All => "all".to_string(),
      Self::Ids(ids) => ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(","),
    }
  }
}

impl FromStr for FileSelection {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("all") {
      return Ok(Self::All);
    }

    let ids = s
      .split(',')
      .map(|part| part.trim().parse::<u64>())
      .collect::<Result<Vec<_>, _>>()
      .map_err(|_| AppError::validation(format!("Invalid file selection '{}'", s), Some("files")))?;

    Ok(Self::Ids(ids))
  }
}

#[derive(Debug, Clone)]
enum Body {
  Empty,
  Form(Vec<(String, String)>),
  /// Pre-encoded form body, sent verbatim
  RawForm(String),
}

/// A request against an API endpoint, relative to the client's base URL.
///
/// Headers set here replace the client's defaults, including `Authorization`.
#[derive(Debug, Clone)]
pub struct ApiRequest {
  method: Method,
  endpoint: String,
  /// Trailing path segments, percent-encoded when the URL is built
  segments: Vec<String>,
  headers: HeaderMap,
  body: Body,
}

impl ApiRequest {
  pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
    Self {
      method,
      endpoint: endpoint.into(),
      segments: Vec::new(),
      headers: HeaderMap::new(),
      body: Body::Empty,
    }
  }

  pub fn get(endpoint: impl Into<String>) -> Self {
    Self::new(Method::GET, endpoint)
  }

  pub fn post(endpoint: impl Into<String>) -> Self {
    Self::new(Method::POST, endpoint)
  }

  pub fn delete(endpoint: impl Into<String>) -> Self {
    Self::new(Method::DELETE, endpoint)
  }

  /// Append one path segment, such as a torrent id. `/`, `?` and `#` are encoded.
  pub fn segment(mut self, segment: impl Into<String>) -> Self {
    self.segments.push(segment.into());
    self
  }

  pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
    self.headers.insert(name, value);
    self
  }

  /// Form-encoded body built from key/value pairs.
  pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
    self.body = Body::Form(
      fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    );
    self
  }

  fn raw_form(mut self, body: String) -> Self {
    self.body = Body::RawForm(body);
    self
  }
}

/// Real-Debrid API client.
///
/// Every request carries the bearer token and is bounded by the client timeout.
/// Nothing is retried.
#[derive(Clone)]
pub struct DebridClient {
  http: reqwest::Client,
  base_url: String,
  api_key: String,
  timeout: Duration,
}

impl fmt::Debug for DebridClient {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DebridClient")
      .field("base_url", &self.base_url)
      .field("api_key", &"<redacted>")
      .field("timeout", &self.timeout)
      .finish()
  }
}

impl DebridClient {
  /// The key is not checked here; a bad key surfaces as an auth error on first use.
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: DEFAULT_BASE_URL.to_string(),
      api_key: api_key.into(),
      timeout: DEFAULT_TIMEOUT,
    }
  }

  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into().trim_end_matches('/').to_string();
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn url_for(&self, request: &ApiRequest) -> Result<Url, AppError> {
    let mut url = Url::parse(&format!("{}{}", self.base_url, request.endpoint))
      .map_err(|e| AppError::validation(format!("Invalid API URL: {}", e), Some("base_url")))?;

    if request.segments.is_empty() {
      return Ok(url);
    }
    if request
      .segments
      .iter()
      .any(|s| matches!(s.as_str(), "" | "." | ".."))
    {
      return Err(AppError::validation("Invalid resource id", Some("id")));
    }

    url
      .path_segments_mut()
      .map_err(|_| AppError::validation("API URL cannot carry a path", Some("base_url")))?
      .extend(&request.segments);
    Ok(url)
  }

  /// Send a request and fail on anything but a 2xx response.
  async fn send(&self, request: ApiRequest) -> Result<Response, AppError> {
    let url = self.url_for(&request)?;

    let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
      AppError::validation("API key contains invalid characters", Some("api_key"))
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer);
    if matches!(request.body, Body::RawForm(_)) {
      headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    }
    for (name, value) in &request.headers {
      headers.insert(name.clone(), value.clone());
    }

    let mut builder = self
      .http
      .request(request.method.clone(), url.clone())
      .timeout(self.timeout)
      .headers(headers);

    builder = match request.body {
      Body::Empty => builder,
      Body::Form(fields) => builder.form(&fields),
      Body::RawForm(body) => builder.body(body),
    };

    debug!(method = %request.method, %url, "sending request");
    let response = builder.send().await.map_err(|e| {
      warn!(method = %request.method, %url, error = %e, "request failed before a response");
      AppError::network("Failed to connect to Real-Debrid API", e)
    })?;

    let status = response.status();
    debug!(method = %request.method, %url, %status, "received response");

    if !status.is_success() {
      return Err(classify(
        status.as_u16(),
        status.canonical_reason().unwrap_or_default(),
        None,
      ));
    }

    Ok(response)
  }

  /// Execute a request and decode its JSON body.
  pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, AppError> {
    let endpoint = request.endpoint.clone();
    let response = self.send(request).await?;

    let bytes = response
      .bytes()
      .await
      .map_err(|e| AppError::network("Failed to read Real-Debrid response", e))?;

    serde_json::from_slice(&bytes)
      .map_err(|e| AppError::decode(format!("Unexpected response body from {}", endpoint), e))
  }

  /// Execute a request whose response body carries nothing of interest.
  pub async fn execute_empty(&self, request: ApiRequest) -> Result<(), AppError> {
    self.send(request).await.map(|_| ())
  }

  /// Get the current user.
  pub async fn user(&self) -> Result<User, AppError> {
    self.execute(ApiRequest::get("/user")).await
  }

  /// List the user's torrents.
  pub async fn torrents(&self) -> Result<Vec<Torrent>, AppError> {
    self.execute(ApiRequest::get("/torrents")).await
  }

  /// Get a single torrent, including its files.
  pub async fn torrent_info(&self, id: &str) -> Result<Torrent, AppError> {
    self
      .execute(ApiRequest::get("/torrents/info").segment(id))
      .await
  }

  /// Add a magnet link to be downloaded on `host`.
  pub async fn add_magnet(&self, magnet: &str, host: &str) -> Result<AddedMagnet, AppError> {
    self
      .execute(ApiRequest::post("/torrents/addMagnet").form(&[("magnet", magnet), ("host", host)]))
      .await
  }

  /// Choose which files of a torrent to download.
  pub async fn select_files(&self, id: &str, files: &FileSelection) -> Result<(), AppError> {
    let request = ApiRequest::post("/torrents/selectFiles")
      .segment(id)
      .raw_form(format!("files={}", files.to_form_value()));
    self.execute_empty(request).await
  }

  pub async fn delete_torrent(&self, id: &str) -> Result<(), AppError> {
    self
      .execute_empty(ApiRequest::delete("/torrents/delete").segment(id))
      .await
  }

  /// Turn a hoster link into a direct download link.
  pub async fn unrestrict_link(&self, link: &str) -> Result<UnrestrictedLink, AppError> {
    self
      .execute(ApiRequest::post("/unrestrict/link").form(&[("link", link)]))
      .await
  }

  /// Hosts a magnet can currently be added to.
  pub async fn available_hosts(&self) -> Result<Vec<AvailableHost>, AppError> {
    self
      .execute(ApiRequest::get("/torrents/availableHosts"))
      .await
  }
}
