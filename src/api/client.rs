use std::marker::PhantomData;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use super::types::{
    City, CitySearch, Country, CountrySearch, Credentials, ListQuery, Registration, State,
    StateSearch, TokenResponse,
};
use crate::session::Session;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Blocking client for the geo REST API.
///
/// Every call attaches JSON headers and, when the [`Session`] holds a token,
/// a bearer `Authorization` header. Calls are made from worker threads, never
/// from the UI thread.
pub struct ApiClient {
    base: Url,
    http: Client,
    session: Session,
    api_key: Option<String>,
}

impl ApiClient {
    /// `timeout: None` leaves requests unbounded.
    pub fn new(base_url: &str, session: Session, timeout: Option<Duration>) -> ApiResult<Self> {
        let base = Url::parse(base_url).map_err(|e| ApiError::Url(format!("{base_url}: {e}")))?;
        let http = Client::builder()
            .user_agent(concat!("geo-explorer/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base,
            http,
            session,
            api_key: None,
        })
    }

    /// Send `X-API-KEY` with every request. A blank key sends nothing.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into()).filter(|k| !k.is_empty());
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Build the request URL. Segments are percent-encoded individually and
    /// the query string is left off entirely when `query` is empty.
    pub fn url(&self, segments: &[&str], query: &[(&str, String)]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(format!("{} cannot take path segments", self.base)))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Headers sent with every request
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = self.session.token() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("stored token is not a valid header value, sending unauthenticated"),
            }
        }
        if let Some(key) = &self.api_key {
            match HeaderValue::from_str(key) {
                Ok(value) => {
                    headers.insert(API_KEY_HEADER, value);
                }
                Err(_) => tracing::warn!("api key is not a valid header value, leaving it off"),
            }
        }
        headers
    }

    /// Core request. 204 yields `Value::Null`; any other non-success status
    /// becomes [`ApiError::Status`].
    pub fn request<B>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<Value>
    where
        B: Serialize + ?Sized,
    {
        self.exchange(method, segments, query, body)
            .map(|(_, value)| value)
    }

    /// [`ApiClient::request`], keeping the success status
    fn exchange<B>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<(StatusCode, Value)>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(segments, query)?;
        tracing::debug!(%method, %url, "api request");

        let mut request = self.http.request(method.clone(), url).headers(self.headers());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status();
        let bytes = response.bytes()?;

        let result = interpret(status, &bytes);
        if let Err(e) = &result {
            tracing::warn!(%method, status = status.as_u16(), error = %e, "api request failed");
        }
        result.map(|value| (status, value))
    }

    fn get(&self, segments: &[&str], query: &[(&str, String)]) -> ApiResult<Value> {
        self.request::<()>(Method::GET, segments, query, None)
    }

    fn send<B: Serialize + ?Sized>(&self, method: Method, segments: &[&str], body: &B) -> ApiResult<Value> {
        self.request(method, segments, &[], Some(body))
    }

    // Utility / health

    pub fn hello(&self) -> ApiResult<Value> {
        self.get(&["hello"], &[])
    }

    pub fn endpoints(&self) -> ApiResult<Value> {
        self.get(&["endpoints"], &[])
    }

    pub fn timestamp(&self) -> ApiResult<Value> {
        self.get(&["timestamp"], &[])
    }

    pub fn health(&self) -> ApiResult<Value> {
        self.get(&["health"], &[])
    }

    // Resources

    pub fn countries(&self) -> Resource<'_, Country> {
        Resource::new(self, "countries", "iso_code")
    }

    pub fn states(&self) -> Resource<'_, State> {
        Resource::new(self, "states", "state_code")
    }

    pub fn cities(&self) -> Resource<'_, City> {
        Resource::new(self, "cities", "state_code")
    }

    pub fn list_countries(&self, query: &ListQuery) -> ApiResult<Value> {
        self.countries().list(query)
    }

    pub fn list_states(&self, query: &ListQuery) -> ApiResult<Value> {
        self.states().list(query)
    }

    pub fn list_cities(&self, query: &ListQuery) -> ApiResult<Value> {
        self.cities().list(query)
    }

    pub fn search_countries(&self, search: &CountrySearch) -> ApiResult<Value> {
        self.get(&["countries", "search"], &search.pairs())
    }

    pub fn search_states(&self, search: &StateSearch) -> ApiResult<Value> {
        self.get(&["states", "search"], &search.pairs())
    }

    pub fn search_cities(&self, search: &CitySearch) -> ApiResult<Value> {
        self.get(&["cities", "search"], &search.pairs())
    }

    // Auth

    pub fn login(&self, credentials: &Credentials) -> ApiResult<TokenResponse> {
        let value = self.send(Method::POST, &["login"], credentials)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn register(&self, registration: &Registration) -> ApiResult<TokenResponse> {
        let value = self.send(Method::POST, &["register"], registration)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// CRUD and bulk endpoints of one resource collection (`/countries`,
/// `/states`, `/cities`).
pub struct Resource<'a, T> {
    client: &'a ApiClient,
    path: &'static str,
    code_key: &'static str,
    _record: PhantomData<T>,
}

impl<'a, T: Serialize> Resource<'a, T> {
    fn new(client: &'a ApiClient, path: &'static str, code_key: &'static str) -> Self {
        Self {
            client,
            path,
            code_key,
            _record: PhantomData,
        }
    }

    pub fn list(&self, query: &ListQuery) -> ApiResult<Value> {
        self.client.get(&[self.path], &query.pairs(self.code_key))
    }

    pub fn get(&self, id: &str) -> ApiResult<Value> {
        self.client.get(&[self.path, id], &[])
    }

    pub fn create(&self, record: &T) -> ApiResult<Value> {
        self.client.send(Method::POST, &[self.path], record)
    }

    pub fn update(&self, id: &str, record: &T) -> ApiResult<Value> {
        self.client.send(Method::PUT, &[self.path, id], record)
    }

    pub fn delete(&self, id: &str) -> ApiResult<Value> {
        self.client.request::<()>(Method::DELETE, &[self.path, id], &[], None)
    }

    pub fn bulk_create(&self, records: &[T]) -> ApiResult<Value> {
        self.bulk_create_with_status(records).map(|(_, value)| value)
    }

    /// Bulk create, reporting the status (207 means partial success)
    pub fn bulk_create_with_status(&self, records: &[T]) -> ApiResult<(StatusCode, Value)> {
        self.client
            .exchange(Method::POST, &[self.path, "bulk"], &[], Some(records))
    }

    /// Collection name, as it appears in the path
    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn bulk_update(&self, records: &[T]) -> ApiResult<Value> {
        self.client.send(Method::PUT, &[self.path, "bulk"], records)
    }

    pub fn bulk_delete(&self, records: &[T]) -> ApiResult<Value> {
        self.client.send(Method::DELETE, &[self.path, "bulk"], records)
    }
}

/// Turn a status and raw body into the call's result.
pub fn interpret(status: StatusCode, body: &[u8]) -> ApiResult<Value> {
    if status == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    if status.is_success() {
        return Ok(serde_json::from_slice(body)?);
    }

    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Request failed: {}", status.as_u16()));

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}
