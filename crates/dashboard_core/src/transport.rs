//! HTTP access to the dashboard API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE},
    redirect, Client,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::QueryParams,
    error::ErrorBody,
    protocol::{ChartsResponse, FilterResponse},
};
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;

pub const FILTER_PATH: &str = "/api/filter";
pub const CHARTS_PATH: &str = "/api/charts";

#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn fetch_table(&self, params: &QueryParams) -> Result<FilterResponse, FetchError>;
    async fn fetch_charts(&self, params: &QueryParams) -> Result<ChartsResponse, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    /// Raw `Cookie` header value carrying the dashboard session.
    pub session_cookie: Option<String>,
    pub request_timeout: Option<Duration>,
}

pub struct HttpDashboardApi {
    http: Client,
    base_url: Url,
}

impl HttpDashboardApi {
    pub fn new(server_url: &str, options: HttpOptions) -> Result<Self> {
        let base_url = Url::parse(server_url)
            .with_context(|| format!("invalid dashboard server url '{server_url}'"))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(cookie) = options.session_cookie.as_deref() {
            let value = HeaderValue::from_str(cookie)
                .context("session cookie is not a valid header")?;
            headers.insert(COOKIE, value);
        }

        // A redirect to the login page must surface as a non-OK status.
        let mut builder = Client::builder()
            .default_headers(headers)
            .redirect(redirect::Policy::none());
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build().context("failed to build http client")?,
            base_url,
        })
    }

    pub fn endpoint_url(&self, path: &str, params: &QueryParams) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|err| FetchError::Transport(format!("invalid endpoint {path}: {err}")))?;
        url.query_pairs_mut().extend_pairs(params.as_pairs());
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<T, FetchError> {
        let url = self.endpoint_url(path, params)?;
        debug!(%url, "dashboard: request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "dashboard: response");

        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|body| body.error);
            if let Some(detail) = &message {
                warn!(path, status = status.as_u16(), %detail, "dashboard: server error");
            }
            return Err(FetchError::from_status(status.as_u16(), message));
        }

        serde_json::from_slice(&body).map_err(|err| FetchError::Decode(err.to_string()))
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn fetch_table(&self, params: &QueryParams) -> Result<FilterResponse, FetchError> {
        self.get_json(FILTER_PATH, params).await
    }

    async fn fetch_charts(&self, params: &QueryParams) -> Result<ChartsResponse, FetchError> {
        self.get_json(CHARTS_PATH, params).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
