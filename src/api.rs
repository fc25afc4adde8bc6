//! HTTP access to the digest content service.
//!
//! # Architecture
//!
//! - [`RemoteService`]: the async seam the facade talks to; tests swap in a
//!   scripted implementation
//! - [`HttpRemote`]: the real thing, built on a shared `reqwest::Client`
//!
//! Every call resolves to a JSON [`Value`] or a [`ConsoleError`]. There is no
//! retry and no timeout beyond the client's defaults: a failure is reported
//! once and the facade decides what to do with it.

use crate::error::ConsoleError;
use reqwest::Method;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Endpoint paths, relative to the configured base URL.
pub mod paths {
    pub const HEALTH: &str = "/health";
    pub const REPORT: &str = "/report";
    pub const REPORT_UPDATE: &str = "/report/update";
    pub const PROMPTS: &str = "/prompts";
    pub const SHEETS: &str = "/sheets";
    pub const SLIDES: &str = "/slides";
    pub const AUDIO: &str = "/audio";
    pub const RELEASE: &str = "/release";

    /// `/sheets/{name}` with the name percent-encoded.
    pub fn sheet(name: &str) -> String {
        format!("{SHEETS}/{}", urlencoding::encode(name))
    }
}

/// Trait for async access to the content service.
pub trait RemoteService {
    /// `GET path` and decode the body as JSON.
    async fn get(&self, path: &str) -> Result<Value, ConsoleError>;

    /// Send `body` as JSON with `method` and decode the JSON response.
    async fn send(&self, method: Method, path: &str, body: &Value) -> Result<Value, ConsoleError>;
}

/// [`RemoteService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base: String,
    http: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base: impl Into<String>) -> Result<Self, ConsoleError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("news_digest_console/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base: base.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn decode(path: &str, res: reqwest::Response) -> Result<Value, ConsoleError> {
        let status = res.status();
        if !status.is_success() {
            return Err(ConsoleError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl RemoteService for HttpRemote {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, path: &str) -> Result<Value, ConsoleError> {
        let t0 = Instant::now();
        let res = match self.http.get(self.url(path)).send().await {
            Ok(res) => Self::decode(path, res).await,
            Err(e) => Err(e.into()),
        };
        let dt = t0.elapsed();
        match &res {
            Ok(_) => debug!(elapsed_ms = dt.as_millis() as u64, "GET succeeded"),
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "GET failed"),
        }
        res
    }

    #[instrument(level = "debug", skip(self, method, body), fields(method = %method))]
    async fn send(&self, method: Method, path: &str, body: &Value) -> Result<Value, ConsoleError> {
        let t0 = Instant::now();
        let payload = serde_json::to_string(body)?;
        let res = match self
            .http
            .request(method, self.url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
        {
            Ok(res) => Self::decode(path, res).await,
            Err(e) => Err(e.into()),
        };
        let dt = t0.elapsed();
        match &res {
            Ok(_) => debug!(elapsed_ms = dt.as_millis() as u64, "request succeeded"),
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "request failed"),
        }
        res
    }
}
