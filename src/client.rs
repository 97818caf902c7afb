use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

/// Outcome of one HTTP exchange. `body` is `None` when the response carried
/// no valid JSON, which some endpoints legitimately do; that is a
/// missing-data condition, not a transport failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Option<Value>,
}

impl Response {
    /// The raw body for error messages, empty when there was none.
    pub fn body_text(&self) -> String {
        self.body.as_ref().map(Value::to_string).unwrap_or_default()
    }
}

/// The engine's view of the cluster transport. Every call fully completes
/// before the next one is issued; there is no retrying at this layer.
#[async_trait]
pub trait RestClient {
    async fn get(&self, url: &str) -> Result<Response>;
    async fn post(&self, url: &str, body: &Value) -> Result<Response>;
    async fn delete(&self, url: &str) -> Result<Response>;
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Verify the cluster's TLS certificate.
    pub ssl_verify: bool,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            ssl_verify: true,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
        }
    }
}

/// `reqwest`-backed transport.
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .danger_accept_invalid_certs(!options.ssl_verify)
            .connect_timeout(options.connect_timeout)
            .timeout(options.read_timeout)
            .build()
            .map_err(Error::Client)?;
        Ok(Self { inner })
    }

    async fn execute(&self, request: reqwest::RequestBuilder, url: &str) -> Result<Response> {
        let res = request
            .send()
            .await
            .map_err(|err| classify(url, err))?;
        let status = res.status().as_u16();
        let text = res.text().await.map_err(|err| classify(url, err))?;
        let body = serde_json::from_str(&text).ok();
        tracing::debug!(url, status, "request complete");
        Ok(Response { status, body })
    }
}

#[async_trait]
impl RestClient for HttpClient {
    async fn get(&self, url: &str) -> Result<Response> {
        self.execute(self.inner.get(url), url).await
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Response> {
        self.execute(self.inner.post(url).json(body), url).await
    }

    async fn delete(&self, url: &str) -> Result<Response> {
        self.execute(self.inner.delete(url), url).await
    }
}

/// Connect and read timeouts are distinct failure kinds; everything else is
/// a transport error.
fn classify(url: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() && err.is_connect() {
        Error::ConnectTimeout { url: url.into() }
    } else if err.is_timeout() {
        Error::ReadTimeout { url: url.into() }
    } else {
        Error::Transport {
            url: url.into(),
            source: err,
        }
    }
}
