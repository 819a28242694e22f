//! A recording session: the reqwest blocking client surface, pre-wired
//! with its own recorder so every exchange lands in the HAR log.

use crate::error::Error;
use crate::hook::ResponseHook;
use crate::recorder::Recorder;
use crate::snapshot::{Exchange, RequestSnapshot, ResponseSnapshot};
use reqwest::blocking::{Body, Client, Request, RequestBuilder};
use reqwest::header::HeaderMap;
use reqwest::{IntoUrl, Method, StatusCode, Url, Version};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Major version of the client crate this wrapper links
const REQWEST_VERSION: &str = "0.12";

/// HTTP client wrapper that records every completed exchange.
///
/// Requests issued through it behave like plain reqwest calls; the
/// response body is read eagerly (recording needs the raw bytes), so
/// callers get a [`SessionResponse`] instead of a streaming response.
#[derive(Debug)]
pub struct Session {
    client: Client,
    hook: ResponseHook,
}

impl Session {
    /// Session with a default rustls-backed client and cookie store
    pub fn new() -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .use_rustls_tls()
            .cookie_store(true)
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Wrap an already-configured client
    pub fn with_client(client: Client) -> Self {
        let recorder = Arc::new(Recorder::with_browser("reqwest", REQWEST_VERSION));
        Session {
            client,
            hook: ResponseHook::new(recorder),
        }
    }

    /// The recorder owning everything captured through this session
    pub fn recorder(&self) -> &Arc<Recorder> {
        self.hook.recorder()
    }

    /// Persist the captured log; see [`Recorder::save`]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, Error> {
        Ok(self.recorder().save(path)?)
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> Result<SessionResponse, Error> {
        self.send(self.client.get(url))
    }

    pub fn head<U: IntoUrl>(&self, url: U) -> Result<SessionResponse, Error> {
        self.send(self.client.head(url))
    }

    pub fn delete<U: IntoUrl>(&self, url: U) -> Result<SessionResponse, Error> {
        self.send(self.client.delete(url))
    }

    pub fn post<U: IntoUrl, B: Into<Body>>(&self, url: U, body: B) -> Result<SessionResponse, Error> {
        self.send(self.client.post(url).body(body))
    }

    pub fn put<U: IntoUrl, B: Into<Body>>(&self, url: U, body: B) -> Result<SessionResponse, Error> {
        self.send(self.client.put(url).body(body))
    }

    /// Builder for arbitrary requests; pass the result to [`Session::send`]
    /// so the exchange is recorded.
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Build and execute, recording the exchange
    pub fn send(&self, builder: RequestBuilder) -> Result<SessionResponse, Error> {
        self.execute(builder.build()?)
    }

    /// Execute a request, recording the exchange
    pub fn execute(&self, request: Request) -> Result<SessionResponse, Error> {
        let mut request_snapshot = snapshot_request(&request);

        let started = Instant::now();
        let response = self.client.execute(request)?;

        let status = response.status();
        let version = response.version();
        let url = response.url().clone();
        let remote_addr = response.remote_addr();
        let headers = response.headers().clone();
        let body = response.bytes()?.to_vec();
        let elapsed = started.elapsed();

        // reqwest settles the protocol version at send time, so the
        // request side reuses the negotiated one.
        request_snapshot.http_version = version_str(version).to_string();

        let exchange = self.hook.on_response(Exchange {
            request: request_snapshot,
            response: ResponseSnapshot {
                status: Some(status.as_u16()),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                http_version: version_str(version).to_string(),
                headers: flatten_headers(&headers),
                body,
                remote_addr,
            },
            elapsed,
        })?;

        Ok(SessionResponse {
            url,
            status,
            version,
            headers,
            body: exchange.response.body,
        })
    }
}

/// A fully-read response handed back after recording
#[derive(Debug)]
pub struct SessionResponse {
    url: Url,
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl SessionResponse {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

fn snapshot_request(request: &Request) -> RequestSnapshot {
    RequestSnapshot {
        method: request.method().as_str().to_string(),
        url: request.url().as_str().to_string(),
        http_version: String::new(),
        headers: flatten_headers(request.headers()),
        // streaming bodies have no buffered bytes and are recorded as absent
        body: request
            .body()
            .and_then(|body| body.as_bytes())
            .map(|bytes| bytes.to_vec()),
    }
}

fn flatten_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/1.1",
    }
}
