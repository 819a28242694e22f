//! Narrow view of one HTTP exchange, decoupled from any concrete client.
//!
//! The entry builder consumes these snapshot types only, so the core never
//! touches the HTTP client's own request/response representation. The
//! session wrapper fills them from reqwest; tests fill them by hand.

use std::net::SocketAddr;
use std::time::Duration;

/// The request-side fields the entry builder needs
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot {
    pub method: String,
    /// Full URL including the query component
    pub url: String,
    pub http_version: String,
    /// Headers in original order; repeated names kept as separate pairs
    pub headers: Vec<(String, String)>,
    /// Raw body bytes, if the request carried a body
    pub body: Option<Vec<u8>>,
}

/// The response-side fields the entry builder needs
#[derive(Debug, Clone, Default)]
pub struct ResponseSnapshot {
    /// `None` models a response that never produced a status line
    pub status: Option<u16>,
    pub status_text: String,
    pub http_version: String,
    /// Headers in original order; repeated names kept as separate pairs
    pub headers: Vec<(String, String)>,
    /// Raw body bytes, already fully read
    pub body: Vec<u8>,
    /// Peer address, when the client reports one
    pub remote_addr: Option<SocketAddr>,
}

/// One completed exchange as handed to the response hook
#[derive(Debug, Clone)]
pub struct Exchange {
    pub request: RequestSnapshot,
    pub response: ResponseSnapshot,
    /// Wall-clock time between request start and response completion
    pub elapsed: Duration,
}

impl RequestSnapshot {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        RequestSnapshot {
            method: method.into(),
            url: url.into(),
            http_version: "HTTP/1.1".to_string(),
            ..Default::default()
        }
    }

    /// First header with the given name, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

impl ResponseSnapshot {
    /// First header with the given name, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
