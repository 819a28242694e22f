//! Turns one observed exchange into a HAR entry.

use crate::error::MalformedExchange;
use crate::har::{
    Cache, Content, Cookie, Entry, Header, PostData, PostParam, QueryParam, Request, Response,
    Timings,
};
use crate::snapshot::{RequestSnapshot, ResponseSnapshot};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{SecondsFormat, Utc};
use log::debug;
use std::time::Duration;
use url::Url;

/// MIME type recorded when a message carries no Content-Type header
const UNKNOWN_MIME: &str = "x-unknown";

/// Knobs for entry construction
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Embed non-textual response bodies as base64 instead of omitting them
    pub include_binary_content: bool,
    /// Phase timings from finer-grained instrumentation, when available
    pub timings: Option<TimingHints>,
}

/// Measured send/receive phases; `wait` is always derived from the total
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingHints {
    pub send: f64,
    pub receive: f64,
}

/// Build a HAR entry from one exchange with default options.
///
/// `startedDateTime` is stamped at invocation. Malformed headers and
/// cookies are skipped; only a missing method, URL, or status code fails.
pub fn build_entry(
    request: &RequestSnapshot,
    response: &ResponseSnapshot,
    elapsed: Duration,
) -> Result<Entry, MalformedExchange> {
    build_entry_with(request, response, elapsed, &BuildOptions::default())
}

/// Build a HAR entry from one exchange
pub fn build_entry_with(
    request: &RequestSnapshot,
    response: &ResponseSnapshot,
    elapsed: Duration,
    options: &BuildOptions,
) -> Result<Entry, MalformedExchange> {
    if request.method.is_empty() {
        return Err(MalformedExchange::MissingMethod);
    }
    if request.url.is_empty() {
        return Err(MalformedExchange::MissingUrl {
            method: request.method.clone(),
        });
    }
    let status = i64::from(response.status.ok_or_else(|| MalformedExchange::MissingStatus {
        url: request.url.clone(),
    })?);

    let started_date_time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false);
    let timings = build_timings(elapsed, options);
    let time = timings.send + timings.wait + timings.receive;

    Ok(Entry {
        pageref: None,
        started_date_time,
        time,
        request: build_request(request),
        response: build_response(response, status, options),
        cache: Cache::default(),
        timings,
        server_ip_address: response.remote_addr.map(|addr| addr.ip().to_string()),
        connection: response.remote_addr.map(|addr| addr.port().to_string()),
        comment: None,
    })
}

fn build_request(req: &RequestSnapshot) -> Request {
    let url = Url::parse(&req.url).ok();

    Request {
        method: req.method.clone(),
        url: req.url.clone(),
        http_version: req.http_version.clone(),
        cookies: request_cookies(&req.headers),
        headers: format_headers(&req.headers),
        query_string: url.as_ref().map(format_query).unwrap_or_default(),
        post_data: format_post_data(req),
        headers_size: request_headers_size(req, url.as_ref()),
        body_size: req.body.as_ref().map_or(0, |b| b.len() as i64),
        comment: None,
    }
}

fn build_response(resp: &ResponseSnapshot, status: i64, options: &BuildOptions) -> Response {
    Response {
        status,
        status_text: resp.status_text.clone(),
        http_version: resp.http_version.clone(),
        cookies: response_cookies(&resp.headers),
        headers: format_headers(&resp.headers),
        content: format_content(resp, options),
        redirect_url: redirect_url(status, resp),
        headers_size: response_headers_size(status, resp),
        body_size: resp.body.len() as i64,
        comment: None,
    }
}

fn format_headers(headers: &[(String, String)]) -> Vec<Header> {
    headers
        .iter()
        .map(|(name, value)| Header::new(name, value))
        .collect()
}

/// Ordered, percent-decoded query pairs; repeated keys stay separate
fn format_query(url: &Url) -> Vec<QueryParam> {
    url.query_pairs()
        .map(|(name, value)| QueryParam {
            name: name.into_owned(),
            value: value.into_owned(),
            comment: None,
        })
        .collect()
}

/// Serialized size of `name: value\r\n` lines plus the terminating blank line
fn header_block_size(headers: &[(String, String)]) -> usize {
    headers
        .iter()
        .map(|(name, value)| name.len() + 2 + value.len() + 2)
        .sum::<usize>()
        + 2
}

/// Request header block size: request line + headers + blank line,
/// or -1 when the URL does not parse into a request target.
fn request_headers_size(req: &RequestSnapshot, url: Option<&Url>) -> i64 {
    let url = match url {
        Some(u) => u,
        None => return -1,
    };

    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let request_line = req.method.len() + 1 + target.len() + 1 + req.http_version.len() + 2;
    (request_line + header_block_size(&req.headers)) as i64
}

/// Response header block size: status line + headers + blank line
fn response_headers_size(status: i64, resp: &ResponseSnapshot) -> i64 {
    let status_line = resp.http_version.len()
        + 1
        + status.to_string().len()
        + 1
        + resp.status_text.len()
        + 2;
    (status_line + header_block_size(&resp.headers)) as i64
}

/// Cookies from `Cookie` request headers; malformed pairs are skipped
fn request_cookies(headers: &[(String, String)]) -> Vec<Cookie> {
    let mut cookies = Vec::new();

    for (_, value) in headers.iter().filter(|(n, _)| n.eq_ignore_ascii_case("cookie")) {
        for pair in value.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            match pair.split_once('=') {
                Some((name, value)) if !name.trim().is_empty() => cookies.push(Cookie {
                    name: name.trim().to_string(),
                    value: value.trim().to_string(),
                    ..Default::default()
                }),
                _ => debug!("skipping malformed cookie pair {pair:?}"),
            }
        }
    }

    cookies
}

/// Cookies from `Set-Cookie` response headers; malformed headers are skipped
fn response_cookies(headers: &[(String, String)]) -> Vec<Cookie> {
    headers
        .iter()
        .filter(|(n, _)| n.eq_ignore_ascii_case("set-cookie"))
        .filter_map(|(_, value)| parse_set_cookie(value))
        .collect()
}

fn parse_set_cookie(header: &str) -> Option<Cookie> {
    let mut parts = header.split(';');
    let first = parts.next()?.trim();

    let mut cookie = match first.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Cookie {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
            ..Default::default()
        },
        _ => {
            debug!("skipping malformed Set-Cookie header {header:?}");
            return None;
        }
    };

    for attr in parts {
        let attr = attr.trim();
        if attr.eq_ignore_ascii_case("httponly") {
            cookie.http_only = Some(true);
        } else if attr.eq_ignore_ascii_case("secure") {
            cookie.secure = Some(true);
        } else if let Some((key, value)) = attr.split_once('=') {
            match key.trim().to_ascii_lowercase().as_str() {
                "path" => cookie.path = Some(value.trim().to_string()),
                "domain" => cookie.domain = Some(value.trim().to_string()),
                "expires" => cookie.expires = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    Some(cookie)
}

/// Non-empty iff the status is a redirect and a Location header was present
fn redirect_url(status: i64, resp: &ResponseSnapshot) -> String {
    if (300..400).contains(&status) {
        resp.header("location").unwrap_or("").to_string()
    } else {
        String::new()
    }
}

fn format_content(resp: &ResponseSnapshot, options: &BuildOptions) -> Content {
    let mime_type = resp
        .header("content-type")
        .unwrap_or(UNKNOWN_MIME)
        .to_string();

    let (text, encoding) = if resp.body.is_empty() {
        (None, None)
    } else if is_text_mime(&mime_type) {
        (Some(String::from_utf8_lossy(&resp.body).into_owned()), None)
    } else if options.include_binary_content {
        (Some(STANDARD.encode(&resp.body)), Some("base64".to_string()))
    } else {
        (None, None)
    };

    Content {
        size: resp.body.len() as i64,
        compression: None,
        mime_type,
        text,
        encoding,
        comment: None,
    }
}

fn format_post_data(req: &RequestSnapshot) -> Option<PostData> {
    let body = req.body.as_deref().filter(|b| !b.is_empty())?;
    let mime_type = req
        .header("content-type")
        .unwrap_or(UNKNOWN_MIME)
        .to_string();

    let params = if mime_essence(&mime_type) == "application/x-www-form-urlencoded" {
        Some(
            url::form_urlencoded::parse(body)
                .map(|(name, value)| PostParam {
                    name: name.into_owned(),
                    value: Some(value.into_owned()),
                    file_name: None,
                    content_type: None,
                    comment: None,
                })
                .collect(),
        )
    } else {
        None
    };

    Some(PostData {
        mime_type,
        params,
        text: Some(String::from_utf8_lossy(body).into_owned()),
        comment: None,
    })
}

/// The MIME type without parameters, lowercased
fn mime_essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

fn is_text_mime(mime: &str) -> bool {
    let essence = mime_essence(mime);
    essence.starts_with("text/")
        || essence.contains("json")
        || essence.contains("xml")
        || essence.contains("javascript")
        || essence.contains("html")
        || essence == "application/x-www-form-urlencoded"
}

fn build_timings(elapsed: Duration, options: &BuildOptions) -> Timings {
    let hints = options.timings.unwrap_or_default();
    let send = hints.send.max(0.0);
    let receive = hints.receive.max(0.0);
    let total = elapsed.as_secs_f64() * 1000.0;
    let wait = (total - send - receive).max(0.0);

    Timings {
        send,
        wait,
        receive,
        ..Default::default()
    }
}
