//! Minimal HTTP/1.1 GET client for no_std environments
//!
//! The request/response handling is generic over an `embedded-io-async`
//! stream so the same code drives a plain TCP socket, a TLS session on the
//! device, or an in-memory stream in tests. Bodies are collected into a
//! `Vec<u8>` up to a caller-supplied limit; both `Content-Length` and
//! chunked transfer encoding are understood.
//!
//! A single exchange hands redirects back as [`Response::Redirect`];
//! [`Redirecting`] follows them across connections.

use alloc::format;
use alloc::vec::Vec;
use core::fmt::Write as FmtWrite;
use core::str;

use embedded_io_async::{Read, Write};
use heapless::String;
use log::{debug, trace, warn};
use thiserror_no_std::Error;

/// Upper bound on a response body. A full page of search results with
/// card text runs to several hundred KiB.
pub const DEFAULT_MAX_BODY: usize = 2 * 1024 * 1024;

/// Redirects followed for one request before giving up
pub const MAX_REDIRECTS: usize = 5;

/// Default buffer for the status line and headers
pub const HEADER_BUF_SIZE: usize = 2048;

const USER_AGENT: &str = "personal-tutor/0.1";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    #[error("failed to connect to server")]
    Connect,
    #[error("DNS lookup failed")]
    Dns,
    #[error("failed to write request")]
    Write,
    #[error("failed to read response")]
    Read,
    #[error("invalid URL")]
    InvalidUrl,
    #[error("malformed response")]
    Parse,
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("response too large")]
    TooLarge,
    #[error("TLS error")]
    Tls,
    #[error("request timed out")]
    Timeout,
    #[error("too many redirects")]
    TooManyRedirects,
}

/// Anything that can fetch a URL and hand back the response body
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    async fn get(&mut self, url: &str) -> Result<Vec<u8>, HttpError>;
}

/// Outcome of one request/response exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Body(Vec<u8>),
    /// A 3xx status with its `Location` header, not yet resolved
    Redirect(alloc::string::String),
}

/// One GET on a fresh connection. Redirects are reported, not followed.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn exchange(&mut self, url: &Url<'_>) -> Result<Response, HttpError>;
}

/// [`HttpClient`] that follows up to [`MAX_REDIRECTS`] redirects over a
/// [`Transport`], reconnecting for every hop
pub struct Redirecting<T> {
    transport: T,
}

impl<T> Redirecting<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> HttpClient for Redirecting<T> {
    async fn get(&mut self, url: &str) -> Result<Vec<u8>, HttpError> {
        let mut current = alloc::string::String::from(url);
        for _ in 0..=MAX_REDIRECTS {
            let parsed = Url::parse(&current)?;
            match self.transport.exchange(&parsed).await? {
                Response::Body(body) => return Ok(body),
                Response::Redirect(location) => {
                    let next = parsed.resolve(&location)?;
                    debug!("{} redirected to {}", current, next);
                    current = next;
                }
            }
        }
        warn!("Gave up on {} after {} redirects", url, MAX_REDIRECTS);
        Err(HttpError::TooManyRedirects)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub const fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// Parsed URL components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Url<'a> {
    pub scheme: Scheme,
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
}

impl<'a> Url<'a> {
    /// Parse `http://host[:port][/path]` or `https://...`
    pub fn parse(url: &'a str) -> Result<Self, HttpError> {
        let (scheme, rest) = if let Some(rest) = url.strip_prefix("https://") {
            (Scheme::Https, rest)
        } else if let Some(rest) = url.strip_prefix("http://") {
            (Scheme::Http, rest)
        } else {
            return Err(HttpError::InvalidUrl);
        };

        // The path starts at the first '/' or '?', whichever comes first
        let (host_port, path) = match rest.find(['/', '?']) {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        let (host, port) = match host_port.find(':') {
            Some(idx) => {
                let port = host_port[idx + 1..]
                    .parse()
                    .map_err(|_| HttpError::InvalidUrl)?;
                (&host_port[..idx], port)
            }
            None => (host_port, scheme.default_port()),
        };

        if host.is_empty() {
            return Err(HttpError::InvalidUrl);
        }

        Ok(Url {
            scheme,
            host,
            port,
            path,
        })
    }

    /// Request target as sent on the request line
    pub fn target(&self) -> RequestTarget<'a> {
        RequestTarget(self.path)
    }

    /// Resolve a `Location` header value against this URL. Absolute,
    /// scheme-relative, host-relative and path-relative forms are accepted.
    pub fn resolve(&self, location: &str) -> Result<alloc::string::String, HttpError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(HttpError::InvalidUrl);
        }
        if location.starts_with("http://") || location.starts_with("https://") {
            Url::parse(location)?;
            return Ok(location.into());
        }

        let scheme = match self.scheme {
            Scheme::Http => "http",
            Scheme::Https => "https",
        };
        if let Some(rest) = location.strip_prefix("//") {
            let url = format!("{scheme}://{rest}");
            Url::parse(&url)?;
            return Ok(url);
        }

        let mut url = format!("{scheme}://{}", self.host);
        if self.port != self.scheme.default_port() {
            write!(url, ":{}", self.port).map_err(|_| HttpError::InvalidUrl)?;
        }
        if location.starts_with('/') {
            url.push_str(location);
        } else {
            let path = self.path.split(['?', '#']).next().unwrap_or_default();
            let dir = path.rfind('/').map_or("/", |idx| &path[..=idx]);
            url.push_str(dir);
            url.push_str(location);
        }
        Ok(url)
    }
}

/// Request-line target; a bare query gets a leading '/'
pub struct RequestTarget<'a>(&'a str);

impl core::fmt::Display for RequestTarget<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.0.starts_with('/') {
            f.write_str(self.0)
        } else {
            write!(f, "/{}", self.0)
        }
    }
}

/// Status and framing information from a response head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub content_length: Option<usize>,
    pub chunked: bool,
}

impl ResponseHead {
    /// Parse the head (everything before the blank line)
    pub fn parse(head: &str) -> Result<Self, HttpError> {
        let status = parse_status(head)?;
        let content_length = match parse_header(head, "content-length") {
            Some(value) => Some(value.parse().map_err(|_| HttpError::Parse)?),
            None => None,
        };
        let chunked = parse_header(head, "transfer-encoding")
            .is_some_and(|value| has_token(value, "chunked"));

        Ok(Self {
            status,
            content_length,
            chunked,
        })
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }

    /// Fail on anything but 2xx
    pub fn check_status(&self) -> Result<(), HttpError> {
        match self.status {
            200..=299 => Ok(()),
            status => Err(HttpError::Status(status)),
        }
    }
}

/// Comma-separated header value contains `token` (case-insensitive)
fn has_token(value: &str, token: &str) -> bool {
    value
        .split(',')
        .any(|item| item.trim().eq_ignore_ascii_case(token))
}

/// Find the position of \r\n\r\n in the buffer
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

/// Parse HTTP status code from status line
pub fn parse_status(headers: &str) -> Result<u16, HttpError> {
    // HTTP/1.1 200 OK
    let line = headers.lines().next().ok_or(HttpError::Parse)?;
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().ok_or(HttpError::Parse)?;
    if !version.starts_with("HTTP/") {
        return Err(HttpError::Parse);
    }
    parts
        .next()
        .ok_or(HttpError::Parse)?
        .parse()
        .map_err(|_| HttpError::Parse)
}

/// Parse a header value (case-insensitive)
pub fn parse_header<'a>(headers: &'a str, name: &str) -> Option<&'a str> {
    headers
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    Size {
        value: usize,
        digits: u8,
        in_extension: bool,
    },
    SizeLf(usize),
    Data(usize),
    DataCr,
    DataLf,
    Done,
}

impl ChunkState {
    const START: Self = ChunkState::Size {
        value: 0,
        digits: 0,
        in_extension: false,
    };
}

/// Incremental decoder for `Transfer-Encoding: chunked` bodies.
/// Trailers after the last chunk are ignored.
#[derive(Debug, Clone)]
pub struct ChunkedDecoder {
    state: ChunkState,
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self {
            state: ChunkState::START,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == ChunkState::Done
    }

    /// Feed raw bytes from the wire, appending decoded data to `out`.
    pub fn feed(&mut self, mut input: &[u8], out: &mut Vec<u8>) -> Result<(), HttpError> {
        while let Some((&byte, rest)) = input.split_first() {
            match self.state {
                ChunkState::Data(remaining) => {
                    let take = remaining.min(input.len());
                    out.extend_from_slice(&input[..take]);
                    input = &input[take..];
                    self.state = if take == remaining {
                        ChunkState::DataCr
                    } else {
                        ChunkState::Data(remaining - take)
                    };
                    continue;
                }
                ChunkState::Size {
                    value,
                    digits,
                    in_extension,
                } => {
                    self.state = match byte {
                        b'\r' if digits == 0 => return Err(HttpError::Parse),
                        b'\r' => ChunkState::SizeLf(value),
                        _ if in_extension => self.state,
                        b';' => ChunkState::Size {
                            value,
                            digits,
                            in_extension: true,
                        },
                        b' ' | b'\t' => self.state,
                        _ => {
                            let digit = (byte as char).to_digit(16).ok_or(HttpError::Parse)?;
                            let value = value
                                .checked_mul(16)
                                .and_then(|v| v.checked_add(digit as usize))
                                .ok_or(HttpError::TooLarge)?;
                            ChunkState::Size {
                                value,
                                digits: digits.saturating_add(1),
                                in_extension,
                            }
                        }
                    };
                }
                ChunkState::SizeLf(size) => {
                    if byte != b'\n' {
                        return Err(HttpError::Parse);
                    }
                    self.state = if size == 0 {
                        ChunkState::Done
                    } else {
                        ChunkState::Data(size)
                    };
                }
                ChunkState::DataCr => {
                    if byte != b'\r' {
                        return Err(HttpError::Parse);
                    }
                    self.state = ChunkState::DataLf;
                }
                ChunkState::DataLf => {
                    if byte != b'\n' {
                        return Err(HttpError::Parse);
                    }
                    self.state = ChunkState::START;
                }
                ChunkState::Done => return Ok(()),
            }
            input = rest;
        }
        Ok(())
    }
}

enum Body {
    Length(usize),
    Chunked(ChunkedDecoder),
    UntilClose,
}

impl Body {
    fn is_complete(&self, received: usize) -> bool {
        match self {
            Body::Length(len) => received >= *len,
            Body::Chunked(decoder) => decoder.is_done(),
            Body::UntilClose => false,
        }
    }

    fn accept(&mut self, data: &[u8], out: &mut Vec<u8>, max_body: usize) -> Result<(), HttpError> {
        match self {
            Body::Chunked(decoder) => decoder.feed(data, out)?,
            Body::Length(len) => {
                let take = len.saturating_sub(out.len()).min(data.len());
                out.extend_from_slice(&data[..take]);
            }
            Body::UntilClose => out.extend_from_slice(data),
        }
        if out.len() > max_body {
            return Err(HttpError::TooLarge);
        }
        Ok(())
    }
}

/// Format the GET request for `url`
pub fn build_request(url: &Url<'_>) -> Result<String<1024>, HttpError> {
    let mut request = String::new();
    write!(&mut request, "GET {} HTTP/1.1\r\nHost: {}", url.target(), url.host)
        .map_err(|_| HttpError::TooLarge)?;
    if url.port != url.scheme.default_port() {
        write!(&mut request, ":{}", url.port).map_err(|_| HttpError::TooLarge)?;
    }
    write!(
        &mut request,
        "\r\nUser-Agent: {}\r\nAccept: */*\r\nConnection: close\r\n\r\n",
        USER_AGENT
    )
    .map_err(|_| HttpError::TooLarge)?;
    Ok(request)
}

/// Perform a GET over an already-connected stream and collect the body.
/// A redirect with a `Location` header is returned without reading its body.
///
/// `rx_buf` must be large enough to hold the whole response head.
pub async fn get<S>(
    stream: &mut S,
    url: &Url<'_>,
    rx_buf: &mut [u8],
    max_body: usize,
) -> Result<Response, HttpError>
where
    S: Read + Write,
{
    let request = build_request(url)?;
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|_| HttpError::Write)?;
    stream.flush().await.map_err(|_| HttpError::Write)?;

    // Read until we find \r\n\r\n
    let mut total_read = 0;
    let headers_end = loop {
        if total_read >= rx_buf.len() {
            return Err(HttpError::TooLarge);
        }

        let n = stream
            .read(&mut rx_buf[total_read..])
            .await
            .map_err(|_| HttpError::Read)?;
        if n == 0 {
            return Err(HttpError::Read);
        }
        total_read += n;

        if let Some(pos) = find_header_end(&rx_buf[..total_read]) {
            break pos;
        }
    };

    let head_str = str::from_utf8(&rx_buf[..headers_end]).map_err(|_| HttpError::Parse)?;
    let head = ResponseHead::parse(head_str)?;
    debug!(
        "HTTP {} from {} (length {:?}, chunked {})",
        head.status, url.host, head.content_length, head.chunked
    );
    if head.is_redirect() {
        if let Some(location) = parse_header(head_str, "location") {
            return Ok(Response::Redirect(location.into()));
        }
    }
    head.check_status()?;

    let mut body = if head.chunked {
        Body::Chunked(ChunkedDecoder::new())
    } else if let Some(len) = head.content_length {
        if len > max_body {
            return Err(HttpError::TooLarge);
        }
        Body::Length(len)
    } else {
        Body::UntilClose
    };

    let mut out = Vec::with_capacity(head.content_length.unwrap_or(0));
    let body_start = headers_end + 4;
    if total_read > body_start {
        body.accept(&rx_buf[body_start..total_read], &mut out, max_body)?;
    }

    while !body.is_complete(out.len()) {
        let n = stream.read(rx_buf).await.map_err(|_| HttpError::Read)?;
        if n == 0 {
            break;
        }
        trace!("HTTP body +{} bytes", n);
        body.accept(&rx_buf[..n], &mut out, max_body)?;
    }

    match body {
        Body::Length(len) if out.len() < len => Err(HttpError::Read),
        Body::Chunked(decoder) if !decoder.is_done() => Err(HttpError::Read),
        _ => Ok(Response::Body(out)),
    }
}
