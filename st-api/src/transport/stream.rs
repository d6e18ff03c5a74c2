//! Fallback transport: a single HTTP/1.0 exchange over a plain TCP stream.
//!
//! Only `http://` endpoints are reachable and file uploads are rejected up
//! front. Useful where the full client is unavailable or undesirable
//! (minimal builds, local relays, tests against plain-HTTP fixtures).

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use url::{Host, Url};

use st_core::constants::METHOD_OVERRIDE_HEADER;
use st_core::error::{StError, StResult};

use super::{finish, HttpMethod, RawResponse, Transport, TransportOptions};
use crate::payload::{url_with_query, Payload};

/// Transport that speaks HTTP/1.0 directly over `tokio::net::TcpStream`.
#[derive(Debug, Clone)]
pub struct StreamTransport {
    options: TransportOptions,
}

impl StreamTransport {
    pub fn new(options: TransportOptions) -> Self {
        Self { options }
    }

    async fn open(&self, target: &Url, url: &str) -> StResult<TcpStream> {
        let port = target
            .port_or_known_default()
            .ok_or_else(|| StError::transport(url, "unable to open stream: no port"))?;

        let connect = async {
            match target.host() {
                Some(Host::Ipv6(addr)) => TcpStream::connect(SocketAddr::from((addr, port))).await,
                Some(Host::Ipv4(addr)) => TcpStream::connect(SocketAddr::from((addr, port))).await,
                Some(Host::Domain(domain)) => TcpStream::connect((domain, port)).await,
                None => Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing host")),
            }
        };

        match tokio::time::timeout(self.options.connect_timeout, connect).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(StError::transport(url, format!("unable to open stream: {e}"))),
            Err(_) => Err(StError::transport(url, "unable to open stream: connect timed out")),
        }
    }

    /// Serialize the request head and body.
    fn render_request(&self, target: &Url, payload: &Payload, method: HttpMethod) -> Vec<u8> {
        let mut path = target.path().to_string();
        if let Some(query) = target.query() {
            path.push('?');
            path.push_str(query);
        }

        let host = match target.port() {
            Some(port) => format!("{}:{port}", target.host_str().unwrap_or_default()),
            None => target.host_str().unwrap_or_default().to_string(),
        };

        let mut head = format!(
            "{} {path} HTTP/1.0\r\nHost: {host}\r\nUser-Agent: {}\r\nAccept: application/json\r\nConnection: close\r\n",
            method.wire_verb(),
            self.options.user_agent,
        );
        for (key, value) in &self.options.headers {
            head.push_str(&format!("{key}: {value}\r\n"));
        }
        if let Some(token) = method.override_token() {
            head.push_str(&format!("{METHOD_OVERRIDE_HEADER}: {token}\r\n"));
        }

        let body = if method.uses_query() {
            String::new()
        } else {
            payload.urlencoded()
        };
        if !method.uses_query() {
            head.push_str("Content-Type: application/x-www-form-urlencoded\r\n");
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        head.push_str("\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(body.as_bytes());
        bytes
    }

    async fn exchange(&self, target: &Url, url: &str, request: &[u8]) -> StResult<Vec<u8>> {
        let mut stream = self.open(target, url).await?;
        stream
            .write_all(request)
            .await
            .map_err(|e| StError::transport(url, format!("failed to write request: {e}")))?;

        let mut raw = Vec::new();
        stream
            .read_to_end(&mut raw)
            .await
            .map_err(|e| StError::transport(url, format!("no response received from stream: {e}")))?;
        Ok(raw)
    }
}

#[async_trait]
impl Transport for StreamTransport {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn supports_multipart(&self) -> bool {
        false
    }

    async fn send(&self, url: &str, payload: &Payload, method: HttpMethod) -> StResult<RawResponse> {
        if payload.is_file_upload() {
            return Err(StError::UploadCapability {
                transport: self.name().to_string(),
                fields: payload.file_field_names(),
            });
        }

        let full_url = if method.uses_query() {
            url_with_query(url, &payload.urlencoded())
        } else {
            url.to_string()
        };

        let target = Url::parse(&full_url)
            .map_err(|e| StError::transport(url, format!("unable to open stream: {e}")))?;
        if target.scheme() != "http" {
            return Err(StError::transport(
                url,
                format!("unable to open stream: scheme '{}' is not supported", target.scheme()),
            ));
        }

        debug!("{} {} via stream", method.wire_verb(), url);

        let request = self.render_request(&target, payload, method);
        let raw = match tokio::time::timeout(self.options.timeout, self.exchange(&target, url, &request)).await {
            Ok(result) => result?,
            Err(_) => return Err(StError::transport(url, "request timed out")),
        };

        let parsed = parse_response(&raw).map_err(|message| StError::transport(url, message))?;
        finish(full_url, parsed.status, parsed.content_type, parsed.body)
    }
}

#[derive(Debug)]
struct ParsedResponse {
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
}

/// Maximum number of response headers accepted from the stream.
const MAX_HEADERS: usize = 64;

/// Split a close-delimited HTTP response into status, headers and body.
fn parse_response(raw: &[u8]) -> Result<ParsedResponse, String> {
    if raw.is_empty() {
        return Err("no response received from stream".into());
    }

    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut headers);
    let head_len = match response.parse(raw) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Err("malformed response: incomplete head".into()),
        Err(e) => return Err(format!("malformed response: {e}")),
    };
    let status = response
        .code
        .ok_or_else(|| "malformed response: missing status".to_string())?;

    let mut content_type = None;
    let mut content_length = None;
    let mut chunked = false;
    for header in response.headers.iter() {
        let value = String::from_utf8_lossy(header.value);
        let value = value.trim();
        if header.name.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.to_string());
        } else if header.name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().ok();
        } else if header.name.eq_ignore_ascii_case("transfer-encoding") {
            // Only the last coding decides the message framing.
            chunked = value
                .rsplit(',')
                .next()
                .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"));
        }
    }

    let rest = &raw[head_len..];
    let body = if chunked {
        decode_chunked(rest)?
    } else if let Some(len) = content_length {
        rest[..len.min(rest.len())].to_vec()
    } else {
        rest.to_vec()
    };

    Ok(ParsedResponse {
        status,
        content_type,
        body,
    })
}

/// Decode a `Transfer-Encoding: chunked` body.
fn decode_chunked(mut data: &[u8]) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(data.len());
    loop {
        let (start, size) = match httparse::parse_chunk_size(data) {
            Ok(httparse::Status::Complete(parsed)) => parsed,
            Ok(httparse::Status::Partial) => return Err("truncated chunked body".into()),
            Err(_) => return Err("malformed chunk size".into()),
        };
        let size = usize::try_from(size).map_err(|_| "chunk too large".to_string())?;
        data = &data[start..];
        if size == 0 {
            return Ok(out);
        }
        if data.len() < size {
            return Err("truncated chunked body".into());
        }
        out.extend_from_slice(&data[..size]);
        let rest = &data[size..];
        data = rest
            .strip_prefix(b"\r\n")
            .or_else(|| rest.strip_prefix(b"\n"))
            .unwrap_or(rest);
    }
}

impl Default for StreamTransport {
    fn default() -> Self {
        Self::new(TransportOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use st_core::config::Credentials;

    fn payload() -> Payload {
        let data = match json!({"send_id": "s1"}) {
            serde_json::Value::Object(m) => m,
            _ => unreachable!(),
        };
        Payload::build(&Credentials::new("k", "s"), data, &[]).unwrap()
    }

    #[test]
    fn test_parse_content_length_response() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{}trailing";
        let parsed = parse_response(raw).unwrap();
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.content_type.as_deref(), Some("application/json"));
        assert_eq!(parsed.body, b"{}");
    }

    #[test]
    fn test_parse_chunked_response() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\n{\"a\"\r\n3\r\n:1}\r\n0\r\n\r\n";
        let parsed = parse_response(raw).unwrap();
        assert_eq!(parsed.body, br#"{"a":1}"#);
    }

    #[test]
    fn test_parse_bare_lf_response() {
        let raw = b"HTTP/1.0 200 OK\nContent-Type: application/json\n\n{\"ok\":1}";
        let parsed = parse_response(raw).unwrap();
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.content_type.as_deref(), Some("application/json"));
        assert_eq!(parsed.body, br#"{"ok":1}"#);
    }

    #[test]
    fn test_parse_chunked_as_last_coding() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: gzip, chunked\r\n\r\n3\r\n{}\n\r\n0\r\n\r\n";
        let parsed = parse_response(raw).unwrap();
        assert_eq!(parsed.body, b"{}\n");
    }

    #[test]
    fn test_parse_chunked_not_last_is_raw() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked, gzip\r\n\r\nabc";
        let parsed = parse_response(raw).unwrap();
        assert_eq!(parsed.body, b"abc");
    }

    #[test]
    fn test_parse_close_delimited_body() {
        let raw = b"HTTP/1.0 500 Internal Server Error\r\n\r\nboom";
        let parsed = parse_response(raw).unwrap();
        assert_eq!(parsed.status, 500);
        assert_eq!(parsed.content_type, None);
        assert_eq!(parsed.body, b"boom");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_response(b"").is_err());
        assert!(parse_response(b"hello").is_err());
        assert!(parse_response(b"SMTP 220\r\n\r\n").is_err());
    }

    #[test]
    fn test_render_delete_as_get() {
        let transport = StreamTransport::default();
        let payload = payload();
        let url = url_with_query("http://127.0.0.1:8080/send", &payload.urlencoded());
        let target = Url::parse(&url).unwrap();
        let rendered = transport.render_request(&target, &payload, HttpMethod::Delete);
        let text = String::from_utf8(rendered).unwrap();

        assert!(text.starts_with("GET /send?api_key=k&format=json&json="));
        assert!(text.contains("\r\nHost: 127.0.0.1:8080\r\n"));
        assert!(text.contains("\r\nX-HTTP-Method-Override: DELETE\r\n"));
        assert!(!text.contains("DELETE /"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_render_post_body() {
        let transport = StreamTransport::default();
        let payload = payload();
        let target = Url::parse("http://localhost/send").unwrap();
        let text = String::from_utf8(transport.render_request(&target, &payload, HttpMethod::Post)).unwrap();

        let body = payload.urlencoded();
        assert!(text.starts_with("POST /send HTTP/1.0\r\n"));
        assert!(text.contains(&format!("Content-Length: {}\r\n", body.len())));
        assert!(text.ends_with(&format!("\r\n\r\n{body}")));
    }

    #[tokio::test]
    async fn test_https_rejected() {
        let err = StreamTransport::default()
            .send("https://api.sailthru.com/send", &payload(), HttpMethod::Get)
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("unable to open stream"));
    }
}
