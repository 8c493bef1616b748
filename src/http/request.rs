//! Request snapshots in HTTP/1.x wire format.
//!
//! # Responsibilities
//! - Read the request body (bounded)
//! - Serialize method, target, version, headers and body as they would
//!   appear on the wire
//! - Fold `Hdr-Accept-Encoding` back into `Accept-Encoding`
//!
//! # Design Decisions
//! - Header names are printed in canonical form (`Accept-Encoding`) and
//!   sorted, so dumps are stable across clients and protocols
//! - The fold works on a copy of the headers; the request is untouched
//! - Chunked bodies are re-chunked so the dump stays valid wire format

use axum::body::Bytes;
use axum::extract::Request;
use axum::http::{header, request::Parts, HeaderMap, HeaderName, Version};
use thiserror::Error;

/// Some proxies strip or rewrite `Accept-Encoding` before it reaches us.
/// Clients can send the value under this name instead to see it in the dump.
pub const HDR_ACCEPT_ENCODING: HeaderName = HeaderName::from_static("hdr-accept-encoding");


#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),
}

/// Wire-format text of one request. Never changes after capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSnapshot(String);

impl RequestSnapshot {
    /// Serialize request head and body.
    pub fn capture(parts: &Parts, body: &[u8]) -> Self {
        let headers = fold_accept_encoding(&parts.headers);
        let target = request_target(parts);
        let absolute = target.starts_with("http://") || target.starts_with("https://");

        let mut out = format!("{} {} {}\r\n", parts.method, target, version_str(parts.version));

        if !absolute {
            let host = headers
                .get(header::HOST)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .or_else(|| parts.uri.authority().map(|a| a.to_string()));
            if let Some(host) = host.filter(|h| !h.is_empty()) {
                out.push_str(&format!("Host: {}\r\n", host));
            }
        }

        let transfer_encoding: Vec<String> = headers
            .get_all(header::TRANSFER_ENCODING)
            .iter()
            .map(|v| clean_value(v.as_bytes()))
            .collect();
        let chunked = transfer_encoding
            .iter()
            .any(|te| te.eq_ignore_ascii_case("chunked"));
        if !transfer_encoding.is_empty() {
            out.push_str(&format!("Transfer-Encoding: {}\r\n", transfer_encoding.join(",")));
        }

        let mut names: Vec<&HeaderName> = headers
            .keys()
            .filter(|name| !is_excluded(name))
            .collect();
        names.sort_by_key(|name| canonical_name(name.as_str()));

        for name in names {
            let canonical = canonical_name(name.as_str());
            for value in headers.get_all(name) {
                out.push_str(&format!("{}: {}\r\n", canonical, clean_value(value.as_bytes())));
            }
        }
        out.push_str("\r\n");

        let body = String::from_utf8_lossy(body);
        if chunked {
            if !body.is_empty() {
                out.push_str(&format!("{:x}\r\n{}\r\n", body.len(), body));
            }
            out.push_str("0\r\n\r\n");
        } else {
            out.push_str(&body);
        }

        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Read up to `limit` body bytes and capture the request.
///
/// The request head is handed back for callers that still need it.
pub async fn snapshot(request: Request, limit: usize) -> Result<(Parts, RequestSnapshot), SnapshotError> {
    let (parts, body) = request.into_parts();
    let bytes: Bytes = axum::body::to_bytes(body, limit).await?;
    let snapshot = RequestSnapshot::capture(&parts, &bytes);
    Ok((parts, snapshot))
}

/// Copy `headers`, moving a non-empty `Hdr-Accept-Encoding` into
/// `Accept-Encoding`.
pub fn fold_accept_encoding(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    let renamed = headers
        .get(&HDR_ACCEPT_ENCODING)
        .filter(|v| !v.is_empty())
        .cloned();
    if let Some(value) = renamed {
        headers.insert(header::ACCEPT_ENCODING, value);
        headers.remove(&HDR_ACCEPT_ENCODING);
    }
    headers
}

/// `accept-encoding` → `Accept-Encoding`.
pub fn canonical_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() };
            upper = c == '-';
            out
        })
        .collect()
}

/// Headers that are written separately or not at all.
fn is_excluded(name: &HeaderName) -> bool {
    *name == header::HOST || *name == header::TRANSFER_ENCODING || *name == header::TRAILER
}

fn request_target(parts: &Parts) -> String {
    // HTTP/1.x proxies send absolute-form targets; echo those as received.
    if parts.version <= Version::HTTP_11 && parts.uri.scheme().is_some() {
        return parts.uri.to_string();
    }
    parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

fn clean_value(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .replace(&['\r', '\n'][..], " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_get_snapshot_layout() {
        let head = parts(
            HttpRequest::get("/demo?x=1")
                .header("host", "example.com")
                .header("user-agent", "curl/8.5.0")
                .header("accept", "*/*"),
        );
        let snapshot = RequestSnapshot::capture(&head, b"");
        assert_eq!(
            snapshot.as_str(),
            "GET /demo?x=1 HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\nUser-Agent: curl/8.5.0\r\n\r\n"
        );
    }

    #[test]
    fn test_post_body_and_repeated_headers() {
        let head = parts(
            HttpRequest::post("/submit")
                .version(Version::HTTP_10)
                .header("host", "h")
                .header("x-tag", "a")
                .header("x-tag", "b")
                .header("content-length", "5"),
        );
        let snapshot = RequestSnapshot::capture(&head, b"hello");
        assert_eq!(
            snapshot.as_str(),
            "POST /submit HTTP/1.0\r\nHost: h\r\nContent-Length: 5\r\nX-Tag: a\r\nX-Tag: b\r\n\r\nhello"
        );
    }

    #[test]
    fn test_renamed_accept_encoding_is_folded() {
        let head = parts(
            HttpRequest::get("/")
                .header("host", "h")
                .header("accept-encoding", "identity")
                .header("hdr-accept-encoding", "gzip, br"),
        );
        let snapshot = RequestSnapshot::capture(&head, b"");
        assert!(snapshot.as_str().contains("Accept-Encoding: gzip, br\r\n"));
        assert!(!snapshot.as_str().contains("identity"));
        assert!(!snapshot.as_str().contains("Hdr-Accept-Encoding"));

        // the original headers are left alone
        assert_eq!(head.headers.get("hdr-accept-encoding").unwrap(), "gzip, br");
        assert_eq!(head.headers.get("accept-encoding").unwrap(), "identity");
    }

    #[test]
    fn test_empty_renamed_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(HDR_ACCEPT_ENCODING, "".parse().unwrap());
        let folded = fold_accept_encoding(&headers);
        assert!(folded.contains_key(&HDR_ACCEPT_ENCODING));
        assert!(!folded.contains_key(header::ACCEPT_ENCODING));
    }

    #[test]
    fn test_chunked_body_is_rechunked() {
        let head = parts(
            HttpRequest::post("/up")
                .header("host", "h")
                .header("transfer-encoding", "chunked"),
        );
        let snapshot = RequestSnapshot::capture(&head, b"0123456789abcdefg");
        assert_eq!(
            snapshot.as_str(),
            "POST /up HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n11\r\n0123456789abcdefg\r\n0\r\n\r\n"
        );
    }

    #[test]
    fn test_absolute_target_and_h2_authority() {
        let proxied = parts(HttpRequest::get("http://example.com/x").header("host", "example.com"));
        assert_eq!(
            RequestSnapshot::capture(&proxied, b"").as_str(),
            "GET http://example.com/x HTTP/1.1\r\n\r\n"
        );

        let h2 = parts(HttpRequest::get("https://example.com/y?z").version(Version::HTTP_2));
        assert_eq!(
            RequestSnapshot::capture(&h2, b"").as_str(),
            "GET /y?z HTTP/2.0\r\nHost: example.com\r\n\r\n"
        );
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("accept-encoding"), "Accept-Encoding");
        assert_eq!(canonical_name("x-forwarded-for"), "X-Forwarded-For");
        assert_eq!(canonical_name("dnt"), "Dnt");
    }

    #[tokio::test]
    async fn test_snapshot_reads_body() {
        let request = HttpRequest::post("/b")
            .header("host", "h")
            .body(Body::from("payload"))
            .unwrap();
        let (_, snapshot) = snapshot(request, 1024).await.unwrap();
        assert!(snapshot.as_str().ends_with("\r\n\r\npayload"));
    }

    #[tokio::test]
    async fn test_snapshot_body_limit() {
        let request = HttpRequest::post("/b").body(Body::from("too long")).unwrap();
        assert!(snapshot(request, 3).await.is_err());
    }
}
