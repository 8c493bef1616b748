//! Request handlers.
//!
//! Every handler is mounted twice, once behind the gzip transport and once
//! under `/nogzip`. See `routes.rs`.

use std::collections::HashMap;

use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::assets::FAVICON;
use crate::http::request::snapshot;
use crate::http::response::{html_page, present, raw_text, DumpError};
use crate::http::server::AppState;
use crate::http::stream::{stream_response, StreamPlan};
use crate::render::negotiate::{self, OutputFormat};

const DUMP_GRAMMAR: &str = "HTTP";
const BASIC_CHALLENGE: &str = "Basic realm=\"restricted area\"";

pub async fn live() -> &'static str {
    "OK\n"
}

pub async fn version(State(state): State<AppState>) -> String {
    format!("VERSION:{}\n", state.version)
}

pub async fn whoami() -> Result<String, DumpError> {
    let name = hostname::get().map_err(DumpError::Hostname)?;
    Ok(format!("{}\n", name.to_string_lossy()))
}

/// Serves the page rendered at startup; raw text never touches the renderer.
pub async fn source(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Result<Response, DumpError> {
    match negotiate::for_request(&uri, &headers) {
        OutputFormat::Raw => Ok(raw_text(state.source.text())),
        OutputFormat::Rendered => Ok(html_page(state.source.rendered()?.to_string())),
    }
}

/// Echo the request back as wire-format text.
pub async fn dump(State(state): State<AppState>, request: Request) -> Result<Response, DumpError> {
    let format = negotiate::for_request(request.uri(), request.headers());
    let (_, snapshot) = snapshot(request, state.config.limits.max_body_bytes).await?;
    present(&state.presenter, format, DUMP_GRAMMAR, snapshot.into_string(), "HTTP request")
}

/// Respond with the status code named in the path.
pub async fn status(State(state): State<AppState>, Path(code): Path<String>, request: Request) -> Response {
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return dump(State(state), request).await.into_response();
    }
    status_reply(&code).into_response()
}

fn status_reply(code: &str) -> Result<(StatusCode, String), DumpError> {
    let unsupported = || DumpError::Input(format!("Status {} is not supported\n", code));

    let status = code
        .parse::<u16>()
        .ok()
        .and_then(|n| StatusCode::from_u16(n).ok())
        .ok_or_else(unsupported)?;
    let reason = status.canonical_reason().ok_or_else(unsupported)?;
    let body = format!("{:03} {}\n", status.as_u16(), reason);

    // 1xx cannot be the final status of a response.
    if status.is_informational() {
        return Ok((StatusCode::OK, body));
    }
    Ok((status, body))
}

/// Set `Content-Type` to whatever the path says.
pub async fn content_type(Path(params): Path<HashMap<String, String>>) -> Result<Response, DumpError> {
    let mut content_type = params.get("major").cloned().unwrap_or_default();
    if let Some(minor) = params.get("minor").filter(|m| !m.is_empty()) {
        content_type.push('/');
        content_type.push_str(minor);
    }

    let value = HeaderValue::from_str(&content_type)
        .map_err(|_| DumpError::Input(format!("{:?} is not a valid header value\n", content_type)))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, value)],
        format!("dummy content for content-type: {}\n", content_type),
    )
        .into_response())
}

/// Basic auth challenge. The dump is written whether or not the
/// credentials match; a mismatch only adds the 401 and the challenge.
pub async fn basic(
    State(state): State<AppState>,
    Path((id, pw)): Path<(String, String)>,
    request: Request,
) -> Result<Response, DumpError> {
    let format = negotiate::for_request(request.uri(), request.headers());
    let authorized = basic_credentials(request.headers())
        .is_some_and(|(user, pass)| user == id && pass == pw);

    let (_, snapshot) = snapshot(request, state.config.limits.max_body_bytes).await?;
    let mut response = present(
        &state.presenter,
        format,
        DUMP_GRAMMAR,
        snapshot.into_string(),
        "HTTP request for restricted area",
    )?;

    if !authorized {
        *response.status_mut() = StatusCode::UNAUTHORIZED;
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_CHALLENGE));
    }
    Ok(response)
}

/// `Authorization: Basic <base64(user:pass)>`, if present and well formed.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

pub async fn fizzbuzz() -> Result<Response, DumpError> {
    Ok(stream_response(StreamPlan::fizzbuzz())?)
}

pub async fn counter() -> Result<Response, DumpError> {
    Ok(stream_response(StreamPlan::counter())?)
}

pub async fn favicon(State(state): State<AppState>) -> Result<Response, DumpError> {
    let icon = state
        .assets
        .get(FAVICON)
        .ok_or_else(|| crate::assets::AssetError::NotFound(FAVICON.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "image/x-icon")], icon.to_vec()).into_response())
}
