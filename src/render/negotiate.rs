//! Raw text or rendered page, decided per request.
//!
//! This is a debug convenience, not `Accept` header negotiation: a `plain`
//! query or a command-line client gets the text as-is.

use axum::http::{header, HeaderMap, Uri};

/// User-agent prefixes of command-line HTTP clients.
pub const CLI_AGENTS: &[&str] = &["curl/", "Wget/", "HTTPie/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The text itself, no HTML.
    Raw,
    /// Highlighted, line-numbered HTML page.
    Rendered,
}

pub fn negotiate(query: Option<&str>, user_agent: Option<&str>) -> OutputFormat {
    if query.is_some_and(|q| q.contains("plain")) {
        return OutputFormat::Raw;
    }
    if user_agent.is_some_and(|ua| CLI_AGENTS.iter().any(|agent| ua.starts_with(agent))) {
        return OutputFormat::Raw;
    }
    OutputFormat::Rendered
}

/// [`negotiate`] on a request's URI and headers.
pub fn for_request(uri: &Uri, headers: &HeaderMap) -> OutputFormat {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());
    negotiate(uri.query(), user_agent)
}
