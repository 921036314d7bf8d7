//! Plain-HTTP listener that only redirects to HTTPS

use axum::{
    http::{header::LOCATION, uri::Authority, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};

/// Build the `https://` URL for a request that arrived over plain HTTP
///
/// Keeps the host from the `Host` header, swaps its port for `https_port`
/// (dropped when 443), and keeps path and query. Returns `None` when the
/// header is not a valid authority or carries userinfo.
pub fn https_location(host: &str, uri: &Uri, https_port: u16) -> Option<String> {
    // Host must be `host[:port]` (RFC 7230 5.4)
    if host.contains('@') {
        return None;
    }

    let authority = host.parse::<Authority>().ok()?;
    let hostname = authority.host();
    if hostname.is_empty() {
        return None;
    }

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    Some(if https_port == 443 {
        format!("https://{}{}", hostname, path_and_query)
    } else {
        format!("https://{}:{}{}", hostname, https_port, path_and_query)
    })
}

async fn redirect(headers: HeaderMap, uri: Uri, https_port: u16) -> Response {
    let location = headers
        .get(axum::http::header::HOST)
        .and_then(|value| value.to_str().ok())
        .and_then(|host| https_location(host, &uri, https_port));

    match location {
        Some(location) => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
        None => (StatusCode::BAD_REQUEST, "Missing or invalid Host header").into_response(),
    }
}

/// Router answering every request with `302 Found` to the HTTPS equivalent
pub fn redirect_router(https_port: u16) -> Router {
    Router::new().fallback(move |headers: HeaderMap, uri: Uri| redirect(headers, uri, https_port))
}
