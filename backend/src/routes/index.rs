use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::AppState;

/// Serve the cached index page, answering 304 when the client already
/// holds the current version
pub async fn serve_index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let page = match state.index_page.load().await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(
                "Index page unavailable at {}: {}",
                state.index_page.path().display(),
                e
            );
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| page.matches(value));

    let cache_headers = [
        (header::ETAG, page.etag.clone()),
        (header::LAST_MODIFIED, page.last_modified_header()),
    ];

    if not_modified {
        return (StatusCode::NOT_MODIFIED, cache_headers).into_response();
    }

    (
        StatusCode::OK,
        cache_headers,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        page.body,
    )
        .into_response()
}
