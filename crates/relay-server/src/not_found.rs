use axum::http::Uri;
use axum::response::IntoResponse;
use http::StatusCode;

/// Fallback for every unrouted path
pub async fn not_found_handler(uri: Uri) -> impl IntoResponse {
    tracing::info!(path = %uri.path(), "access to unknown endpoint");
    (StatusCode::NOT_FOUND, "404 Not Found")
}
