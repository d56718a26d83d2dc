//! Static pages served by the API process.

use axum::{response::Html, routing::get, Router};

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");
const DASHBOARD_HTML: &str = include_str!("../static/dashboard.html");

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/dashboard", get(|| async { Html(DASHBOARD_HTML) }))
}
