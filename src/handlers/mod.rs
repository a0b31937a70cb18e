mod auth;
mod health;
mod records;

pub use auth::*;
pub use health::*;
pub use records::*;

use axum::{http::StatusCode, Json};
use serde_json::json;

/// Fallback for unmatched routes
pub async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" })))
}
