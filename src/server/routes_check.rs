//! The check endpoint: resolve a media query to handles.

use axum::{extract::State, routing::post, Json, Router};

use crate::error::Result;
use crate::model::{ResolutionRequest, ResolvedMedia};
use crate::server::AppContext;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/check", post(check))
}

/// `POST /api/check`
///
/// Validation runs before any cache or engine work; a malformed body never
/// reaches the resolver.
async fn check(
    State(ctx): State<AppContext>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ResolvedMedia>> {
    let req = ResolutionRequest::from_value(&body)?;
    let media = ctx.resolver.check(&req).await?;
    Ok(Json(media))
}
