use axum::{
    routing::post,
    Router,
    extract::{rejection::JsonRejection, Json, State},
    response::Response,
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{Result, AppError};
use crate::api::models::SummaryRequest;
use crate::llm::{open_completion_stream, CompletionPayload};
use crate::relay::relay_completion;
use crate::scraper::{fetch_html, extract_article, build_prompt};
use crate::source::ensure_source_article;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/summarize", post(summarize_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

/// Fetches the article, builds the prompt and relays the completion stream as
/// the response body. Any failure before streaming starts is a 500.
async fn summarize_handler(
    State(state): State<AppState>,
    req: std::result::Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(req) = req?;
    let url = req.url().ok_or(AppError::MissingUrl)?;
    ensure_source_article(url)?;
    info!(%url, "summarizing article");

    let start_time = std::time::Instant::now();
    let html = fetch_html(&state.http, url).await?;
    let article = extract_article(&html)?;
    info!(chars = article.text.len(), "extracted article text");

    let payload = CompletionPayload::new(build_prompt(&article.text));
    let upstream = open_completion_stream(&state.http, &state.config, &payload).await?;
    info!(elapsed = ?start_time.elapsed(), "completion stream opened");

    Ok(relay_completion(upstream))
}
