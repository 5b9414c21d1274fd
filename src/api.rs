use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::news::types::NewsArticle;
use crate::news::NewsService;
use crate::stats::{ThreatStats, ThreatStatsSimulator};

#[derive(Clone)]
pub struct AppState {
    pub news: Arc<NewsService>,
    pub stats: Arc<ThreatStatsSimulator>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", get(news_list))
        .route("/news/search", get(news_search))
        .route("/news/overview", post(news_overview))
        .route("/news/quota", get(news_quota))
        .route("/stats", get(dashboard_stats))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Bulk article list. `X-Quota-Exhausted` tells the UI whether it is
/// looking at degraded (fallback) content without parsing the body.
async fn news_list(State(state): State<AppState>) -> (HeaderMap, Json<Vec<NewsArticle>>) {
    let items = state.news.fetch_bulk().await;
    let mut headers = HeaderMap::new();
    let exhausted = state.news.is_quota_exhausted();
    headers.insert(
        "X-Quota-Exhausted",
        HeaderValue::from_static(if exhausted { "1" } else { "0" }),
    );
    (headers, Json(items))
}

#[derive(serde::Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    category: Option<String>,
}

async fn news_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<NewsArticle>> {
    let items = state
        .news
        .search(&params.q, params.category.as_deref())
        .await;
    Json(items)
}

#[derive(serde::Serialize)]
struct OverviewResp {
    overview: String,
}

async fn news_overview(
    State(state): State<AppState>,
    Json(article): Json<NewsArticle>,
) -> Json<OverviewResp> {
    let overview = state.news.generate_overview(&article).await;
    Json(OverviewResp { overview })
}

#[derive(serde::Serialize)]
struct QuotaResp {
    exhausted: bool,
}

async fn news_quota(State(state): State<AppState>) -> Json<QuotaResp> {
    Json(QuotaResp {
        exhausted: state.news.is_quota_exhausted(),
    })
}

async fn dashboard_stats(State(state): State<AppState>) -> Json<ThreatStats> {
    Json(state.stats.snapshot())
}
