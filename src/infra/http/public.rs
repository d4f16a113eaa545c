use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::{
    error::HttpError, fast_category::FastCategoryLoader, repos::ContentSource,
    request_cache::RequestCache, site_data::SiteDataService, syndication::SyndicationService,
};

use super::middleware::{log_responses, set_request_context, with_request_cache};

const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

#[derive(Clone)]
pub struct HttpState {
    pub source: Arc<dyn ContentSource>,
    pub fast: Arc<FastCategoryLoader>,
    pub syndication: Arc<SyndicationService>,
}

pub fn build_router(state: HttpState) -> Router {
    // Page data routes read through a per-request cache.
    let page_routes = Router::new()
        .route("/api/index", get(index_page))
        .route("/api/categories/{id}", get(category_page))
        .route("/api/posts/{slug}", get(post_page))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            with_request_cache,
        ));

    let direct_routes = Router::new()
        .route("/api/categories/{id}/fast", get(fast_category_page))
        .route("/rss.xml", get(rss_feed))
        .route("/js/{*path}", get(crate::infra::assets::serve_script))
        .route("/_health", get(health));

    page_routes
        .merge(direct_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn index_page(Extension(cache): Extension<Arc<RequestCache>>) -> Response {
    Json(SiteDataService::new(&cache).index_page_data().await).into_response()
}

async fn category_page(
    Extension(cache): Extension<Arc<RequestCache>>,
    Path(id): Path<String>,
) -> Response {
    Json(SiteDataService::new(&cache).category_page_data(&id).await).into_response()
}

async fn post_page(
    Extension(cache): Extension<Arc<RequestCache>>,
    Path(slug): Path<String>,
) -> Response {
    match SiteDataService::new(&cache).post_page_data(&slug).await {
        Some(data) => Json(data).into_response(),
        None => HttpError::new(
            "infra::http::public::post_page",
            StatusCode::NOT_FOUND,
            "Post not found",
            format!("no post with slug `{slug}`"),
        )
        .into_response(),
    }
}

async fn fast_category_page(State(state): State<HttpState>, Path(id): Path<String>) -> Response {
    Json(state.fast.category_page_data(&id).await).into_response()
}

async fn rss_feed(State(state): State<HttpState>) -> Response {
    match state.syndication.rss_feed().await {
        Ok(body) => xml_response(body, RSS_CONTENT_TYPE),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found() -> Response {
    HttpError::new(
        "infra::http::public::fallback",
        StatusCode::NOT_FOUND,
        "Not found",
        "no route matched",
    )
    .into_response()
}

fn xml_response(body: String, content_type: &str) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
