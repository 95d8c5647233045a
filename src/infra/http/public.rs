use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_TYPE, LINK},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::{
    documents::{DocumentKind, GeneratedDocument},
    error::LlmsError,
    llms::{EntityDocument, LlmsService},
    tracking::AccessTracker,
};

use super::middleware::require_available;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const DOCUMENT_SUFFIX: &str = "/llms.txt";

#[derive(Clone)]
pub struct HttpState {
    pub llms: Arc<LlmsService>,
    pub tracker: AccessTracker,
}

pub fn build_public_router(state: HttpState) -> Router {
    Router::new()
        .route("/llms.txt", get(navigation))
        .route("/llms-full.txt", get(full_content))
        .route("/sitemaps.txt", get(sitemap))
        .route("/c/{*path}", get(category))
        .route("/t/{slug}/{id}/llms.txt", get(topic))
        .route("/tag/{name}/llms.txt", get(tag))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_available,
        ))
        .with_state(state)
}

async fn navigation(State(state): State<HttpState>) -> Response {
    state.tracker.track(DocumentKind::Navigation.route_key());
    document_response(state.llms.navigation().await)
}

async fn full_content(State(state): State<HttpState>) -> Response {
    state.tracker.track(DocumentKind::FullContent.route_key());
    document_response(state.llms.full_content().await)
}

async fn sitemap(State(state): State<HttpState>) -> Response {
    state.tracker.track(DocumentKind::Sitemap.route_key());
    document_response(state.llms.sitemap().await)
}

async fn category(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    state.tracker.track(DocumentKind::Category.route_key());
    let Some(category_path) = path.strip_suffix(DOCUMENT_SUFFIX) else {
        return LlmsError::NotFound.into_response();
    };
    entity_response(state.llms.category(category_path).await)
}

async fn topic(
    State(state): State<HttpState>,
    Path((_slug, id)): Path<(String, String)>,
) -> Response {
    state.tracker.track(DocumentKind::Topic.route_key());
    let Ok(id) = id.parse::<i64>() else {
        return LlmsError::NotFound.into_response();
    };
    entity_response(state.llms.topic(id).await)
}

async fn tag(State(state): State<HttpState>, Path(name): Path<String>) -> Response {
    state.tracker.track(DocumentKind::Tag.route_key());
    entity_response(state.llms.tag(&name).await)
}

fn document_response(result: Result<GeneratedDocument, LlmsError>) -> Response {
    match result {
        Ok(document) => text_response(document.body, None),
        Err(err) => err.into_response(),
    }
}

fn entity_response(result: Result<EntityDocument, LlmsError>) -> Response {
    match result {
        Ok(entity) => text_response(entity.document.body, Some(&entity.canonical_url)),
        Err(err) => err.into_response(),
    }
}

fn text_response(body: String, canonical_url: Option<&str>) -> Response {
    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, TEXT_PLAIN)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());

    if let Some(url) = canonical_url
        && let Ok(value) = HeaderValue::from_str(&format!("<{url}>; rel=\"canonical\""))
    {
        response.headers_mut().insert(LINK, value);
    }

    response
}
