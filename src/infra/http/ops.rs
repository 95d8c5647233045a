//! Operational endpoints: the content-mutation webhook and a status report.
//!
//! Mounted only when a webhook secret is configured.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use time::OffsetDateTime;
use tracing::debug;

use crate::application::{
    error::HttpError, llms::LlmsService, repos::AccessCount, tracking::AccessTracker,
};
use crate::cache::{CacheTrigger, ContentEvent};

pub const TOKEN_HEADER: &str = "x-llms-txt-token";
pub const EVENT_HEADER: &str = "x-discourse-event";

#[derive(Clone)]
pub struct OpsState {
    pub llms: Arc<LlmsService>,
    pub trigger: Arc<CacheTrigger>,
    pub tracker: AccessTracker,
    secret_digest: Arc<[u8]>,
}

impl OpsState {
    pub fn new(
        llms: Arc<LlmsService>,
        trigger: Arc<CacheTrigger>,
        tracker: AccessTracker,
        secret: &str,
    ) -> Self {
        Self {
            llms,
            trigger,
            tracker,
            secret_digest: hash_secret(secret).into(),
        }
    }

    fn authorizes(&self, token: &str) -> bool {
        self.secret_digest.ct_eq(&hash_secret(token)).unwrap_u8() == 1
    }
}

pub fn build_ops_router(state: OpsState) -> Router {
    Router::new()
        .route("/llms-txt/webhook", post(webhook))
        .route("/llms-txt/status", get(status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

async fn require_token(
    State(state): State<OpsState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|token| state.authorizes(token));

    if !authorized {
        return HttpError::new(
            "infra::http::ops::require_token",
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            "missing or invalid webhook token",
        )
        .into_response();
    }

    next.run(request).await
}

async fn webhook(State(state): State<OpsState>, headers: HeaderMap) -> Response {
    let name = headers
        .get(EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match name.parse::<ContentEvent>() {
        Ok(event) => {
            state.trigger.content_changed(event);
        }
        Err(unhandled) => {
            debug!(event = %unhandled.0, "Ignoring forum event");
        }
    }

    StatusCode::NO_CONTENT.into_response()
}

#[derive(Debug, Serialize)]
struct StatusView {
    enabled: bool,
    allow_indexing: bool,
    #[serde(with = "time::serde::rfc3339")]
    last_updated_at: OffsetDateTime,
    cached: Vec<&'static str>,
    access: Vec<AccessCount>,
}

async fn status(State(state): State<OpsState>) -> Response {
    let access = match state.tracker.counts().await {
        Ok(access) => access,
        Err(err) => {
            return HttpError::from_error(
                "infra::http::ops::status",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            )
            .into_response();
        }
    };

    let config = state.llms.config();
    Json(StatusView {
        enabled: config.enabled,
        allow_indexing: config.allow_indexing,
        last_updated_at: state.llms.last_update_time(),
        cached: state
            .llms
            .cached_keys()
            .into_iter()
            .map(|key| key.as_str())
            .collect(),
        access,
    })
    .into_response()
}

fn hash_secret(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}
