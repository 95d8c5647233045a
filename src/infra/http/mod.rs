mod middleware;
mod ops;
mod public;

pub use ops::{EVENT_HEADER, OpsState, TOKEN_HEADER, build_ops_router};
pub use public::{HttpState, build_public_router};

use axum::{Router, middleware as axum_middleware};

use middleware::{log_responses, set_request_context};

/// Public llms.txt routes plus, when configured, the operational routes.
pub fn build_router(http: HttpState, ops: Option<OpsState>) -> Router {
    let router = build_public_router(http);
    let router = match ops {
        Some(ops) => router.merge(build_ops_router(ops)),
        None => router,
    };

    router
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
