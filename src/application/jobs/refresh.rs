//! Cron job that rebuilds the cached documents when forum content has moved on.

use std::sync::Arc;

use apalis::prelude::*;

use crate::application::llms::{LlmsService, RefreshOutcome};

/// Marker struct for the cron-triggered refresh job.
/// Must implement `From<chrono::DateTime<chrono::Utc>>` for apalis-cron compatibility.
#[derive(Default, Debug, Clone)]
pub struct RefreshLlmsCacheJob;

impl From<chrono::DateTime<chrono::Utc>> for RefreshLlmsCacheJob {
    fn from(_: chrono::DateTime<chrono::Utc>) -> Self {
        Self
    }
}

/// Context for the refresh job worker.
#[derive(Clone)]
pub struct RefreshContext {
    pub llms: Arc<LlmsService>,
}

/// Process one scheduled tick. Failures are logged and never retried; the
/// next tick tries again.
pub async fn process_refresh_job(
    _job: RefreshLlmsCacheJob,
    ctx: Data<RefreshContext>,
) -> Result<(), apalis::prelude::Error> {
    run_refresh(&ctx.llms).await;
    Ok(())
}

pub(crate) async fn run_refresh(llms: &LlmsService) -> Option<RefreshOutcome> {
    if !llms.config().enabled {
        tracing::debug!("llms.txt generator disabled; skipping refresh");
        return None;
    }

    match llms.refresh_if_stale().await {
        Ok(outcome) => {
            if outcome == RefreshOutcome::Refreshed {
                tracing::info!("Refreshed llms.txt documents");
            }
            Some(outcome)
        }
        Err(err) => {
            tracing::warn!(error = %err, "Failed to refresh llms.txt documents");
            None
        }
    }
}
