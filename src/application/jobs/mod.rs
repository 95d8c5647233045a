mod refresh;

pub use refresh::{RefreshContext, RefreshLlmsCacheJob, process_refresh_job};
