//! In-process access counters for deployments without a database.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{AccessCount, AccessRepo, RepoError};
use crate::cache::mutex_lock;

const SOURCE: &str = "infra::memory";

#[derive(Debug, Default)]
pub struct MemoryAccessRepo {
    counters: Mutex<BTreeMap<String, (i64, OffsetDateTime)>>,
}

#[async_trait]
impl AccessRepo for MemoryAccessRepo {
    async fn record_access(&self, route: &str, at: OffsetDateTime) -> Result<(), RepoError> {
        let mut counters = mutex_lock(&self.counters, SOURCE, "record_access");
        let entry = counters.entry(route.to_string()).or_insert((0, at));
        entry.0 += 1;
        entry.1 = entry.1.max(at);
        Ok(())
    }

    async fn list_access_counts(&self) -> Result<Vec<AccessCount>, RepoError> {
        let counters = mutex_lock(&self.counters, SOURCE, "list_access_counts");
        Ok(counters
            .iter()
            .map(|(route, (count, last_access_at))| AccessCount {
                route: route.clone(),
                count: *count,
                last_access_at: Some(*last_access_at),
            })
            .collect())
    }
}
