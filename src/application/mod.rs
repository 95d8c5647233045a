//! Application services layer: document generation, caching policy and access tracking.

pub mod documents;
pub mod error;
pub mod format;
pub mod freshness;
pub mod jobs;
pub mod llms;
pub mod repos;
pub mod settings;
pub mod tracking;
