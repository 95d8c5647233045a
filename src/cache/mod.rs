//! Document cache.
//!
//! Memoizes the three expensive site-wide documents (navigation, full
//! content, sitemap) with a time-based expiry, and invalidates them when the
//! forum reports a content mutation.

mod clock;
mod config;
mod events;
mod keys;
mod lock;
mod store;
mod trigger;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use events::{ContentEvent, UnhandledEvent};
pub use keys::{CacheKey, DOCUMENT_KEYS};
pub(crate) use lock::{mutex_lock, rw_read, rw_write};
pub use store::{CacheEntry, DocumentCache};
pub use trigger::CacheTrigger;
