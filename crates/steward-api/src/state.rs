//! Shared application state.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use governor::{Quota, RateLimiter};

use steward_core::defaults::EVENT_BUS_CAPACITY;
use steward_core::{EventBus, GenerationBackend};
use steward_db::Database;
use steward_inference::{CompletionSettings, IntentExtractor, ThreadSummarizer};

use crate::config::ServerConfig;
use crate::sessions::SessionStore;

/// Global rate limiter type (direct quota, no keyed bucketing).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Source of the local reference time for date normalization.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub fn local_clock() -> Clock {
    Arc::new(|| chrono::Local::now().naive_local())
}

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub extractor: IntentExtractor,
    pub summarizer: ThreadSummarizer,
    pub sessions: SessionStore,
    pub event_bus: Arc<EventBus>,
    /// None when rate limiting is disabled.
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
    pub clock: Clock,
}

impl AppState {
    pub fn new(
        db: Database,
        backend: Arc<dyn GenerationBackend>,
        settings: CompletionSettings,
        config: &ServerConfig,
    ) -> Self {
        let rate_limiter = if config.rate_limit_enabled {
            NonZeroU32::new(config.rate_limit_requests)
                .zip(Quota::with_period(Duration::from_secs(config.rate_limit_period_secs)))
                .map(|(burst, quota)| Arc::new(RateLimiter::direct(quota.allow_burst(burst))))
        } else {
            None
        };

        Self {
            db,
            extractor: IntentExtractor::new(backend.clone(), settings),
            summarizer: ThreadSummarizer::new(backend, settings),
            sessions: SessionStore::new(config.session_capacity),
            event_bus: Arc::new(EventBus::new(EVENT_BUS_CAPACITY)),
            rate_limiter,
            clock: local_clock(),
        }
    }

    /// Replace the reference clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }
}
