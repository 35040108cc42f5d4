//! Proxy-side configuration: timeouts, grace period, and
//! the engine configuration the worker is started with, analogous to
//! `infrastructure::app_settings::AppSettings`.

use std::time::Duration;

use tracker_engine::EngineConfig;

/// Tunables for the proxy's request/response bookkeeping.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// How long a `query`/command waits for a worker response before
    /// giving up and returning `ProxyError::Timeout` to the caller. The
    /// pending entry itself survives this long again afterward, in case
    /// the worker answers late.
    pub request_timeout: Duration,

    /// How long a late response, or a timed-out pending entry with no
    /// response at all, is kept around after the request timeout elapses
    /// before the periodic cleanup discards it for good.
    pub late_response_grace_period: Duration,

    /// How often the background cleanup sweep runs.
    pub cleanup_interval: Duration,

    /// How many deleted query ids to remember, so a response that arrives
    /// for an id that's already been cleaned up can be recognised as
    /// genuinely late (vs. simply unknown) and routed to the late-response
    /// buffer instead of being logged as a protocol error.
    pub deleted_history_len: usize,

    /// Engine configuration the spawned worker is constructed with.
    pub engine: EngineConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            late_response_grace_period: Duration::from_secs(5),
            cleanup_interval: Duration::from_secs(10),
            deleted_history_len: 256,
            engine: EngineConfig::default(),
        }
    }
}

impl ProxyConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_late_response_grace_period(mut self, grace: Duration) -> Self {
        self.late_response_grace_period = grace;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane_for_interactive_use() {
        let config = ProxyConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.late_response_grace_period, Duration::from_secs(5));
        assert_eq!(config.cleanup_interval, Duration::from_secs(10));
    }
}
