//! Worker-side configuration, analogous to
//! `infrastructure::app_settings::AppSettings`: a plain settings struct
//! constructible from explicit fields, no network config needed.

use serde::{Deserialize, Serialize};

fn default_helper_recursion_limit() -> u32 {
    64
}

fn default_command_history_len() -> usize {
    1000
}

/// Worker-side runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Default for `State::auto_collect_events` on a fresh load.
    auto_collect_events: bool,

    /// Set via `setSpoilerTestMode`; surfaced for callers (e.g. the spoiler
    /// replay harness) that want to branch on whether a session is running
    /// in test mode. The command itself only acks.
    spoiler_test_mode: bool,

    /// Bound on the per-command state-transition history.
    #[serde(default = "default_command_history_len")]
    command_history_len: usize,

    /// Helper call recursion guard.
    #[serde(default = "default_helper_recursion_limit")]
    helper_recursion_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_collect_events: true,
            spoiler_test_mode: false,
            command_history_len: default_command_history_len(),
            helper_recursion_limit: default_helper_recursion_limit(),
        }
    }
}

impl EngineConfig {
    pub fn auto_collect_events(&self) -> bool {
        self.auto_collect_events
    }

    pub fn spoiler_test_mode(&self) -> bool {
        self.spoiler_test_mode
    }

    pub fn command_history_len(&self) -> usize {
        self.command_history_len
    }

    pub fn helper_recursion_limit(&self) -> u32 {
        self.helper_recursion_limit
    }

    pub fn with_auto_collect_events(mut self, enabled: bool) -> Self {
        self.auto_collect_events = enabled;
        self
    }

    pub fn with_spoiler_test_mode(mut self, enabled: bool) -> Self {
        self.spoiler_test_mode = enabled;
        self
    }

    pub fn with_command_history_len(mut self, len: usize) -> Self {
        self.command_history_len = len;
        self
    }

    pub fn with_helper_recursion_limit(mut self, limit: u32) -> Self {
        self.helper_recursion_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_suggested_values() {
        let config = EngineConfig::default();
        assert!(config.auto_collect_events());
        assert!(!config.spoiler_test_mode());
        assert_eq!(config.command_history_len(), 1000);
        assert_eq!(config.helper_recursion_limit(), 64);
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = EngineConfig::default().with_auto_collect_events(false).with_helper_recursion_limit(8);
        assert!(!config.auto_collect_events());
        assert_eq!(config.helper_recursion_limit(), 8);
    }
}
