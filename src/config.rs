//! Protocol configuration.
//!
//! All durations are expressed in logical ticks (see [`crate::clock`]), not
//! wall-clock time. The invariants between the windows are enforced by
//! [`ProtocolConfig::validate`] before a node is allowed to start.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::membership::types::PeerId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("t_fail must be at least one tick")]
    ZeroFailWindow,
    #[error("t_cleanup ({t_cleanup}) must be greater than t_fail ({t_fail})")]
    CleanupWindow { t_fail: u64, t_cleanup: u64 },
    #[error("join_retry_base must be at least one tick")]
    ZeroRetryBase,
    #[error("max_join_attempts must be at least one")]
    ZeroJoinAttempts,
}

/// Tunables of the membership protocol.
///
/// `t_cleanup` must be strictly greater than `t_fail`: a silent peer is first
/// excluded from gossip fanout, and only after the additional grace period is
/// it forgotten entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// The well-known rendezvous member. The node holding this identity
    /// seeds the group; every other node joins through it.
    pub rendezvous: PeerId,
    /// Ticks of silence before a peer is dropped from gossip fanout.
    #[serde(default = "default_t_fail")]
    pub t_fail: u64,
    /// Ticks of silence before a peer is evicted from the table.
    #[serde(default = "default_t_cleanup")]
    pub t_cleanup: u64,
    /// Base backoff, in ticks, between join request attempts. The wait
    /// doubles per attempt, plus a random jitter of up to one base window.
    #[serde(default = "default_join_retry_base")]
    pub join_retry_base: u64,
    /// Join attempts before start-up is declared failed.
    #[serde(default = "default_max_join_attempts")]
    pub max_join_attempts: u32,
}

fn default_t_fail() -> u64 {
    5
}

fn default_t_cleanup() -> u64 {
    12
}

fn default_join_retry_base() -> u64 {
    2
}

fn default_max_join_attempts() -> u32 {
    5
}

impl ProtocolConfig {
    /// A configuration with default windows and the given rendezvous member.
    pub fn new(rendezvous: PeerId) -> Self {
        Self {
            rendezvous,
            t_fail: default_t_fail(),
            t_cleanup: default_t_cleanup(),
            join_retry_base: default_join_retry_base(),
            max_join_attempts: default_max_join_attempts(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.t_fail == 0 {
            return Err(ConfigError::ZeroFailWindow);
        }
        if self.t_cleanup <= self.t_fail {
            return Err(ConfigError::CleanupWindow {
                t_fail: self.t_fail,
                t_cleanup: self.t_cleanup,
            });
        }
        if self.join_retry_base == 0 {
            return Err(ConfigError::ZeroRetryBase);
        }
        if self.max_join_attempts == 0 {
            return Err(ConfigError::ZeroJoinAttempts);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_windows_are_valid() {
        let config = ProtocolConfig::new(PeerId::new(1, 0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn cleanup_must_exceed_fail_window() {
        let mut config = ProtocolConfig::new(PeerId::new(1, 0));
        config.t_fail = 10;
        config.t_cleanup = 10;

        assert_eq!(
            config.validate(),
            Err(ConfigError::CleanupWindow {
                t_fail: 10,
                t_cleanup: 10
            })
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: ProtocolConfig =
            serde_json::from_str(r#"{"rendezvous":{"host":2130706433,"port":5000}}"#).unwrap();

        assert_eq!(config.rendezvous, PeerId::new(2130706433, 5000));
        assert_eq!(config.t_fail, 5);
        assert_eq!(config.t_cleanup, 12);
        assert!(config.validate().is_ok());
    }
}
