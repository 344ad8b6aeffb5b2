//! Transport configuration.
//!
//! The inter-connection delay is part of the wire protocol, not a tuning
//! knob: the server tells the video channel from the control channel by
//! arrival order, and the pause keeps the two connects from racing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the dual-channel TCP transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Server host (the mirroring server listens on loopback).
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Timeout for each TCP connect attempt, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Timeout for the fixed-size handshake reads, in milliseconds.
    ///
    /// Applies only to the 64-byte and 12-byte records; the elementary
    /// stream read that follows is unbounded blocking.
    pub read_timeout_ms: u64,
    /// Minimum pause between the video and control connects, in
    /// milliseconds. A protocol-compliance requirement, never shortened.
    pub handshake_delay_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 27183,
            connect_timeout_ms: 3000,
            read_timeout_ms: 5000,
            handshake_delay_ms: 100,
        }
    }
}

impl TransportConfig {
    /// Creates a configuration for the given endpoint with default timeouts.
    pub fn for_endpoint(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Handshake read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Inter-connection delay as a [`Duration`].
    pub fn handshake_delay(&self) -> Duration {
        Duration::from_millis(self.handshake_delay_ms)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), crate::config::ConfigError> {
        if self.host.is_empty() {
            return Err(crate::config::ConfigError::InvalidEndpoint);
        }
        if self.port == 0 {
            return Err(crate::config::ConfigError::InvalidEndpoint);
        }
        if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 {
            return Err(crate::config::ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = TransportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 27183);
        assert_eq!(config.handshake_delay_ms, 100);
    }

    #[test]
    fn test_zero_port_invalid() {
        let mut config = TransportConfig::default();
        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_host_invalid() {
        let mut config = TransportConfig::default();
        config.host.clear();
        assert!(config.validate().is_err());
    }
}
