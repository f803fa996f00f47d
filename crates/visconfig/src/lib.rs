//! Device configuration surface.
//!
//! Parses a small INI-style file (`key = value`, `#`/`;` comments,
//! optional section headers) into the typed options the client consumes.
//!
//! # Example
//!
//! ```no_run
//! use visconfig::DeviceConfig;
//!
//! let config = DeviceConfig::from_file("safevisionary.conf").unwrap();
//! assert_eq!(config.control_port, 2122);
//! ```

use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected `key = value`")]
    Malformed { line: usize },

    #[error("invalid value for {option}: {value}")]
    InvalidValue { option: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn invalid(option: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        option,
        value: value.to_owned(),
    }
}

/// Longest accepted client identifier for the CoLa 2 session handshake.
pub const MAX_CLIENT_ID_LEN: usize = 32;

/// Recognized options with their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Receive deadline on both control and data transports, seconds.
    pub transport_timeout_s: u64,
    /// Idle timeout negotiated at CoLa 2 session open, seconds.
    pub session_timeout_s: u8,
    /// ASCII client identifier sent in the session open.
    pub client_id: String,
    /// Local port the blob datagram stream is bound to.
    pub udp_port: u16,
    /// Device port of the TCP blob stream.
    pub tcp_stream_port: u16,
    /// Device address of the control channel.
    pub control_host: String,
    /// 2112 selects CoLa B framing, 2122 CoLa 2.
    pub control_port: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            transport_timeout_s: 5,
            session_timeout_s: 5,
            client_id: "client".to_owned(),
            udp_port: 6060,
            tcp_stream_port: 2114,
            control_host: "192.168.1.10".to_owned(),
            control_port: 2122,
        }
    }
}

impl DeviceConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config = DeviceConfig::default();

        for (index, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or(ConfigError::Malformed { line: index + 1 })?;
            config.apply(key.trim(), value.trim())?;
        }

        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "transport_timeout_s" => {
                self.transport_timeout_s = value
                    .parse()
                    .map_err(|_| invalid("transport_timeout_s", value))?;
            }
            "session_timeout_s" => {
                self.session_timeout_s = value
                    .parse()
                    .map_err(|_| invalid("session_timeout_s", value))?;
            }
            "client_id" => self.client_id = value.to_owned(),
            "udp_port" => {
                self.udp_port = value.parse().map_err(|_| invalid("udp_port", value))?;
            }
            "tcp_stream_port" => {
                self.tcp_stream_port = value
                    .parse()
                    .map_err(|_| invalid("tcp_stream_port", value))?;
            }
            "control_host" => self.control_host = value.to_owned(),
            "control_port" => {
                self.control_port = value.parse().map_err(|_| invalid("control_port", value))?;
            }
            // Unknown keys are ignored so configs can be shared with other
            // tooling.
            _ => {}
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty()
            || self.client_id.len() > MAX_CLIENT_ID_LEN
            || !self.client_id.is_ascii()
        {
            return Err(invalid("client_id", &self.client_id));
        }
        if !self.control_host.is_ascii() || self.control_host.is_empty() {
            return Err(invalid("control_host", &self.control_host));
        }
        if self.control_port != 2112 && self.control_port != 2122 {
            return Err(invalid("control_port", &self.control_port.to_string()));
        }
        Ok(())
    }

    pub fn transport_timeout(&self) -> Duration {
        Duration::from_secs(self.transport_timeout_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DeviceConfig::default();
        config.validate().unwrap();
        assert_eq!(config.transport_timeout_s, 5);
        assert_eq!(config.session_timeout_s, 5);
        assert_eq!(config.control_port, 2122);
    }

    #[test]
    fn parses_keys_sections_and_comments() {
        let config = DeviceConfig::parse(
            "# safeVisionary2 bench setup\n\
             [device]\n\
             control_host = 10.0.0.42\n\
             control_port = 2112\n\
             client_id = bench\n\
             ; data stream\n\
             udp_port = 5005\n\
             session_timeout_s = 10\n",
        )
        .unwrap();

        assert_eq!(config.control_host, "10.0.0.42");
        assert_eq!(config.control_port, 2112);
        assert_eq!(config.client_id, "bench");
        assert_eq!(config.udp_port, 5005);
        assert_eq!(config.session_timeout_s, 10);
        // Untouched keys keep their defaults.
        assert_eq!(config.tcp_stream_port, 2114);
    }

    #[test]
    fn rejects_malformed_lines_and_values() {
        assert!(matches!(
            DeviceConfig::parse("control_host\n"),
            Err(ConfigError::Malformed { line: 1 })
        ));
        assert!(matches!(
            DeviceConfig::parse("udp_port = seventy\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_out_of_contract_values() {
        assert!(DeviceConfig::parse("control_port = 2113\n").is_err());
        let long_id = format!("client_id = {}\n", "x".repeat(40));
        assert!(DeviceConfig::parse(&long_id).is_err());
        assert!(DeviceConfig::parse("client_id = \n").is_err());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = DeviceConfig::parse("future_option = 1\n").unwrap();
        assert_eq!(config, DeviceConfig::default());
    }
}
