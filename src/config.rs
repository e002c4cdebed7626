use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60; // 24 hours in seconds
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60; // ten years
pub const DEFAULT_COURSE_NAME: &str = "도레미파이썬";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },

    #[error("{name} must be at most {max}, got {value}")]
    OutOfRange { name: &'static str, value: u64, max: u64 },

    #[error("invalid listen address {0:?}")]
    Address(String),
}

/// Server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub session_ttl: Duration,
    pub course_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            course_name: DEFAULT_COURSE_NAME.to_string(),
        }
    }
}

impl Config {
    /// Read settings from `SCRIPT_BOARD_*` variables, then apply positional
    /// `[host] [port]` overrides
    ///
    /// # Arguments
    /// * `lookup` - Environment lookup, `std::env::var(..).ok()` in the binary
    /// * `args` - Command line arguments without the program name
    ///
    /// # Errors
    /// * `ConfigError::NotANumber` if the port or TTL does not parse
    /// * `ConfigError::OutOfRange` if the TTL exceeds [`MAX_SESSION_TTL_SECS`]
    pub fn load<F>(lookup: F, args: &[String]) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup("SCRIPT_BOARD_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("SCRIPT_BOARD_PORT") {
            config.port = parse_number("SCRIPT_BOARD_PORT", &port)?;
        }
        if let Some(ttl) = lookup("SCRIPT_BOARD_SESSION_TTL_SECS") {
            let secs: u64 = parse_number("SCRIPT_BOARD_SESSION_TTL_SECS", &ttl)?;
            if secs > MAX_SESSION_TTL_SECS {
                return Err(ConfigError::OutOfRange {
                    name: "SCRIPT_BOARD_SESSION_TTL_SECS",
                    value: secs,
                    max: MAX_SESSION_TTL_SECS,
                });
            }
            config.session_ttl = Duration::from_secs(secs);
        }
        if let Some(course) = lookup("SCRIPT_BOARD_COURSE_NAME") {
            config.course_name = course;
        }

        if let Some(host) = args.first() {
            config.host = host.clone();
        }
        if let Some(port) = args.get(1) {
            config.port = parse_number("port", port)?;
        }

        Ok(config)
    }

    /// Socket address to bind; the host must be an IP literal
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::Address(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotANumber {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env_or_args() {
        let config = Config::load(env(&[]), &[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn env_then_args() {
        let config = Config::load(
            env(&[
                ("SCRIPT_BOARD_HOST", "0.0.0.0"),
                ("SCRIPT_BOARD_PORT", "8080"),
                ("SCRIPT_BOARD_SESSION_TTL_SECS", "60"),
                ("SCRIPT_BOARD_COURSE_NAME", "Rust 101"),
            ]),
            &["::1".to_string()],
        )
        .unwrap();

        assert_eq!(config.host, "::1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert_eq!(config.course_name, "Rust 101");
        assert_eq!(config.addr().unwrap().to_string(), "[::1]:8080");
    }

    #[test]
    fn bad_port_is_reported() {
        let err = Config::load(env(&[("SCRIPT_BOARD_PORT", "http")]), &[]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotANumber {
                name: "SCRIPT_BOARD_PORT",
                value: "http".to_string()
            }
        );
    }

    #[test]
    fn oversized_ttl_is_reported() {
        let err = Config::load(
            env(&[("SCRIPT_BOARD_SESSION_TTL_SECS", u64::MAX.to_string().as_str())]),
            &[],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::OutOfRange {
                name: "SCRIPT_BOARD_SESSION_TTL_SECS",
                value: u64::MAX,
                max: MAX_SESSION_TTL_SECS
            }
        );

        let ok = Config::load(
            env(&[("SCRIPT_BOARD_SESSION_TTL_SECS", MAX_SESSION_TTL_SECS.to_string().as_str())]),
            &[],
        )
        .unwrap();
        assert_eq!(ok.session_ttl, Duration::from_secs(MAX_SESSION_TTL_SECS));
    }

    #[test]
    fn bad_host_fails_addr() {
        let config = Config {
            host: "not a host".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.addr(), Err(ConfigError::Address(_))));
    }
}
