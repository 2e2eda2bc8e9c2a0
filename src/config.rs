//! Per-binary configuration, built from `clap` derive structs layered over
//! `MOSH_KEY` and `MOSH_PREDICTION_DISPLAY` (§10 C9). Validation happens
//! eagerly, before any session exists — this is the one place the crate is
//! allowed to print to stderr and exit directly.

use std::fmt;
use std::ops::RangeInclusive;

use clap::Parser;
use crypto::{Key, KeyParseError};
use predict::{ParseModeError, PredictionMode};

#[derive(Debug)]
pub enum ConfigError {
    InvalidPortRange(String),
    MissingKey,
    InvalidKey(KeyParseError),
    InvalidPredictionMode(ParseModeError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPortRange(s) => write!(f, "invalid --port-range {s:?}, expected LOW-HIGH"),
            ConfigError::MissingKey => write!(f, "MOSH_KEY is not set"),
            ConfigError::InvalidKey(e) => write!(f, "MOSH_KEY is invalid: {e}"),
            ConfigError::InvalidPredictionMode(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidKey(e) => Some(e),
            ConfigError::InvalidPredictionMode(e) => Some(e),
            ConfigError::InvalidPortRange(_) | ConfigError::MissingKey => None,
        }
    }
}

impl From<KeyParseError> for ConfigError {
    fn from(e: KeyParseError) -> Self {
        ConfigError::InvalidKey(e)
    }
}

impl From<ParseModeError> for ConfigError {
    fn from(e: ParseModeError) -> Self {
        ConfigError::InvalidPredictionMode(e)
    }
}

/// `tether-server [--port-range LOW-HIGH] [--mtu N] [--verbose]`.
#[derive(Parser, Debug)]
#[command(name = "tether-server", about = "Roaming terminal transport, server side")]
pub struct ServerConfig {
    /// Inclusive UDP port range to bind the first free port from.
    #[arg(long, default_value = "60000-61000")]
    pub port_range: String,

    #[arg(long, default_value_t = 1500)]
    pub mtu: usize,

    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerConfig {
    pub fn port_range(&self) -> Result<RangeInclusive<u16>, ConfigError> {
        parse_port_range(&self.port_range)
    }

    /// A key from `MOSH_KEY` if set, otherwise a freshly generated one —
    /// the server mints a session key when none is provided.
    pub fn key(&self) -> Result<Key, ConfigError> {
        match std::env::var("MOSH_KEY") {
            Ok(encoded) => Ok(Key::from_base64(&encoded)?),
            Err(_) => Ok(Key::random()),
        }
    }
}

/// `tether-client <host> <port> [--predict adaptive|always|never]`.
#[derive(Parser, Debug)]
#[command(name = "tether-client", about = "Roaming terminal transport, client side")]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,

    #[arg(long, default_value = "adaptive", env = "MOSH_PREDICTION_DISPLAY")]
    pub predict: String,

    #[arg(long, default_value_t = 1500)]
    pub mtu: usize,
}

impl ClientConfig {
    pub fn prediction_mode(&self) -> Result<PredictionMode, ConfigError> {
        Ok(self.predict.parse()?)
    }

    /// The client never generates its own key — without `MOSH_KEY` there is
    /// no way to reach the server it doesn't already share a secret with.
    pub fn key(&self) -> Result<Key, ConfigError> {
        let encoded = std::env::var("MOSH_KEY").map_err(|_| ConfigError::MissingKey)?;
        Ok(Key::from_base64(&encoded)?)
    }
}

fn parse_port_range(s: &str) -> Result<RangeInclusive<u16>, ConfigError> {
    let (low, high) = s.split_once('-').ok_or_else(|| ConfigError::InvalidPortRange(s.to_string()))?;
    let low: u16 = low.trim().parse().map_err(|_| ConfigError::InvalidPortRange(s.to_string()))?;
    let high: u16 = high.trim().parse().map_err(|_| ConfigError::InvalidPortRange(s.to_string()))?;
    if low > high {
        return Err(ConfigError::InvalidPortRange(s.to_string()));
    }
    Ok(low..=high)
}
