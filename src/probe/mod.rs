//! Endpoint probes
//!
//! A probe performs a single liveness + population check against one game
//! server. Every outcome, including every kind of failure, is a
//! [`ProbeResult`] value; probes never return errors or panic outward.
//!
//! ## Implementations
//!
//! - [`minecraft::JavaStatusProbe`]: the Minecraft Java edition status
//!   exchange ("Server List Ping") over plain TCP, optionally following
//!   `_minecraft._tcp` service records via [`lookup::ServiceLocator`].

pub mod lookup;
pub mod minecraft;
pub mod protocol;

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default port of a Minecraft Java server
pub const DEFAULT_GAME_PORT: u16 = 25565;

/// Outcome of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeResult {
    /// The server answered the status query
    Alive {
        online_players: u32,
        max_players: u32,
    },

    /// The probe failed
    Failed { failure: ProbeFailure },
}

impl ProbeResult {
    pub fn alive(online_players: u32, max_players: u32) -> Self {
        ProbeResult::Alive {
            online_players,
            max_players,
        }
    }

    pub fn failed(failure: ProbeFailure) -> Self {
        ProbeResult::Failed { failure }
    }

    /// Only `Alive` counts as success.
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeResult::Alive { .. })
    }
}

/// Classified probe failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeFailure {
    /// Connection refused, reset or not resolvable
    Unreachable,

    /// No answer within the timeout
    TimedOut,

    /// An answer arrived but could not be parsed
    MalformedResponse,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Unreachable => write!(f, "unreachable"),
            ProbeFailure::TimedOut => write!(f, "timed out"),
            ProbeFailure::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

/// Trait for endpoint probes
///
/// Implementations must bound their own network I/O by a timeout. The
/// monitor additionally wraps each call in a deadline, so a probe that hangs
/// regardless is reported as [`ProbeFailure::TimedOut`].
#[async_trait]
pub trait EndpointProbe: Send + Sync {
    async fn probe(&self, address: &EndpointAddress) -> ProbeResult;
}

/// Parsed `host[:port]` endpoint address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointAddress {
    pub host: String,
    pub port: u16,

    /// `false` when the port was left out and defaulted
    explicit_port: bool,
}

/// Reasons an address string is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("invalid port in address '{0}'")]
    InvalidPort(String),

    #[error("invalid host in address '{0}'")]
    InvalidHost(String),
}

impl EndpointAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            explicit_port: true,
        }
    }

    /// Address without a port; [`DEFAULT_GAME_PORT`] is used unless a
    /// service record says otherwise
    pub fn with_default_port(host: impl Into<String>) -> Self {
        Self {
            explicit_port: false,
            ..Self::new(host, DEFAULT_GAME_PORT)
        }
    }

    pub fn has_explicit_port(&self) -> bool {
        self.explicit_port
    }

    /// Named hosts without a port may publish a `_minecraft._tcp` record
    pub fn wants_service_lookup(&self) -> bool {
        !self.explicit_port && self.host.parse::<IpAddr>().is_err()
    }
}

impl FromStr for EndpointAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        // [v6]:port or [v6]
        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| AddressError::InvalidHost(s.to_string()))?;
            if host.is_empty() {
                return Err(AddressError::InvalidHost(s.to_string()));
            }
            return match tail {
                "" => Ok(Self::with_default_port(host)),
                tail => tail
                    .strip_prefix(':')
                    .and_then(|p| p.parse().ok())
                    .map(|port| Self::new(host, port))
                    .ok_or_else(|| AddressError::InvalidPort(s.to_string())),
            };
        }

        // a bare IPv6 address has several colons and no port
        if s.matches(':').count() > 1 {
            return Ok(Self::with_default_port(s));
        }

        let (host, port) = match s.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| AddressError::InvalidPort(s.to_string()))?;
                (host, Some(port))
            }
            None => (s, None),
        };

        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(AddressError::InvalidHost(s.to_string()));
        }

        Ok(match port {
            Some(port) => Self::new(host, port),
            None => Self::with_default_port(host),
        })
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
