//! Status monitoring for Minecraft game servers with a Discord front end.
//!
//! The crate is organised around [`monitor::MonitorCore`], which owns the
//! endpoint [`registry`] and the runtime [`monitor::MonitorConfiguration`].
//! A scheduler actor ([`monitor::scheduler`]) drives probe cycles, the
//! [`commands`] layer maps user commands onto the core, and everything that
//! leaves the process goes through the traits in [`sinks`] and [`storage`].

#[cfg(feature = "api")]
pub mod api;
pub mod commands;
pub mod config;
pub mod discord;
pub mod monitor;
pub mod probe;
pub mod registry;
pub mod sinks;
pub mod storage;
pub mod util;

use serde::{Deserialize, Serialize};

/// Identifier of a chat channel (a Discord snowflake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

/// Identifier of a posted chat message (a Discord snowflake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ChannelId {
    /// Chat mention for this channel, e.g. `<#1234>`.
    pub fn mention(&self) -> String {
        format!("<#{}>", self.0)
    }
}
