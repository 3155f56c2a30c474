//! Service configuration loaded from the environment.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{Context as _, anyhow};
use chrono::{FixedOffset, Offset, Utc};

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// Variable holding the listen port.
pub const PORT_VAR: &str = "HOMEGUARD_PORT";

/// Variable holding the bind address.
pub const BIND_VAR: &str = "HOMEGUARD_BIND";

/// Variable holding the local UTC offset, in minutes, used for night hours.
pub const UTC_OFFSET_VAR: &str = "HOMEGUARD_UTC_OFFSET_MINUTES";

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    /// Offset of the home's local time from UTC.
    pub utc_offset: FixedOffset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            utc_offset: Utc.fix(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset variables fall back to defaults; set but invalid ones are errors.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup(PORT_VAR) {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("{PORT_VAR} must be a port number, got {port:?}"))?;
        }

        if let Some(bind) = lookup(BIND_VAR) {
            config.bind = bind
                .trim()
                .parse()
                .with_context(|| format!("{BIND_VAR} must be an IP address, got {bind:?}"))?;
        }

        if let Some(minutes) = lookup(UTC_OFFSET_VAR) {
            let minutes: i32 = minutes
                .trim()
                .parse()
                .with_context(|| format!("{UTC_OFFSET_VAR} must be an integer, got {minutes:?}"))?;
            config.utc_offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| anyhow!("{UTC_OFFSET_VAR} out of range: {minutes}"))?;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
