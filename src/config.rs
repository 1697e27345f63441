//! IMAP connection configuration

use crate::error::{Error, Result};
use std::env;

/// Port used when the server address carries none (IMAPS).
pub const DEFAULT_PORT: u16 = 993;

/// How the connection is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// TLS from the first byte.
    #[default]
    Tls,
    /// Plain TCP, upgraded with STARTTLS before LOGIN.
    StartTls,
}

/// IMAP connection configuration
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub security: Security,
    pub accept_invalid_certs: bool,
}

impl ImapConfig {
    /// Build a configuration from a `host[:port]` server address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the address cannot be parsed.
    pub fn new(
        server: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let (host, port) = parse_server(server)?;
        Ok(Self {
            host,
            port,
            username: username.into(),
            password: password.into(),
            security: Security::default(),
            accept_invalid_certs: false,
        })
    }

    #[must_use]
    pub const fn with_security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Skip certificate verification (self-signed servers).
    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// The `host:port` string handed to the TCP connector.
    #[must_use]
    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Split a `host[:port]` address. IPv6 hosts must be bracketed when a
/// port is given (`[::1]:993`).
///
/// # Errors
///
/// Returns [`Error::Config`] for an empty host or an invalid port.
pub fn parse_server(server: &str) -> Result<(String, u16)> {
    let server = server.trim();

    let (host, port) = if let Some(rest) = server.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| Error::Config(format!("Invalid server address: {server}")))?;
        match tail.strip_prefix(':') {
            Some(port) => (host, Some(port)),
            None if tail.is_empty() => (host, None),
            None => return Err(Error::Config(format!("Invalid server address: {server}"))),
        }
    } else {
        match server.rsplit_once(':') {
            // Unbracketed IPv6 without a port
            Some((host, _)) if host.contains(':') => (server, None),
            Some((host, port)) => (host, Some(port)),
            None => (server, None),
        }
    };

    if host.is_empty() {
        return Err(Error::Config(format!("Missing host in server address: {server}")));
    }

    let port = match port {
        Some(p) => p
            .parse()
            .map_err(|e| Error::Config(format!("Invalid port '{p}': {e}")))?,
        None => DEFAULT_PORT,
    };

    Ok((host.to_string(), port))
}

/// Resolve a mandatory parameter from its command-line value, falling
/// back to the environment (including a `.env` file loaded by the
/// caller). Empty values count as missing.
///
/// # Errors
///
/// Returns [`Error::Config`] naming the flag if no value is found.
pub fn require(value: Option<String>, env_key: &str, flag: &str) -> Result<String> {
    value
        .or_else(|| env::var(env_key).ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("Missing mandatory '-{flag}' parameter")))
}
