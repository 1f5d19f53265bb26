//! Host session managers.
//!
//! A session manager is the object in the host environment that owns the
//! actual connection role (host, server or client). Transports locate one
//! through the [`HostContext`](crate::context::HostContext), attach the
//! backend they drive, and delegate session start to it.

mod local;

pub use local::LocalSessionManager;

use crate::error::SessionError;
use std::fmt;

/// Port used when an address omits one.
pub const DEFAULT_PORT: u16 = 7777;

/// Role of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionRole {
    #[default]
    Idle,
    Host,
    Server,
    Client,
}

impl SessionRole {
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionRole::Idle)
    }

    /// True for roles that own the authoritative game state.
    pub fn is_authority(&self) -> bool {
        matches!(self, SessionRole::Host | SessionRole::Server)
    }
}

impl fmt::Display for SessionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionRole::Idle => "idle",
            SessionRole::Host => "host",
            SessionRole::Server => "server",
            SessionRole::Client => "client",
        };
        f.write_str(name)
    }
}

/// Where a session connects or listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Direct socket address.
    Address { host: String, port: u16 },
    /// Managed relay allocation.
    Relay { allocation_id: String, join_code: String },
    /// External relay lobby id.
    Lobby(String),
}

impl Endpoint {
    /// Parses `host[:port]`, including bracketed IPv6 (`[::1]:7777`).
    pub fn parse_address(input: &str) -> Result<Self, SessionError> {
        let invalid = || SessionError::InvalidAddress(input.to_string());
        let trimmed = input.trim();

        let (host, port) = if let Some(rest) = trimmed.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            match tail {
                "" => (host, None),
                tail => (host, Some(tail.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match trimmed.rsplit_once(':') {
                Some((host, port)) if !host.contains(':') => (host, Some(port)),
                Some(_) => (trimmed, None),
                None => (trimmed, None),
            }
        };

        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let port = match port {
            Some(port) => match port.parse::<u16>() {
                Ok(0) | Err(_) => return Err(invalid()),
                Ok(port) => port,
            },
            None => DEFAULT_PORT,
        };

        Ok(Endpoint::Address {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Address { host, port } if host.contains(':') => write!(f, "[{host}]:{port}"),
            Endpoint::Address { host, port } => write!(f, "{host}:{port}"),
            Endpoint::Relay { join_code, .. } => write!(f, "relay:{join_code}"),
            Endpoint::Lobby(id) => write!(f, "lobby:{id}"),
        }
    }
}

/// The host's network manager.
///
/// Shared between the host environment and the transport, so every method takes
/// `&self`; implementations use interior mutability.
pub trait SessionManager: Send + Sync {
    fn name(&self) -> &str;

    /// Sets the endpoint the next `start_host`/`start_server` listens on.
    fn bind(&self, endpoint: Endpoint);

    fn start_host(&self) -> Result<(), SessionError>;

    fn start_server(&self) -> Result<(), SessionError>;

    fn start_client(&self, endpoint: &Endpoint) -> Result<(), SessionError>;

    /// Ends the current session, if any.
    fn stop(&self);

    fn attach_backend(&self, backend: &str);

    /// Attached backends in attach order.
    fn backends(&self) -> Vec<String>;

    fn has_backend(&self, backend: &str) -> bool;

    fn role(&self) -> SessionRole;

    fn endpoint(&self) -> Option<Endpoint>;

    /// Round-trip time of the active session, if known.
    fn rtt_ms(&self) -> Option<u32>;
}
