//! Command-line interface handling for the netkit host.
//!
//! Flags override the matching settings of the configuration file.

use clap::Parser;
use netkit_service::TransportKind;
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Parser, Debug, Clone)]
#[command(name = "netkit", author, version, about = "Headless host for the netkit network service")]
pub struct CliArgs {
    /// Configuration file path
    ///
    /// If the file doesn't exist, a default configuration will be created.
    #[arg(short, long, default_value = "netkit.toml")]
    pub config: PathBuf,

    /// Transport to use (auto, tcp, kcp, relay-external, relay-managed)
    #[arg(short, long)]
    pub transport: Option<TransportKind>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,

    /// Start a listen-server session
    #[arg(long, conflicts_with_all = ["server", "client"])]
    pub host: bool,

    /// Start a dedicated server session
    #[arg(long, conflicts_with = "client")]
    pub server: bool,

    /// Join a session by address (host[:port]) or relay join code
    ///
    /// Without a value the join code from the configuration file is used.
    #[arg(long, value_name = "ADDR_OR_CODE", num_args = 0..=1, default_missing_value = "")]
    pub client: Option<String>,
}

/// The session the host should start once the service is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStart {
    Host,
    Server,
    Client(String),
}

impl CliArgs {
    pub fn session_start(&self) -> Option<SessionStart> {
        if self.host {
            Some(SessionStart::Host)
        } else if self.server {
            Some(SessionStart::Server)
        } else {
            self.client.clone().map(SessionStart::Client)
        }
    }
}
