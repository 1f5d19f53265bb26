//! Network configuration handed to the service at start-up.
//!
//! The record is loaded once by the host application (usually from the
//! `[network]` table of its TOML file) and treated as read-only afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which transport the host application asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Best available direct-socket backend.
    #[default]
    Auto,
    DirectSocketPrimary,
    DirectSocketAlternate,
    SessionRelayExternal,
    SessionRelayManaged,
}

impl TransportKind {
    pub const ALL: [TransportKind; 5] = [
        TransportKind::Auto,
        TransportKind::DirectSocketPrimary,
        TransportKind::DirectSocketAlternate,
        TransportKind::SessionRelayExternal,
        TransportKind::SessionRelayManaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Auto => "auto",
            TransportKind::DirectSocketPrimary => "direct_socket_primary",
            TransportKind::DirectSocketAlternate => "direct_socket_alternate",
            TransportKind::SessionRelayExternal => "session_relay_external",
            TransportKind::SessionRelayManaged => "session_relay_managed",
        }
    }

    /// Relay kinds take a join code or lobby id in `start_client`.
    pub fn is_relay(&self) -> bool {
        matches!(
            self,
            TransportKind::SessionRelayExternal | TransportKind::SessionRelayManaged
        )
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "auto" => Ok(TransportKind::Auto),
            "direct_socket_primary" | "primary" | "tcp" => Ok(TransportKind::DirectSocketPrimary),
            "direct_socket_alternate" | "alternate" | "kcp" => {
                Ok(TransportKind::DirectSocketAlternate)
            }
            "session_relay_external" | "relay_external" | "external" => {
                Ok(TransportKind::SessionRelayExternal)
            }
            "session_relay_managed" | "relay_managed" | "managed" => {
                Ok(TransportKind::SessionRelayManaged)
            }
            _ => Err(format!(
                "Unknown transport kind: {s}. Must be one of: {:?}",
                TransportKind::ALL.map(|kind| kind.as_str())
            )),
        }
    }
}

/// Which anti-cheat provider the host application asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiCheatKind {
    None,
    #[default]
    DefaultValidation,
    Shield,
    Guard,
    SteamVac,
    EasyAntiCheat,
    #[serde(rename = "battleye")]
    BattlEye,
}

impl AntiCheatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AntiCheatKind::None => "none",
            AntiCheatKind::DefaultValidation => "default_validation",
            AntiCheatKind::Shield => "shield",
            AntiCheatKind::Guard => "guard",
            AntiCheatKind::SteamVac => "steam_vac",
            AntiCheatKind::EasyAntiCheat => "easy_anti_cheat",
            AntiCheatKind::BattlEye => "battleye",
        }
    }
}

impl fmt::Display for AntiCheatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys that can flip the diagnostics overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyCode {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    #[default]
    F9,
    F10,
    F11,
    F12,
    BackQuote,
    Insert,
}

impl FromStr for KeyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s.trim().to_ascii_uppercase().as_str() {
            "F1" => KeyCode::F1,
            "F2" => KeyCode::F2,
            "F3" => KeyCode::F3,
            "F4" => KeyCode::F4,
            "F5" => KeyCode::F5,
            "F6" => KeyCode::F6,
            "F7" => KeyCode::F7,
            "F8" => KeyCode::F8,
            "F9" => KeyCode::F9,
            "F10" => KeyCode::F10,
            "F11" => KeyCode::F11,
            "F12" => KeyCode::F12,
            "`" | "BACKQUOTE" => KeyCode::BackQuote,
            "INSERT" => KeyCode::Insert,
            other => return Err(format!("Unknown key: {other}")),
        };
        Ok(key)
    }
}

fn default_max_relay_connections() -> u32 {
    8
}

fn default_true() -> bool {
    true
}

/// Immutable-after-load network settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub transport_kind: TransportKind,
    #[serde(default)]
    pub anti_cheat_kind: AntiCheatKind,
    /// Peers a managed relay allocation accepts
    #[serde(default = "default_max_relay_connections")]
    pub max_relay_connections: u32,
    /// Optional pre-shared join code for relay clients
    #[serde(default)]
    pub join_code: String,
    #[serde(default = "default_true")]
    pub show_diagnostics_overlay: bool,
    #[serde(default)]
    pub toggle_key: KeyCode,
    /// Attach the session backend to the host's session manager if missing
    #[serde(default = "default_true")]
    pub auto_attach_backend: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            transport_kind: TransportKind::default(),
            anti_cheat_kind: AntiCheatKind::default(),
            max_relay_connections: default_max_relay_connections(),
            join_code: String::new(),
            show_diagnostics_overlay: true,
            toggle_key: KeyCode::default(),
            auto_attach_backend: true,
        }
    }
}

impl NetworkConfig {
    pub const MAX_RELAY_CONNECTIONS: u32 = 100;

    /// Validates the configuration for consistency.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=Self::MAX_RELAY_CONNECTIONS).contains(&self.max_relay_connections) {
            return Err(format!(
                "max_relay_connections must be between 1 and {}, got {}",
                Self::MAX_RELAY_CONNECTIONS,
                self.max_relay_connections
            ));
        }

        if !self.join_code.is_empty() {
            let len = self.join_code.len();
            let alphanumeric = self.join_code.chars().all(|c| c.is_ascii_alphanumeric());
            if !(6..=12).contains(&len) || !alphanumeric {
                return Err(format!(
                    "Invalid join code: {}. Must be 6-12 alphanumeric characters",
                    self.join_code
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_config_default() {
        let config = NetworkConfig::default();

        assert_eq!(config.transport_kind, TransportKind::Auto);
        assert_eq!(config.anti_cheat_kind, AntiCheatKind::DefaultValidation);
        assert_eq!(config.max_relay_connections, 8);
        assert!(config.join_code.is_empty());
        assert!(config.show_diagnostics_overlay);
        assert_eq!(config.toggle_key, KeyCode::F9);
        assert!(config.auto_attach_backend);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: NetworkConfig = toml::from_str(
            r#"
transport_kind = "session_relay_managed"
anti_cheat_kind = "easy_anti_cheat"
"#,
        )
        .unwrap();

        assert_eq!(config.transport_kind, TransportKind::SessionRelayManaged);
        assert_eq!(config.anti_cheat_kind, AntiCheatKind::EasyAntiCheat);
        assert_eq!(config.max_relay_connections, 8);
        assert_eq!(config.toggle_key, KeyCode::F9);
    }

    #[test]
    fn test_toml_roundtrip_keeps_fields() {
        let config = NetworkConfig {
            transport_kind: TransportKind::DirectSocketAlternate,
            anti_cheat_kind: AntiCheatKind::None,
            max_relay_connections: 16,
            join_code: "ABC123".to_string(),
            show_diagnostics_overlay: false,
            toggle_key: KeyCode::F3,
            auto_attach_backend: false,
        };

        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("direct_socket_alternate"));

        let parsed: NetworkConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_relay_connection_bounds() {
        let mut config = NetworkConfig::default();

        config.max_relay_connections = 0;
        assert!(config.validate().unwrap_err().contains("max_relay_connections"));

        config.max_relay_connections = 101;
        assert!(config.validate().is_err());

        config.max_relay_connections = 1;
        assert!(config.validate().is_ok());
        config.max_relay_connections = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_join_code() {
        let mut config = NetworkConfig::default();

        for bad in ["ABC", "ABCDEFGHIJKLM", "ABC-12", "ABC 12"] {
            config.join_code = bad.to_string();
            assert!(config.validate().is_err(), "'{}' should be rejected", bad);
        }

        for good in ["ABC123", "abcdef", "ABCDEFGHIJKL"] {
            config.join_code = good.to_string();
            assert!(config.validate().is_ok(), "'{}' should be accepted", good);
        }
    }

    #[test]
    fn test_transport_kind_from_str() {
        assert_eq!("auto".parse::<TransportKind>(), Ok(TransportKind::Auto));
        assert_eq!("TCP".parse::<TransportKind>(), Ok(TransportKind::DirectSocketPrimary));
        assert_eq!(
            "session-relay-managed".parse::<TransportKind>(),
            Ok(TransportKind::SessionRelayManaged)
        );
        assert!("carrier-pigeon".parse::<TransportKind>().is_err());

        for kind in TransportKind::ALL {
            assert_eq!(kind.as_str().parse::<TransportKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_relay_kinds() {
        assert!(TransportKind::SessionRelayManaged.is_relay());
        assert!(TransportKind::SessionRelayExternal.is_relay());
        assert!(!TransportKind::Auto.is_relay());
    }

    #[test]
    fn test_key_code_from_str() {
        assert_eq!("f9".parse::<KeyCode>(), Ok(KeyCode::F9));
        assert_eq!("`".parse::<KeyCode>(), Ok(KeyCode::BackQuote));
        assert!("Space".parse::<KeyCode>().is_err());
    }
}
