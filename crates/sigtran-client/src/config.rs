//! Client configuration
//!
//! A [`ClientConfig`] is assembled once at startup from the built-in
//! defaults, an optional TOML file and the command line, then only read.
//! Durations in the file are given in milliseconds.
//!
//! ```toml
//! remote_addr = "10.0.0.5:2905"
//!
//! [transaction]
//! operation = "cancel-location"
//! otid = 0x01020304
//!
//! [datagram.called]
//! digits = "817085004213"
//!
//! [association]
//! heartbeat_interval_ms = 5000
//! heartbeat_timeout_ms = 100000
//! ```

use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use m3ua_transport::{AssociationConfig, HeartbeatConfig, TrafficMode, DEFAULT_PORT, SI_SCCP};
use sccp_core::{encoding_scheme_for, RoutingAddress, SSN_HLR, SSN_MSC};
use serde::{Deserialize, Serialize};
use tcap_core::OperationPreset;

use crate::error::{ClientError, Result};

/// Default gateway host, on the M3UA port
pub const DEFAULT_REMOTE_HOST: &str = "127.0.0.1";

/// Transaction layer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// MAP operation to invoke
    pub operation: OperationPreset,

    /// Originating transaction ID of the Begin
    pub otid: u32,

    /// Overrides the preset's operation code
    pub opcode: Option<i32>,

    /// Overrides the preset's invoke ID
    pub invoke_id: Option<i32>,

    /// Hex encoded operation argument, overrides the preset's sample
    pub payload: Option<String>,

    /// Application context version, 3 when unset
    pub acn_version: Option<u8>,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            operation: OperationPreset::default(),
            otid: 0x11111111,
            opcode: None,
            invoke_id: None,
            payload: None,
            acn_version: None,
        }
    }
}

/// One SCCP party address, as raw Q.713 fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressConfig {
    /// Address indicator octet, selects the fields below that are encoded
    pub indicator: u8,
    pub point_code: u16,
    pub ssn: u8,
    pub translation_type: u8,
    pub numbering_plan: u8,
    /// Derived from the digit count when unset
    pub encoding_scheme: Option<u8>,
    pub nature_of_address: u8,
    pub digits: String,
}

impl AddressConfig {
    /// HLR global title address used as the default called party
    pub fn default_called() -> Self {
        Self {
            indicator: 0x12,
            point_code: 0,
            ssn: SSN_HLR,
            translation_type: 0,
            numbering_plan: 1,
            encoding_scheme: None,
            nature_of_address: 4,
            digits: "817085004213".to_string(),
        }
    }

    /// MSC global title address used as the default calling party
    pub fn default_calling() -> Self {
        Self {
            ssn: SSN_MSC,
            digits: "817085811860".to_string(),
            ..Self::default_called()
        }
    }

    pub fn to_routing_address(&self) -> Result<RoutingAddress> {
        Ok(RoutingAddress::from_indicator(
            self.indicator,
            self.point_code,
            self.ssn,
            self.translation_type,
            self.numbering_plan,
            self.encoding_scheme
                .unwrap_or_else(|| encoding_scheme_for(&self.digits)),
            self.nature_of_address,
            &self.digits,
        )?)
    }
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self::default_called()
    }
}

/// SCCP layer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatagramConfig {
    pub protocol_class: u8,
    pub return_on_error: bool,
    pub called: AddressConfig,
    pub calling: AddressConfig,
}

impl Default for DatagramConfig {
    fn default() -> Self {
        Self {
            protocol_class: 0,
            return_on_error: true,
            called: AddressConfig::default_called(),
            calling: AddressConfig::default_calling(),
        }
    }
}

/// M3UA layer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationSettings {
    pub opc: u32,
    pub dpc: u32,
    pub service_indicator: u8,
    pub network_indicator: u8,
    pub message_priority: u8,
    pub sls: u8,
    pub traffic_mode: TrafficMode,
    pub routing_context: Option<u32>,
    pub asp_identifier: Option<u32>,

    /// BEAT period, 0 disables heartbeats
    pub heartbeat_interval_ms: u64,
    pub heartbeat_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for AssociationSettings {
    fn default() -> Self {
        Self {
            opc: 0x11111111,
            dpc: 0x22222222,
            service_indicator: SI_SCCP,
            network_indicator: 0,
            message_priority: 0,
            sls: 1,
            traffic_mode: TrafficMode::default(),
            routing_context: None,
            asp_identifier: None,
            heartbeat_interval_ms: 5_000,
            heartbeat_timeout_ms: 100_000,
            connect_timeout_ms: 5_000,
        }
    }
}

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Gateway as `host:port`, or a bare host on the M3UA port
    pub remote_addr: String,

    /// Period of the idle loop's beat log line
    pub beat_log_interval_ms: u64,

    pub transaction: TransactionConfig,
    pub datagram: DatagramConfig,
    pub association: AssociationSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote_addr: format!("{}:{}", DEFAULT_REMOTE_HOST, DEFAULT_PORT),
            beat_log_interval_ms: 5_000,
            transaction: TransactionConfig::default(),
            datagram: DatagramConfig::default(),
            association: AssociationSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Load a TOML file on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ClientError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ClientError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reject values no layer would accept before touching the network
    pub fn validate(&self) -> Result<()> {
        if self.remote_addr.is_empty() {
            return Err(ClientError::Config("remote address is empty".to_string()));
        }
        if self.beat_log_interval_ms == 0 {
            return Err(ClientError::Config(
                "beat log interval must be positive".to_string(),
            ));
        }
        let hb = &self.association;
        if hb.heartbeat_interval_ms > 0 && hb.heartbeat_timeout_ms == 0 {
            return Err(ClientError::Config(
                "heartbeat timeout must be positive when heartbeats are enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Address to dial, with the M3UA port added when none is given
    pub fn remote_endpoint(&self) -> String {
        let addr = self.remote_addr.trim();
        if addr.parse::<SocketAddr>().is_ok() {
            return addr.to_string();
        }
        if let Ok(ip) = addr.parse::<IpAddr>() {
            return SocketAddr::new(ip, DEFAULT_PORT).to_string();
        }
        match addr.rsplit_once(':') {
            Some((_, port)) if port.parse::<u16>().is_ok() => addr.to_string(),
            _ => format!("{}:{}", addr, DEFAULT_PORT),
        }
    }

    pub fn beat_log_interval(&self) -> Duration {
        Duration::from_millis(self.beat_log_interval_ms)
    }

    /// Association configuration handed to the M3UA session
    pub fn association_config(&self) -> AssociationConfig {
        let a = &self.association;
        let mut config = AssociationConfig::new(
            a.opc,
            a.dpc,
            a.service_indicator,
            a.network_indicator,
            a.message_priority,
            a.sls,
        )
        .with_connect_timeout(Duration::from_millis(a.connect_timeout_ms));
        config.traffic_mode = a.traffic_mode;
        config.routing_context = a.routing_context;
        config.asp_identifier = a.asp_identifier;
        if a.heartbeat_interval_ms > 0 {
            config.heartbeat = Some(HeartbeatConfig {
                interval_ms: a.heartbeat_interval_ms,
                timeout_ms: a.heartbeat_timeout_ms,
            });
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sccp_core::GlobalTitle;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.remote_addr, "127.0.0.1:2905");
        assert_eq!(config.transaction.otid, 0x11111111);
        assert_eq!(config.transaction.operation, OperationPreset::SendRoutingInfoForSm);
        assert!(config.datagram.return_on_error);
        assert_eq!(config.datagram.calling.ssn, 8);
        config.validate().unwrap();

        let assoc = config.association_config();
        assert_eq!(assoc.originating_point_code, 0x11111111);
        assert_eq!(assoc.destination_point_code, 0x22222222);
        assert_eq!(assoc.service_indicator, SI_SCCP);
        assert_eq!(assoc.signaling_link_selection, 1);
        let hb = assoc.heartbeat.unwrap();
        assert_eq!(hb.interval(), Duration::from_secs(5));
        assert_eq!(hb.timeout(), Duration::from_secs(100));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            remote_addr = "10.0.0.5:2905"

            [transaction]
            operation = "cancel-location"
            otid = 0x01020304

            [datagram.calling]
            ssn = 7
            digits = "4930"

            [association]
            heartbeat_interval_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.remote_addr, "10.0.0.5:2905");
        assert_eq!(config.transaction.operation, OperationPreset::CancelLocation);
        assert_eq!(config.transaction.otid, 0x01020304);
        assert_eq!(config.datagram.called, AddressConfig::default_called());
        assert_eq!(config.datagram.calling.ssn, 7);
        assert_eq!(config.datagram.calling.indicator, 0x12);
        assert_eq!(config.association.dpc, 0x22222222);
        assert_eq!(config.association_config().heartbeat, None);
    }

    #[test]
    fn test_file_digits_pick_encoding_scheme() {
        let config = ClientConfig::from_toml_str(
            r#"
            [datagram.called]
            digits = "12345"
            "#,
        )
        .unwrap();
        assert_eq!(config.datagram.called.encoding_scheme, None);
        let called = config.datagram.called.to_routing_address().unwrap();
        match &called.global_title {
            Some(GlobalTitle::Full { es, .. }) => assert_eq!(*es, 1),
            other => panic!("unexpected {:?}", other),
        }
        called.to_bytes().unwrap();

        let config = ClientConfig::from_toml_str(
            r#"
            [datagram.called]
            digits = "12345"
            encoding_scheme = 2
            "#,
        )
        .unwrap();
        assert!(config.datagram.called.to_routing_address().unwrap().to_bytes().is_err());
    }

    #[test]
    fn test_remote_endpoint_adds_default_port() {
        let mut config = ClientConfig::default();
        assert_eq!(config.remote_endpoint(), "127.0.0.1:2905");

        config.remote_addr = "10.0.0.5".to_string();
        assert_eq!(config.remote_endpoint(), "10.0.0.5:2905");

        config.remote_addr = "sgw.example.net".to_string();
        assert_eq!(config.remote_endpoint(), "sgw.example.net:2905");

        config.remote_addr = "sgw.example.net:3565".to_string();
        assert_eq!(config.remote_endpoint(), "sgw.example.net:3565");

        config.remote_addr = "::1".to_string();
        assert_eq!(config.remote_endpoint(), "[::1]:2905");
    }

    #[test]
    fn test_sri_sm_alias() {
        let config = ClientConfig::from_toml_str("[transaction]\noperation = \"sri-sm\"\n").unwrap();
        assert_eq!(config.transaction.operation, OperationPreset::SendRoutingInfoForSm);
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        let err = ClientConfig::from_toml_str("[transaction]\noperation = \"purge-ms\"\n").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ClientConfig::from_file(Path::new("/nonexistent/sigtran-client.toml")).unwrap_err();
        assert!(matches!(err, ClientError::ConfigFile { .. }));
    }

    #[test]
    fn test_validate() {
        let mut config = ClientConfig::default();
        config.association.heartbeat_timeout_ms = 0;
        assert!(config.validate().is_err());

        config.association.heartbeat_interval_ms = 0;
        config.validate().unwrap();
    }
}
