//! Command line interface

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tcap_core::OperationPreset;

use crate::config::{AddressConfig, ClientConfig};
use crate::error::Result;

/// MAP operation selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    /// sendRoutingInfoForSM
    SriSm,
    /// cancelLocation
    CancelLocation,
}

impl From<Operation> for OperationPreset {
    fn from(op: Operation) -> Self {
        match op {
            Operation::SriSm => OperationPreset::SendRoutingInfoForSm,
            Operation::CancelLocation => OperationPreset::CancelLocation,
        }
    }
}

/// Send one TCAP Begin inside an SCCP UDT over an M3UA association,
/// then keep the association alive until interrupted
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML configuration file, applied before the flags below
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Signalling gateway as host:port, port 2905 when omitted [default: 127.0.0.1:2905]
    #[arg(short, long)]
    pub addr: Option<String>,

    /// MAP operation to send [default: sri-sm]
    #[arg(long, value_enum)]
    pub operation: Option<Operation>,

    /// Originating transaction ID [default: 0x11111111]
    #[arg(long, value_parser = parse_u32)]
    pub otid: Option<u32>,

    /// Operation code, overrides the operation's own
    #[arg(long)]
    pub opcode: Option<i32>,

    /// Invoke ID, overrides the operation's own
    #[arg(long, allow_hyphen_values = true)]
    pub invoke_id: Option<i32>,

    /// Hex representation of the operation argument
    #[arg(long)]
    pub payload: Option<String>,

    /// Application context version [default: 3]
    #[arg(long)]
    pub acn_version: Option<u8>,

    /// Originating point code [default: 0x11111111]
    #[arg(long, value_parser = parse_u32)]
    pub opc: Option<u32>,

    /// Destination point code [default: 0x22222222]
    #[arg(long, value_parser = parse_u32)]
    pub dpc: Option<u32>,

    /// Signalling link selection [default: 1]
    #[arg(long)]
    pub sls: Option<u8>,

    /// Network indicator [default: 0]
    #[arg(long)]
    pub ni: Option<u8>,

    /// BEAT interval, e.g. 5s or 500ms, 0 disables [default: 5s]
    #[arg(long, value_parser = parse_duration)]
    pub heartbeat_interval: Option<Duration>,

    /// Time allowed for a BEAT ACK [default: 100s]
    #[arg(long, value_parser = parse_duration)]
    pub heartbeat_timeout: Option<Duration>,

    /// Bound on connect and on each handshake step [default: 5s]
    #[arg(long, value_parser = parse_duration)]
    pub connect_timeout: Option<Duration>,

    /// SCCP protocol class, 0 or 1 [default: 0]
    #[arg(long)]
    pub protocol_class: Option<u8>,

    /// Ask for the message to be returned on error [default: true]
    #[arg(long)]
    pub return_on_error: Option<bool>,

    #[command(flatten)]
    pub called: CalledArgs,

    #[command(flatten)]
    pub calling: CallingArgs,
}

/// Called party address overrides
#[derive(clap::Args, Debug)]
pub struct CalledArgs {
    /// Called party address indicator [default: 0x12]
    #[arg(long = "cdpa-indicator", id = "cdpa_indicator", value_parser = parse_u8)]
    pub indicator: Option<u8>,
    /// Called party point code
    #[arg(long = "cdpa-pc", id = "cdpa_pc")]
    pub point_code: Option<u16>,
    /// Called party subsystem number [default: 6]
    #[arg(long = "cdpa-ssn", id = "cdpa_ssn")]
    pub ssn: Option<u8>,
    /// Called party translation type [default: 0]
    #[arg(long = "cdpa-tt", id = "cdpa_tt")]
    pub translation_type: Option<u8>,
    /// Called party numbering plan [default: 1]
    #[arg(long = "cdpa-np", id = "cdpa_np")]
    pub numbering_plan: Option<u8>,
    /// Called party nature of address [default: 4]
    #[arg(long = "cdpa-nai", id = "cdpa_nai")]
    pub nature_of_address: Option<u8>,
    /// Called party global title digits [default: 817085004213]
    #[arg(long = "cdpa-digits", id = "cdpa_digits")]
    pub digits: Option<String>,
}

/// Calling party address overrides
#[derive(clap::Args, Debug)]
pub struct CallingArgs {
    /// Calling party address indicator [default: 0x12]
    #[arg(long = "cgpa-indicator", id = "cgpa_indicator", value_parser = parse_u8)]
    pub indicator: Option<u8>,
    /// Calling party point code
    #[arg(long = "cgpa-pc", id = "cgpa_pc")]
    pub point_code: Option<u16>,
    /// Calling party subsystem number [default: 8]
    #[arg(long = "cgpa-ssn", id = "cgpa_ssn")]
    pub ssn: Option<u8>,
    /// Calling party translation type [default: 0]
    #[arg(long = "cgpa-tt", id = "cgpa_tt")]
    pub translation_type: Option<u8>,
    /// Calling party numbering plan [default: 1]
    #[arg(long = "cgpa-np", id = "cgpa_np")]
    pub numbering_plan: Option<u8>,
    /// Calling party nature of address [default: 4]
    #[arg(long = "cgpa-nai", id = "cgpa_nai")]
    pub nature_of_address: Option<u8>,
    /// Calling party global title digits [default: 817085811860]
    #[arg(long = "cgpa-digits", id = "cgpa_digits")]
    pub digits: Option<String>,
}

macro_rules! apply_address {
    ($args:expr, $address:expr) => {{
        let args = $args;
        let address: &mut AddressConfig = $address;
        if let Some(v) = args.indicator {
            address.indicator = v;
        }
        if let Some(v) = args.point_code {
            address.point_code = v;
        }
        if let Some(v) = args.ssn {
            address.ssn = v;
        }
        if let Some(v) = args.translation_type {
            address.translation_type = v;
        }
        if let Some(v) = args.numbering_plan {
            address.numbering_plan = v;
        }
        if let Some(v) = args.nature_of_address {
            address.nature_of_address = v;
        }
        if let Some(v) = &args.digits {
            address.digits = v.clone();
            address.encoding_scheme = None;
        }
    }};
}

impl Args {
    /// Build the configuration: defaults, then the file, then the flags
    pub fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overlay the flags that were given
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(addr) = &self.addr {
            config.remote_addr = addr.clone();
        }

        let t = &mut config.transaction;
        if let Some(op) = self.operation {
            t.operation = op.into();
        }
        if let Some(otid) = self.otid {
            t.otid = otid;
        }
        if self.opcode.is_some() {
            t.opcode = self.opcode;
        }
        if self.invoke_id.is_some() {
            t.invoke_id = self.invoke_id;
        }
        if self.payload.is_some() {
            t.payload = self.payload.clone();
        }
        if self.acn_version.is_some() {
            t.acn_version = self.acn_version;
        }

        let a = &mut config.association;
        if let Some(opc) = self.opc {
            a.opc = opc;
        }
        if let Some(dpc) = self.dpc {
            a.dpc = dpc;
        }
        if let Some(sls) = self.sls {
            a.sls = sls;
        }
        if let Some(ni) = self.ni {
            a.network_indicator = ni;
        }
        if let Some(d) = self.heartbeat_interval {
            a.heartbeat_interval_ms = d.as_millis() as u64;
        }
        if let Some(d) = self.heartbeat_timeout {
            a.heartbeat_timeout_ms = d.as_millis() as u64;
        }
        if let Some(d) = self.connect_timeout {
            a.connect_timeout_ms = d.as_millis() as u64;
        }

        let d = &mut config.datagram;
        if let Some(class) = self.protocol_class {
            d.protocol_class = class;
        }
        if let Some(roe) = self.return_on_error {
            d.return_on_error = roe;
        }
        apply_address!(&self.called, &mut d.called);
        apply_address!(&self.calling, &mut d.calling);
    }
}

/// Parse a decimal or `0x` prefixed hexadecimal u32
pub fn parse_u32(s: &str) -> std::result::Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}

/// Parse a decimal or `0x` prefixed hexadecimal u8
pub fn parse_u8(s: &str) -> std::result::Result<u8, String> {
    let value = parse_u32(s)?;
    u8::try_from(value).map_err(|_| format!("{} does not fit in one octet", s))
}

/// Parse `500ms`, `5s`, `2m`, or a bare number of seconds
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{}'", s))?;
    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{}' is too large", s)),
        _ => Err(format!("invalid duration unit in '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_u32("0x11111111"), Ok(0x11111111));
        assert_eq!(parse_u32("286331153"), Ok(0x11111111));
        assert!(parse_u32("0xZZ").is_err());
        assert_eq!(parse_u8("0x12"), Ok(0x12));
        assert!(parse_u8("256").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("100"), Ok(Duration::from_secs(100)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert!(parse_duration("5h").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("999999999999999999m").is_err());
    }

    #[test]
    fn test_no_flags_keeps_defaults() {
        let args = Args::parse_from(["sigtran-client"]);
        assert_eq!(args.load_config().unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_flags_override() {
        let args = Args::parse_from([
            "sigtran-client",
            "--addr",
            "192.0.2.1:2905",
            "--operation",
            "cancel-location",
            "--otid",
            "0x01020304",
            "--payload",
            "0401ff",
            "--dpc",
            "0x33",
            "--heartbeat-interval",
            "0",
            "--return-on-error",
            "false",
            "--cdpa-digits",
            "12345",
            "--cgpa-ssn",
            "7",
        ]);
        let config = args.load_config().unwrap();

        assert_eq!(config.remote_addr, "192.0.2.1:2905");
        assert_eq!(config.transaction.operation, OperationPreset::CancelLocation);
        assert_eq!(config.transaction.otid, 0x01020304);
        assert_eq!(config.transaction.payload.as_deref(), Some("0401ff"));
        assert_eq!(config.association.dpc, 0x33);
        assert_eq!(config.association.opc, 0x11111111);
        assert_eq!(config.association_config().heartbeat, None);
        assert!(!config.datagram.return_on_error);
        assert_eq!(config.datagram.called.digits, "12345");
        assert_eq!(config.datagram.called.encoding_scheme, None);
        config.datagram.called.to_routing_address().unwrap();
        assert_eq!(config.datagram.calling.ssn, 7);
        assert_eq!(config.datagram.called.ssn, sccp_core::SSN_HLR);
        assert_eq!(config.datagram.calling.digits, "817085811860");
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
