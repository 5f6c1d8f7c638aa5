//! Association configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::TrafficMode;

/// Service indicator of SCCP user data
pub const SI_SCCP: u8 = 3;

/// Default M3UA port (RFC 4666 §1.4.8)
pub const DEFAULT_PORT: u16 = 2905;

/// Heartbeat sub-protocol timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Time between two BEAT messages
    pub interval_ms: u64,

    /// Time allowed for the BEAT ACK of the last BEAT
    pub timeout_ms: u64,
}

impl HeartbeatConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            timeout_ms: 100_000,
        }
    }
}

/// Routing label and timers of one M3UA association
///
/// Built once before connecting and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    /// Originating point code put into every DATA message
    pub originating_point_code: u32,

    /// Destination point code put into every DATA message
    pub destination_point_code: u32,

    pub service_indicator: u8,
    pub network_indicator: u8,
    pub message_priority: u8,
    pub signaling_link_selection: u8,

    /// Traffic mode requested in ASPAC
    pub traffic_mode: TrafficMode,

    pub routing_context: Option<u32>,
    pub asp_identifier: Option<u32>,

    /// Heartbeat timers, `None` disables BEAT
    pub heartbeat: Option<HeartbeatConfig>,

    /// Bound on the TCP connect and on each handshake step
    pub connect_timeout_ms: u64,

    /// Capacity of the write and event queues
    pub queue_capacity: usize,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            originating_point_code: 0,
            destination_point_code: 0,
            service_indicator: SI_SCCP,
            network_indicator: 0,
            message_priority: 0,
            signaling_link_selection: 0,
            traffic_mode: TrafficMode::default(),
            routing_context: None,
            asp_identifier: None,
            heartbeat: None,
            connect_timeout_ms: 5_000,
            queue_capacity: 32,
        }
    }
}

impl AssociationConfig {
    /// Create a configuration with the given routing label
    pub fn new(opc: u32, dpc: u32, si: u8, ni: u8, mp: u8, sls: u8) -> Self {
        Self {
            originating_point_code: opc,
            destination_point_code: dpc,
            service_indicator: si,
            network_indicator: ni,
            message_priority: mp,
            signaling_link_selection: sls,
            ..Default::default()
        }
    }

    /// Enable BEAT with the given interval and timeout
    pub fn enable_heartbeat(mut self, interval: Duration, timeout: Duration) -> Self {
        self.heartbeat = Some(HeartbeatConfig::new(interval, timeout));
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_routing_context(mut self, routing_context: u32) -> Self {
        self.routing_context = Some(routing_context);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = AssociationConfig::new(0x11111111, 0x22222222, SI_SCCP, 0, 0, 1)
            .enable_heartbeat(Duration::from_secs(5), Duration::from_secs(100))
            .with_connect_timeout(Duration::from_millis(250));

        assert_eq!(config.originating_point_code, 0x11111111);
        assert_eq!(config.signaling_link_selection, 1);
        let hb = config.heartbeat.unwrap();
        assert_eq!(hb.interval(), Duration::from_secs(5));
        assert_eq!(hb.timeout(), Duration::from_secs(100));
        assert_eq!(config.connect_timeout(), Duration::from_millis(250));
        assert_eq!(config.traffic_mode, TrafficMode::Loadshare);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let hb = HeartbeatConfig::new(Duration::ZERO, Duration::from_secs(1));
        assert_eq!(hb.interval(), Duration::from_millis(1));
    }
}
