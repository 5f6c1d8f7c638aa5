//! M3UA message encoding (RFC 4666 §3.1)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |    Version    |   Reserved    | Message Class | Message Type  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Message Length                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The message length covers the header and all parameters including
//! padding, so a stream of messages is self-delimiting.

pub mod params;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;
use params::{
    find, parse_all, Parameter, ProtocolData, TAG_ASP_IDENTIFIER, TAG_ERROR_CODE,
    TAG_HEARTBEAT_DATA, TAG_PROTOCOL_DATA, TAG_ROUTING_CONTEXT, TAG_STATUS,
    TAG_TRAFFIC_MODE_TYPE,
};

/// Protocol version carried in every header
pub const VERSION: u8 = 1;
/// Common header size
pub const HEADER_LEN: usize = 8;
/// Upper bound on accepted frames
pub const MAX_MESSAGE_LEN: usize = 64 * 1024;

pub const CLASS_MGMT: u8 = 0;
pub const CLASS_TRANSFER: u8 = 1;
pub const CLASS_ASPSM: u8 = 3;
pub const CLASS_ASPTM: u8 = 4;

pub const MGMT_ERR: u8 = 0;
pub const MGMT_NTFY: u8 = 1;
pub const TRANSFER_DATA: u8 = 1;
pub const ASPSM_ASPUP: u8 = 1;
pub const ASPSM_ASPDN: u8 = 2;
pub const ASPSM_BEAT: u8 = 3;
pub const ASPSM_ASPUP_ACK: u8 = 4;
pub const ASPSM_ASPDN_ACK: u8 = 5;
pub const ASPSM_BEAT_ACK: u8 = 6;
pub const ASPTM_ASPAC: u8 = 1;
pub const ASPTM_ASPIA: u8 = 2;
pub const ASPTM_ASPAC_ACK: u8 = 3;
pub const ASPTM_ASPIA_ACK: u8 = 4;

/// Traffic mode type of ASPAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrafficMode {
    Override,
    #[default]
    Loadshare,
    Broadcast,
}

impl TrafficMode {
    pub fn value(&self) -> u32 {
        match self {
            TrafficMode::Override => 1,
            TrafficMode::Loadshare => 2,
            TrafficMode::Broadcast => 3,
        }
    }

    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            1 => Some(TrafficMode::Override),
            2 => Some(TrafficMode::Loadshare),
            3 => Some(TrafficMode::Broadcast),
            _ => None,
        }
    }
}

/// M3UA messages this stack sends or understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Error { code: u32 },
    Notify { status_type: u16, status_info: u16 },
    Data {
        routing_context: Option<u32>,
        protocol_data: ProtocolData,
    },
    AspUp { asp_identifier: Option<u32> },
    AspUpAck,
    AspDown,
    AspDownAck,
    Heartbeat { data: Bytes },
    HeartbeatAck { data: Bytes },
    AspActive {
        traffic_mode: Option<TrafficMode>,
        routing_context: Option<u32>,
    },
    AspActiveAck {
        traffic_mode: Option<TrafficMode>,
        routing_context: Option<u32>,
    },
    AspInactive,
    AspInactiveAck,
    /// Any class/type this stack does not interpret
    Other { class: u8, kind: u8, body: Bytes },
}

impl Message {
    /// Message class and type of the header
    pub fn class_and_type(&self) -> (u8, u8) {
        match self {
            Message::Error { .. } => (CLASS_MGMT, MGMT_ERR),
            Message::Notify { .. } => (CLASS_MGMT, MGMT_NTFY),
            Message::Data { .. } => (CLASS_TRANSFER, TRANSFER_DATA),
            Message::AspUp { .. } => (CLASS_ASPSM, ASPSM_ASPUP),
            Message::AspUpAck => (CLASS_ASPSM, ASPSM_ASPUP_ACK),
            Message::AspDown => (CLASS_ASPSM, ASPSM_ASPDN),
            Message::AspDownAck => (CLASS_ASPSM, ASPSM_ASPDN_ACK),
            Message::Heartbeat { .. } => (CLASS_ASPSM, ASPSM_BEAT),
            Message::HeartbeatAck { .. } => (CLASS_ASPSM, ASPSM_BEAT_ACK),
            Message::AspActive { .. } => (CLASS_ASPTM, ASPTM_ASPAC),
            Message::AspActiveAck { .. } => (CLASS_ASPTM, ASPTM_ASPAC_ACK),
            Message::AspInactive => (CLASS_ASPTM, ASPTM_ASPIA),
            Message::AspInactiveAck => (CLASS_ASPTM, ASPTM_ASPIA_ACK),
            Message::Other { class, kind, .. } => (*class, *kind),
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Message::Error { .. } => "ERR",
            Message::Notify { .. } => "NTFY",
            Message::Data { .. } => "DATA",
            Message::AspUp { .. } => "ASPUP",
            Message::AspUpAck => "ASPUP ACK",
            Message::AspDown => "ASPDN",
            Message::AspDownAck => "ASPDN ACK",
            Message::Heartbeat { .. } => "BEAT",
            Message::HeartbeatAck { .. } => "BEAT ACK",
            Message::AspActive { .. } => "ASPAC",
            Message::AspActiveAck { .. } => "ASPAC ACK",
            Message::AspInactive => "ASPIA",
            Message::AspInactiveAck => "ASPIA ACK",
            Message::Other { .. } => "unknown",
        }
    }

    fn parameters(&self) -> Vec<Parameter> {
        let mut params = Vec::new();
        match self {
            Message::Error { code } => {
                params.push(Parameter::from_u32(TAG_ERROR_CODE, *code));
            }
            Message::Notify {
                status_type,
                status_info,
            } => {
                let mut value = BytesMut::with_capacity(4);
                value.put_u16(*status_type);
                value.put_u16(*status_info);
                params.push(Parameter::new(TAG_STATUS, value.freeze()));
            }
            Message::Data {
                routing_context,
                protocol_data,
            } => {
                if let Some(rc) = routing_context {
                    params.push(Parameter::from_u32(TAG_ROUTING_CONTEXT, *rc));
                }
                params.push(protocol_data.to_parameter());
            }
            Message::AspUp { asp_identifier } => {
                if let Some(id) = asp_identifier {
                    params.push(Parameter::from_u32(TAG_ASP_IDENTIFIER, *id));
                }
            }
            Message::Heartbeat { data } | Message::HeartbeatAck { data } => {
                params.push(Parameter::new(TAG_HEARTBEAT_DATA, data.clone()));
            }
            Message::AspActive {
                traffic_mode,
                routing_context,
            }
            | Message::AspActiveAck {
                traffic_mode,
                routing_context,
            } => {
                if let Some(mode) = traffic_mode {
                    params.push(Parameter::from_u32(TAG_TRAFFIC_MODE_TYPE, mode.value()));
                }
                if let Some(rc) = routing_context {
                    params.push(Parameter::from_u32(TAG_ROUTING_CONTEXT, *rc));
                }
            }
            Message::AspUpAck
            | Message::AspDown
            | Message::AspDownAck
            | Message::AspInactive
            | Message::AspInactiveAck
            | Message::Other { .. } => {}
        }
        params
    }

    /// Size on the wire, or why the message cannot be encoded
    pub fn encoded_len(&self) -> Result<usize, CodecError> {
        self.checked_len(&self.parameters())
    }

    fn checked_len(&self, params: &[Parameter]) -> Result<usize, CodecError> {
        let body_len = match self {
            Message::Other { body, .. } => body.len(),
            _ => {
                for param in params {
                    param.length_field()?;
                }
                params.iter().map(Parameter::encoded_len).sum()
            }
        };
        let total = HEADER_LEN + body_len;
        if total > MAX_MESSAGE_LEN {
            return Err(CodecError::MessageTooLong(total));
        }
        Ok(total)
    }

    /// Serialize header and parameters
    ///
    /// Nothing is written to `buf` when the message cannot be encoded.
    pub fn serialize(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let (class, kind) = self.class_and_type();
        let params = self.parameters();
        let total = self.checked_len(&params)?;

        buf.reserve(total);
        buf.put_u8(VERSION);
        buf.put_u8(0);
        buf.put_u8(class);
        buf.put_u8(kind);
        buf.put_u32(total as u32);
        if let Message::Other { body, .. } = self {
            buf.put_slice(body);
        }
        for param in &params {
            param.serialize(buf)?;
        }
        Ok(())
    }

    /// Encode to a standalone buffer
    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::new();
        self.serialize(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Parse one complete message
    pub fn parse(mut frame: Bytes) -> Result<Self, CodecError> {
        if frame.remaining() < HEADER_LEN {
            return Err(CodecError::BufferTooSmall {
                required: HEADER_LEN,
                available: frame.remaining(),
            });
        }
        let version = frame.get_u8();
        if version != VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let _reserved = frame.get_u8();
        let class = frame.get_u8();
        let kind = frame.get_u8();
        let length = frame.get_u32();
        let body_len = (length as usize)
            .checked_sub(HEADER_LEN)
            .ok_or(CodecError::InvalidLength(length))?;
        if frame.remaining() < body_len {
            return Err(CodecError::BufferTooSmall {
                required: body_len,
                available: frame.remaining(),
            });
        }
        let body = frame.split_to(body_len);

        let known = matches!(
            (class, kind),
            (CLASS_MGMT, MGMT_ERR | MGMT_NTFY)
                | (CLASS_TRANSFER, TRANSFER_DATA)
                | (CLASS_ASPSM, ASPSM_ASPUP..=ASPSM_BEAT_ACK)
                | (CLASS_ASPTM, ASPTM_ASPAC..=ASPTM_ASPIA_ACK)
        );
        if !known {
            return Ok(Message::Other { class, kind, body });
        }

        let params = parse_all(body)?;
        let u32_param = |tag| find(&params, tag).map(Parameter::as_u32).transpose();
        let required = |tag| find(&params, tag).ok_or(CodecError::MissingParameter(tag));

        let message = match (class, kind) {
            (CLASS_MGMT, MGMT_ERR) => Message::Error {
                code: required(TAG_ERROR_CODE)?.as_u32()?,
            },
            (CLASS_MGMT, _) => {
                let status = required(TAG_STATUS)?.as_u32()?;
                Message::Notify {
                    status_type: (status >> 16) as u16,
                    status_info: status as u16,
                }
            }
            (CLASS_TRANSFER, _) => Message::Data {
                routing_context: u32_param(TAG_ROUTING_CONTEXT)?,
                protocol_data: ProtocolData::from_parameter(required(TAG_PROTOCOL_DATA)?)?,
            },
            (CLASS_ASPSM, ASPSM_ASPUP) => Message::AspUp {
                asp_identifier: u32_param(TAG_ASP_IDENTIFIER)?,
            },
            (CLASS_ASPSM, ASPSM_ASPUP_ACK) => Message::AspUpAck,
            (CLASS_ASPSM, ASPSM_ASPDN) => Message::AspDown,
            (CLASS_ASPSM, ASPSM_ASPDN_ACK) => Message::AspDownAck,
            (CLASS_ASPSM, ASPSM_BEAT) => Message::Heartbeat {
                data: heartbeat_data(&params),
            },
            (CLASS_ASPSM, _) => Message::HeartbeatAck {
                data: heartbeat_data(&params),
            },
            (CLASS_ASPTM, ASPTM_ASPAC) | (CLASS_ASPTM, ASPTM_ASPAC_ACK) => {
                let traffic_mode = u32_param(TAG_TRAFFIC_MODE_TYPE)?.and_then(TrafficMode::from_value);
                let routing_context = u32_param(TAG_ROUTING_CONTEXT)?;
                if kind == ASPTM_ASPAC {
                    Message::AspActive {
                        traffic_mode,
                        routing_context,
                    }
                } else {
                    Message::AspActiveAck {
                        traffic_mode,
                        routing_context,
                    }
                }
            }
            (CLASS_ASPTM, ASPTM_ASPIA) => Message::AspInactive,
            _ => Message::AspInactiveAck,
        };
        Ok(message)
    }
}

fn heartbeat_data(params: &[Parameter]) -> Bytes {
    find(params, TAG_HEARTBEAT_DATA)
        .map(|p| p.value.clone())
        .unwrap_or_default()
}

/// Frames M3UA messages on a byte stream
#[derive(Debug, Clone, Default)]
pub struct M3uaCodec;

impl Decoder for M3uaCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, CodecError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }
        let length = u32::from_be_bytes([src[4], src[5], src[6], src[7]]);
        let len = length as usize;
        if len < HEADER_LEN || len > MAX_MESSAGE_LEN {
            return Err(CodecError::InvalidLength(length));
        }
        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }
        let frame = src.split_to(len).freeze();
        Message::parse(frame).map(Some)
    }
}

impl Encoder<Message> for M3uaCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), CodecError> {
        item.serialize(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspup_bytes() {
        let bytes = Message::AspUp {
            asp_identifier: None,
        }
        .to_bytes()
        .unwrap();
        assert_eq!(&bytes[..], &[0x01, 0x00, 0x03, 0x01, 0x00, 0x00, 0x00, 0x08]);
    }

    #[test]
    fn test_beat_bytes() {
        let bytes = Message::Heartbeat {
            data: Bytes::from_static(&[0, 0, 0, 0, 0, 0, 0, 7]),
        }
        .to_bytes()
        .unwrap();
        assert_eq!(
            &bytes[..],
            &[
                0x01, 0x00, 0x03, 0x03, 0x00, 0x00, 0x00, 0x14, //
                0x00, 0x09, 0x00, 0x0C, 0, 0, 0, 0, 0, 0, 0, 7,
            ]
        );
    }

    #[test]
    fn test_oversized_data_writes_nothing() {
        let msg = Message::Data {
            routing_context: None,
            protocol_data: ProtocolData {
                originating_point_code: 1,
                destination_point_code: 2,
                service_indicator: 3,
                network_indicator: 0,
                message_priority: 0,
                signaling_link_selection: 0,
                user_data: Bytes::from(vec![0u8; 70_000]),
            },
        };
        assert_eq!(msg.encoded_len(), Err(CodecError::ParameterTooLong(70_012)));

        let mut buf = BytesMut::new();
        assert!(M3uaCodec.encode(msg, &mut buf).is_err());
        assert!(buf.is_empty());

        let other = Message::Other {
            class: 9,
            kind: 1,
            body: Bytes::from(vec![0u8; MAX_MESSAGE_LEN]),
        };
        assert_eq!(
            other.encoded_len(),
            Err(CodecError::MessageTooLong(MAX_MESSAGE_LEN + HEADER_LEN))
        );
    }

    #[test]
    fn test_aspac_with_traffic_mode() {
        let msg = Message::AspActive {
            traffic_mode: Some(TrafficMode::Loadshare),
            routing_context: Some(10),
        };
        let bytes = msg.to_bytes().unwrap();
        assert_eq!(
            &bytes[..],
            &[
                0x01, 0x00, 0x04, 0x01, 0x00, 0x00, 0x00, 0x18, //
                0x00, 0x0B, 0x00, 0x08, 0x00, 0x00, 0x00, 0x02, //
                0x00, 0x06, 0x00, 0x08, 0x00, 0x00, 0x00, 0x0A,
            ]
        );
        assert_eq!(Message::parse(bytes).unwrap(), msg);
    }

    #[test]
    fn test_data_is_padded_and_parses() {
        let msg = Message::Data {
            routing_context: None,
            protocol_data: ProtocolData {
                originating_point_code: 1,
                destination_point_code: 2,
                service_indicator: 3,
                network_indicator: 0,
                message_priority: 0,
                signaling_link_selection: 1,
                user_data: Bytes::from_static(&[0xAA, 0xBB, 0xCC]),
            },
        };
        let bytes = msg.to_bytes().unwrap();
        // header 8 + param header 4 + label 12 + data 3 + pad 1
        assert_eq!(bytes.len(), 28);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 28]);
        assert_eq!(&bytes[8..12], &[0x02, 0x10, 0x00, 0x13]);
        assert_eq!(Message::parse(bytes).unwrap(), msg);
    }

    #[test]
    fn test_notify_and_error_parse() {
        let ntfy = Message::Notify {
            status_type: 1,
            status_info: 3,
        };
        assert_eq!(Message::parse(ntfy.to_bytes().unwrap()).unwrap(), ntfy);

        let err = Message::Error { code: 0x1A };
        assert_eq!(Message::parse(err.to_bytes().unwrap()).unwrap(), err);
    }

    #[test]
    fn test_unknown_class_is_kept() {
        let frame = Bytes::from_static(&[0x01, 0x00, 0x09, 0x01, 0x00, 0x00, 0x00, 0x0C, 1, 2, 3, 4]);
        match Message::parse(frame).unwrap() {
            Message::Other { class, kind, body } => {
                assert_eq!((class, kind), (9, 1));
                assert_eq!(&body[..], &[1, 2, 3, 4]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_version() {
        let frame = Bytes::from_static(&[0x02, 0x00, 0x03, 0x01, 0x00, 0x00, 0x00, 0x08]);
        assert_eq!(Message::parse(frame), Err(CodecError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_decoder_waits_for_complete_frames() {
        let mut codec = M3uaCodec;
        let full = Message::AspUpAck.to_bytes().unwrap();
        let beat = Message::Heartbeat {
            data: Bytes::from_static(b"hb"),
        }
        .to_bytes()
        .unwrap();

        let mut src = BytesMut::new();
        src.extend_from_slice(&full[..5]);
        assert_eq!(codec.decode(&mut src).unwrap(), None);

        src.extend_from_slice(&full[5..]);
        src.extend_from_slice(&beat[..10]);
        assert_eq!(codec.decode(&mut src).unwrap(), Some(Message::AspUpAck));
        assert_eq!(codec.decode(&mut src).unwrap(), None);

        src.extend_from_slice(&beat[10..]);
        assert_eq!(
            codec.decode(&mut src).unwrap(),
            Some(Message::Heartbeat {
                data: Bytes::from_static(b"hb")
            })
        );
        assert!(src.is_empty());
    }

    #[test]
    fn test_decoder_rejects_bogus_length() {
        let mut codec = M3uaCodec;
        let mut src = BytesMut::from(&[0x01, 0x00, 0x03, 0x01, 0x00, 0x00, 0x00, 0x04][..]);
        assert_eq!(codec.decode(&mut src), Err(CodecError::InvalidLength(4)));
    }
}
