//! M3UA parameters (RFC 4666 §3.2)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          Parameter Tag        |       Parameter Length        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! \                       Parameter Value                         /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The length covers tag, length and value but not the padding to the next
//! 4-octet boundary.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::CodecError;

pub const TAG_INFO_STRING: u16 = 0x0004;
pub const TAG_ROUTING_CONTEXT: u16 = 0x0006;
pub const TAG_HEARTBEAT_DATA: u16 = 0x0009;
pub const TAG_TRAFFIC_MODE_TYPE: u16 = 0x000B;
pub const TAG_ERROR_CODE: u16 = 0x000C;
pub const TAG_STATUS: u16 = 0x000D;
pub const TAG_ASP_IDENTIFIER: u16 = 0x0011;
pub const TAG_PROTOCOL_DATA: u16 = 0x0210;

const PARAM_HEADER_LEN: usize = 4;

/// Octets of padding after `len` octets
pub fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// A raw tag-length-value parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub tag: u16,
    pub value: Bytes,
}

impl Parameter {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    pub fn from_u32(tag: u16, value: u32) -> Self {
        Self::new(tag, value.to_be_bytes().to_vec())
    }

    /// Size on the wire including padding
    pub fn encoded_len(&self) -> usize {
        let len = PARAM_HEADER_LEN + self.value.len();
        len + padding(len)
    }

    /// Value of the length field, if it fits
    pub fn length_field(&self) -> Result<u16, CodecError> {
        u16::try_from(PARAM_HEADER_LEN + self.value.len())
            .map_err(|_| CodecError::ParameterTooLong(self.value.len()))
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let len16 = self.length_field()?;
        let len = len16 as usize;
        buf.put_u16(self.tag);
        buf.put_u16(len16);
        buf.put_slice(&self.value);
        buf.put_bytes(0, padding(len));
        Ok(())
    }

    /// Parse one parameter, consuming its padding when present
    pub fn parse(buf: &mut Bytes) -> Result<Self, CodecError> {
        if buf.remaining() < PARAM_HEADER_LEN {
            return Err(CodecError::BufferTooSmall {
                required: PARAM_HEADER_LEN,
                available: buf.remaining(),
            });
        }
        let tag = buf.get_u16();
        let len = buf.get_u16() as usize;
        if len < PARAM_HEADER_LEN {
            return Err(CodecError::MalformedParameter {
                tag,
                reason: format!("length {} below header size", len),
            });
        }
        let value_len = len - PARAM_HEADER_LEN;
        if buf.remaining() < value_len {
            return Err(CodecError::BufferTooSmall {
                required: value_len,
                available: buf.remaining(),
            });
        }
        let value = buf.split_to(value_len);
        // the last parameter of a message may omit its padding
        let pad = padding(len).min(buf.remaining());
        buf.advance(pad);
        Ok(Self { tag, value })
    }

    pub fn as_u32(&self) -> Result<u32, CodecError> {
        if self.value.len() < 4 {
            return Err(CodecError::MalformedParameter {
                tag: self.tag,
                reason: format!("expected 4 octets, got {}", self.value.len()),
            });
        }
        Ok(u32::from_be_bytes([
            self.value[0],
            self.value[1],
            self.value[2],
            self.value[3],
        ]))
    }
}

/// Parse all parameters of a message body
pub fn parse_all(mut body: Bytes) -> Result<Vec<Parameter>, CodecError> {
    let mut params = Vec::new();
    while body.has_remaining() {
        params.push(Parameter::parse(&mut body)?);
    }
    Ok(params)
}

/// Find a parameter by tag
pub fn find(params: &[Parameter], tag: u16) -> Option<&Parameter> {
    params.iter().find(|p| p.tag == tag)
}

/// Protocol Data parameter of a DATA message (RFC 4666 §3.3.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolData {
    pub originating_point_code: u32,
    pub destination_point_code: u32,
    pub service_indicator: u8,
    pub network_indicator: u8,
    pub message_priority: u8,
    pub signaling_link_selection: u8,
    pub user_data: Bytes,
}

impl ProtocolData {
    /// Size of the fixed routing label part
    pub const LABEL_SIZE: usize = 12;

    pub fn to_parameter(&self) -> Parameter {
        let mut value = BytesMut::with_capacity(Self::LABEL_SIZE + self.user_data.len());
        value.put_u32(self.originating_point_code);
        value.put_u32(self.destination_point_code);
        value.put_u8(self.service_indicator);
        value.put_u8(self.network_indicator);
        value.put_u8(self.message_priority);
        value.put_u8(self.signaling_link_selection);
        value.put_slice(&self.user_data);
        Parameter::new(TAG_PROTOCOL_DATA, value.freeze())
    }

    pub fn from_parameter(param: &Parameter) -> Result<Self, CodecError> {
        let mut value = param.value.clone();
        if value.remaining() < Self::LABEL_SIZE {
            return Err(CodecError::MalformedParameter {
                tag: param.tag,
                reason: format!("protocol data of {} octets", value.remaining()),
            });
        }
        Ok(Self {
            originating_point_code: value.get_u32(),
            destination_point_code: value.get_u32(),
            service_indicator: value.get_u8(),
            network_indicator: value.get_u8(),
            message_priority: value.get_u8(),
            signaling_link_selection: value.get_u8(),
            user_data: value,
        })
    }
}
