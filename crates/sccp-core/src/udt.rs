//! Unitdata (UDT) message (ITU-T Q.713 §4.10)
//!
//! ```text
//! 0: message type (0x09)
//! 1: protocol class (class in bits 1-4, message handling in bits 5-8)
//! 2: pointer to called party address
//! 3: pointer to calling party address
//! 4: pointer to data
//! *: called party address length + address
//! *: calling party address length + address
//! *: data length + data
//! ```
//!
//! Each pointer counts octets from its own position to the length octet of
//! the variable part it points to.

use bytes::{BufMut, Bytes, BytesMut};

use crate::address::RoutingAddress;
use crate::error::Error;
use crate::Result;

/// UDT message type code
pub const MSG_TYPE_UDT: u8 = 0x09;

/// Message handling bit: return message on error
const RETURN_ON_ERROR: u8 = 0x80;

/// Number of mandatory variable parts in a UDT
const VARIABLE_PARTS: usize = 3;

/// Protocol class octet of a connectionless message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolClass {
    pub class: u8,
    pub return_on_error: bool,
}

impl ProtocolClass {
    pub fn new(class: u8, return_on_error: bool) -> Result<Self> {
        if class > 1 {
            return Err(Error::InvalidProtocolClass(class));
        }
        Ok(Self {
            class,
            return_on_error,
        })
    }

    pub fn to_byte(&self) -> u8 {
        let handling = if self.return_on_error { RETURN_ON_ERROR } else { 0 };
        (self.class & 0x0F) | handling
    }
}

/// Connectionless SCCP datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unitdata {
    pub protocol_class: ProtocolClass,
    pub called: RoutingAddress,
    pub calling: RoutingAddress,
    pub data: Bytes,
}

impl Unitdata {
    pub fn new(
        protocol_class: ProtocolClass,
        called: RoutingAddress,
        calling: RoutingAddress,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            protocol_class,
            called,
            calling,
            data: data.into(),
        }
    }

    /// Encode the message to its wire form
    pub fn encode(&self) -> Result<Bytes> {
        let called = self.called.to_bytes()?;
        let calling = self.calling.to_bytes()?;

        let called_len = checked_len("called party address", called.len())?;
        let calling_len = checked_len("calling party address", calling.len())?;
        let data_len = checked_len("user data", self.data.len())?;

        // first variable part starts right after the pointer block
        let ptr_called = VARIABLE_PARTS as u8;
        let ptr_calling = checked_len(
            "calling party address pointer",
            ptr_called as usize + called.len(),
        )?;
        let ptr_data = checked_len(
            "data pointer",
            ptr_calling as usize + calling.len(),
        )?;

        let mut buf = BytesMut::with_capacity(
            2 + VARIABLE_PARTS + VARIABLE_PARTS + called.len() + calling.len() + self.data.len(),
        );
        buf.put_u8(MSG_TYPE_UDT);
        buf.put_u8(self.protocol_class.to_byte());
        buf.put_u8(ptr_called);
        buf.put_u8(ptr_calling);
        buf.put_u8(ptr_data);
        buf.put_u8(called_len);
        buf.put_slice(&called);
        buf.put_u8(calling_len);
        buf.put_slice(&calling);
        buf.put_u8(data_len);
        buf.put_slice(&self.data);

        Ok(buf.freeze())
    }
}

fn checked_len(field: &'static str, len: usize) -> Result<u8> {
    u8::try_from(len).map_err(|_| Error::FieldTooLong { field, len })
}

/// Encode a UDT from its parts
pub fn encode(
    protocol_class: u8,
    return_on_error: bool,
    called: &RoutingAddress,
    calling: &RoutingAddress,
    user_data: &[u8],
) -> Result<Bytes> {
    Unitdata::new(
        ProtocolClass::new(protocol_class, return_on_error)?,
        called.clone(),
        calling.clone(),
        Bytes::copy_from_slice(user_data),
    )
    .encode()
}
