//! Component portion: invoke components (Q.773 §4.2.2)

use bytes::{Bytes, BytesMut};

use crate::ber::{constructed, put_integer, put_tlv};
use crate::error::Error;
use crate::Result;

/// Component portion tag (application 12, constructed)
pub const TAG_COMPONENT_PORTION: u8 = 0x6C;
/// Invoke component tag (context 1, constructed)
pub const TAG_INVOKE: u8 = 0xA1;
/// Universal INTEGER, used for invoke ID and local operation codes
pub const TAG_INTEGER: u8 = 0x02;
/// Linked ID [0] IMPLICIT INTEGER
pub const TAG_LINKED_ID: u8 = 0x80;
/// Parameter SEQUENCE wrapping the operation argument
pub const TAG_PARAMETER_SEQUENCE: u8 = 0x30;

/// A single requested operation within a transaction
///
/// The payload is the already encoded operation argument. It is placed
/// inside the parameter SEQUENCE as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub invoke_id: i32,
    pub linked_id: Option<i32>,
    pub operation_code: i32,
    pub payload: Bytes,
}

impl Invocation {
    /// Create an invoke with a local operation code
    pub fn new(invoke_id: i32, operation_code: i32, payload: impl Into<Bytes>) -> Self {
        Self {
            invoke_id,
            linked_id: None,
            operation_code,
            payload: payload.into(),
        }
    }

    /// Create an invoke whose payload is given as a hex string
    pub fn from_hex(invoke_id: i32, operation_code: i32, payload_hex: &str) -> Result<Self> {
        let payload = hex::decode(payload_hex.trim())?;
        Ok(Self::new(invoke_id, operation_code, payload))
    }

    /// Link this invoke to a previous one
    pub fn with_linked_id(mut self, linked_id: i32) -> Self {
        self.linked_id = Some(linked_id);
        self
    }

    /// Serialize the invoke component
    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        check_invoke_id(self.invoke_id)?;
        if let Some(linked) = self.linked_id {
            check_invoke_id(linked)?;
        }

        constructed(buf, TAG_INVOKE, |invoke| {
            put_integer(invoke, TAG_INTEGER, self.invoke_id as i64)?;
            if let Some(linked) = self.linked_id {
                put_integer(invoke, TAG_LINKED_ID, linked as i64)?;
            }
            put_integer(invoke, TAG_INTEGER, self.operation_code as i64)?;
            if !self.payload.is_empty() {
                put_tlv(invoke, TAG_PARAMETER_SEQUENCE, &self.payload)?;
            }
            Ok(())
        })
    }
}

fn check_invoke_id(id: i32) -> Result<()> {
    if (-128..=127).contains(&id) {
        Ok(())
    } else {
        Err(Error::InvokeIdOutOfRange(id))
    }
}

/// Serialize the component portion holding all invocations
pub fn serialize_components(invocations: &[Invocation], buf: &mut BytesMut) -> Result<()> {
    constructed(buf, TAG_COMPONENT_PORTION, |components| {
        for invocation in invocations {
            invocation.serialize(components)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_layout() {
        let invoke = Invocation::new(0, 3, vec![0x04, 0x01, 0x99]);
        let mut buf = BytesMut::new();
        invoke.serialize(&mut buf).unwrap();

        assert_eq!(
            &buf[..],
            &[
                0xA1, 0x0B, // invoke
                0x02, 0x01, 0x00, // invoke ID
                0x02, 0x01, 0x03, // opcode
                0x30, 0x03, 0x04, 0x01, 0x99, // parameter
            ]
        );
    }

    #[test]
    fn test_linked_id_and_empty_payload() {
        let invoke = Invocation::new(2, 59, Bytes::new()).with_linked_id(1);
        let mut buf = BytesMut::new();
        invoke.serialize(&mut buf).unwrap();

        assert_eq!(
            &buf[..],
            &[0xA1, 0x09, 0x02, 0x01, 0x02, 0x80, 0x01, 0x01, 0x02, 0x01, 0x3B]
        );
    }

    #[test]
    fn test_from_hex() {
        let invoke = Invocation::from_hex(113, 45, "8001ff").unwrap();
        assert_eq!(&invoke.payload[..], &[0x80, 0x01, 0xFF]);

        assert!(matches!(
            Invocation::from_hex(113, 45, "80z1"),
            Err(Error::Decode(_))
        ));
        // odd number of digits
        assert!(matches!(
            Invocation::from_hex(113, 45, "800"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_invoke_id_range() {
        let mut buf = BytesMut::new();
        assert_eq!(
            Invocation::new(200, 45, Bytes::new()).serialize(&mut buf),
            Err(Error::InvokeIdOutOfRange(200))
        );
        assert!(Invocation::new(-128, 45, Bytes::new())
            .serialize(&mut buf)
            .is_ok());
    }

    #[test]
    fn test_component_portion_holds_all_invokes() {
        let invokes = vec![
            Invocation::new(1, 45, Bytes::new()),
            Invocation::new(2, 46, Bytes::new()),
        ];
        let mut buf = BytesMut::new();
        serialize_components(&invokes, &mut buf).unwrap();

        assert_eq!(buf[0], TAG_COMPONENT_PORTION);
        assert_eq!(buf[1] as usize, buf.len() - 2);
        assert_eq!(
            &buf[2..],
            &[
                0xA1, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x2D, //
                0xA1, 0x06, 0x02, 0x01, 0x02, 0x02, 0x01, 0x2E,
            ]
        );
    }
}
