//! Transaction portion: Begin / Continue / End messages (Q.773 §4.2.1)

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::ber::{constructed, put_tlv};
use crate::component::{serialize_components, Invocation};
use crate::dialogue::{ApplicationContext, DialoguePortion};
use crate::error::Error;
use crate::Result;

/// Originating transaction ID tag (application 8, primitive)
pub const TAG_OTID: u8 = 0x48;
/// Destination transaction ID tag (application 9, primitive)
pub const TAG_DTID: u8 = 0x49;

/// TCAP message type, the value is the message tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Begin = 0x62,
    End = 0x64,
    Continue = 0x65,
}

impl MessageType {
    pub fn tag(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Begin => write!(f, "Begin"),
            MessageType::End => write!(f, "End"),
            MessageType::Continue => write!(f, "Continue"),
        }
    }
}

/// A complete TCAP message ready for encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionMessage {
    pub message_type: MessageType,
    pub otid: Option<u32>,
    pub dtid: Option<u32>,
    pub dialogue: Option<DialoguePortion>,
    pub components: Vec<Invocation>,
}

impl TransactionMessage {
    /// Create a message of the given type without IDs or content
    pub fn new(message_type: MessageType) -> Self {
        Self {
            message_type,
            otid: None,
            dtid: None,
            dialogue: None,
            components: Vec::new(),
        }
    }

    /// Create a Begin opening the transaction `otid`
    pub fn begin(otid: u32) -> Self {
        let mut msg = Self::new(MessageType::Begin);
        msg.otid = Some(otid);
        msg
    }

    /// Create a Continue for an ongoing transaction
    pub fn continue_with(otid: u32, dtid: u32) -> Self {
        let mut msg = Self::new(MessageType::Continue);
        msg.otid = Some(otid);
        msg.dtid = Some(dtid);
        msg
    }

    /// Create an End closing the peer's transaction `dtid`
    pub fn end(dtid: u32) -> Self {
        let mut msg = Self::new(MessageType::End);
        msg.dtid = Some(dtid);
        msg
    }

    /// Attach a dialogue portion
    pub fn with_dialogue(mut self, dialogue: DialoguePortion) -> Self {
        self.dialogue = Some(dialogue);
        self
    }

    /// Append an invoke component
    pub fn with_invocation(mut self, invocation: Invocation) -> Self {
        self.components.push(invocation);
        self
    }

    /// Begin carrying a dialogue-as-id portion and exactly one invoke
    pub fn begin_invoke_with_dialogue(
        otid: u32,
        application_context: ApplicationContext,
        version: u8,
        invoke_id: i32,
        operation_code: i32,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self::begin(otid)
            .with_dialogue(DialoguePortion::new(application_context, version))
            .with_invocation(Invocation::new(invoke_id, operation_code, payload))
    }

    fn validate(&self) -> Result<()> {
        let kind = self.message_type;
        match kind {
            MessageType::Begin => {
                if self.otid.is_none() {
                    return Err(Error::MissingOtid);
                }
                if self.dtid.is_some() {
                    return Err(Error::UnexpectedDtid(kind));
                }
            }
            MessageType::Continue => {
                if self.otid.is_none() {
                    return Err(Error::MissingOtid);
                }
                if self.dtid.is_none() {
                    return Err(Error::MissingDtid(kind));
                }
            }
            MessageType::End => {
                if self.otid.is_some() {
                    return Err(Error::UnexpectedOtid(kind));
                }
                if self.dtid.is_none() {
                    return Err(Error::MissingDtid(kind));
                }
            }
        }
        Ok(())
    }

    /// Encode the message to its BER wire form
    pub fn encode(&self) -> Result<Bytes> {
        self.validate()?;

        let mut buf = BytesMut::new();
        constructed(&mut buf, self.message_type.tag(), |content| {
            if let Some(otid) = self.otid {
                put_tlv(content, TAG_OTID, &otid.to_be_bytes())?;
            }
            if let Some(dtid) = self.dtid {
                put_tlv(content, TAG_DTID, &dtid.to_be_bytes())?;
            }
            if let Some(dialogue) = &self.dialogue {
                dialogue.serialize(content)?;
            }
            if !self.components.is_empty() {
                serialize_components(&self.components, content)?;
            }
            Ok(())
        })?;
        Ok(buf.freeze())
    }
}

/// Encode a TCAP message from its parts
///
/// `otid` is mandatory for Begin and Continue, `dtid` for Continue and End.
pub fn encode(
    message_type: MessageType,
    otid: Option<u32>,
    dtid: Option<u32>,
    dialogue: Option<DialoguePortion>,
    invocations: &[Invocation],
) -> Result<Bytes> {
    TransactionMessage {
        message_type,
        otid,
        dtid,
        dialogue,
        components: invocations.to_vec(),
    }
    .encode()
}
