//! Dialogue portion of a TCAP message (Q.773 §4.2.3)
//!
//! The dialogue portion is an EXTERNAL carrying the dialogue-as-id object
//! identifier and an AARQ APDU which names the MAP application context and
//! its version.

use std::fmt;

use bytes::BytesMut;
use serde::{Deserialize, Serialize};

use crate::ber::{constructed, put_tlv};
use crate::Result;

/// Dialogue portion tag (application 11, constructed)
pub const TAG_DIALOGUE_PORTION: u8 = 0x6B;
/// EXTERNAL tag (universal 8, constructed)
pub const TAG_EXTERNAL: u8 = 0x28;
/// OBJECT IDENTIFIER tag
pub const TAG_OBJECT_IDENTIFIER: u8 = 0x06;
/// single-ASN1-type [0] of EXTERNAL
pub const TAG_SINGLE_ASN1_TYPE: u8 = 0xA0;
/// AARQ APDU tag (application 0, constructed)
pub const TAG_AARQ: u8 = 0x60;
/// protocol-version [0] IMPLICIT BIT STRING
pub const TAG_PROTOCOL_VERSION: u8 = 0x80;
/// application-context-name [1]
pub const TAG_APPLICATION_CONTEXT_NAME: u8 = 0xA1;

/// protocol-version BIT STRING value: version1 with 7 unused bits
const PROTOCOL_VERSION_1: [u8; 2] = [0x07, 0x80];

/// Kind of dialogue carried in the dialogue portion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogueType {
    /// Structured dialogue, `{itu-t recommendation q 773 as(1) dialogue-as(1) version1(1)}`
    #[default]
    AsId,
}

impl DialogueType {
    /// BER content octets of the dialogue object identifier
    pub fn oid(&self) -> &'static [u8] {
        match self {
            // 0.0.17.773.1.1.1
            DialogueType::AsId => &[0x00, 0x11, 0x86, 0x05, 0x01, 0x01, 0x01],
        }
    }
}

/// MAP application contexts (3GPP TS 29.002 §17.3.2)
///
/// The object identifier of each context is
/// `{itu-t(0) identified-organization(4) etsi(0) mobileDomain(0)
/// gsm-Network(1) ac-Id(0) <context> <version>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationContext {
    NetworkLocUp,
    LocationCancellation,
    RoamingNumberEnquiry,
    LocationInfoRetrieval,
    Reset,
    InfoRetrieval,
    SubscriberDataMngt,
    NetworkUnstructuredSs,
    /// shortMsgGatewayContext, used by SendRoutingInfoForSM
    SendRoutingInfoForSm,
    ShortMsgMoRelay,
    ShortMsgAlert,
    MwdMngt,
    ShortMsgMtRelay,
    ImsiRetrieval,
    MsPurging,
    SubscriberInfoEnquiry,
    AnyTimeEnquiry,
    /// Any other context by its numeric value
    Other(u8),
}

impl ApplicationContext {
    /// Numeric application context value
    pub fn value(&self) -> u8 {
        match self {
            ApplicationContext::NetworkLocUp => 1,
            ApplicationContext::LocationCancellation => 2,
            ApplicationContext::RoamingNumberEnquiry => 3,
            ApplicationContext::LocationInfoRetrieval => 5,
            ApplicationContext::Reset => 10,
            ApplicationContext::InfoRetrieval => 14,
            ApplicationContext::SubscriberDataMngt => 16,
            ApplicationContext::NetworkUnstructuredSs => 19,
            ApplicationContext::SendRoutingInfoForSm => 20,
            ApplicationContext::ShortMsgMoRelay => 21,
            ApplicationContext::ShortMsgAlert => 23,
            ApplicationContext::MwdMngt => 24,
            ApplicationContext::ShortMsgMtRelay => 25,
            ApplicationContext::ImsiRetrieval => 26,
            ApplicationContext::MsPurging => 27,
            ApplicationContext::SubscriberInfoEnquiry => 28,
            ApplicationContext::AnyTimeEnquiry => 29,
            ApplicationContext::Other(v) => *v,
        }
    }

    /// BER content octets of the application context name for `version`
    pub fn oid(&self, version: u8) -> [u8; 7] {
        [0x04, 0x00, 0x00, 0x01, 0x00, self.value(), version]
    }
}

impl fmt::Display for ApplicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationContext::Other(v) => write!(f, "Other({})", v),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Dialogue portion announcing the application context of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialoguePortion {
    pub dialogue_type: DialogueType,
    pub application_context: ApplicationContext,
    pub version: u8,
}

impl DialoguePortion {
    /// Create a dialogue-as-id portion for the given context and version
    pub fn new(application_context: ApplicationContext, version: u8) -> Self {
        Self {
            dialogue_type: DialogueType::AsId,
            application_context,
            version,
        }
    }

    /// Serialize the complete dialogue portion element
    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        constructed(buf, TAG_DIALOGUE_PORTION, |external| {
            constructed(external, TAG_EXTERNAL, |ext| {
                put_tlv(ext, TAG_OBJECT_IDENTIFIER, self.dialogue_type.oid())?;
                constructed(ext, TAG_SINGLE_ASN1_TYPE, |single| {
                    constructed(single, TAG_AARQ, |aarq| {
                        put_tlv(aarq, TAG_PROTOCOL_VERSION, &PROTOCOL_VERSION_1)?;
                        constructed(aarq, TAG_APPLICATION_CONTEXT_NAME, |acn| {
                            put_tlv(
                                acn,
                                TAG_OBJECT_IDENTIFIER,
                                &self.application_context.oid(self.version),
                            )
                        })
                    })
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_values() {
        assert_eq!(ApplicationContext::LocationCancellation.value(), 2);
        assert_eq!(ApplicationContext::SendRoutingInfoForSm.value(), 20);
        assert_eq!(ApplicationContext::Other(42).value(), 42);
        assert_eq!(
            ApplicationContext::SendRoutingInfoForSm.oid(3),
            [0x04, 0x00, 0x00, 0x01, 0x00, 0x14, 0x03]
        );
    }

    #[test]
    fn test_dialogue_portion_layout() {
        let mut buf = BytesMut::new();
        DialoguePortion::new(ApplicationContext::SendRoutingInfoForSm, 3)
            .serialize(&mut buf)
            .unwrap();

        let expected: &[u8] = &[
            0x6B, 0x1E, // dialogue portion
            0x28, 0x1C, // EXTERNAL
            0x06, 0x07, 0x00, 0x11, 0x86, 0x05, 0x01, 0x01, 0x01, // dialogue-as-id
            0xA0, 0x11, // single-ASN1-type
            0x60, 0x0F, // AARQ
            0x80, 0x02, 0x07, 0x80, // protocol-version
            0xA1, 0x09, 0x06, 0x07, 0x04, 0x00, 0x00, 0x01, 0x00, 0x14, 0x03,
        ];
        assert_eq!(&buf[..], expected);
    }
}
