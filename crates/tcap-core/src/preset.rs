//! Ready-made MAP operations
//!
//! Each preset fixes the application context, invoke ID and operation code
//! of a well known MAP operation and carries a sample argument that can be
//! overridden by the caller.

use serde::{Deserialize, Serialize};

use crate::component::Invocation;
use crate::dialogue::{ApplicationContext, DialoguePortion};
use crate::transaction::TransactionMessage;
use crate::Result;

/// MAP application context version used by the presets
pub const MAP_VERSION_3: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationPreset {
    /// sendRoutingInfoForSM (opcode 45) in shortMsgGatewayContext v3
    #[default]
    #[serde(alias = "sri-sm")]
    SendRoutingInfoForSm,
    /// cancelLocation (opcode 3) in locationCancellationContext v3
    CancelLocation,
}

impl OperationPreset {
    pub fn operation_code(&self) -> i32 {
        match self {
            OperationPreset::SendRoutingInfoForSm => 45,
            OperationPreset::CancelLocation => 3,
        }
    }

    pub fn invoke_id(&self) -> i32 {
        match self {
            OperationPreset::SendRoutingInfoForSm => 113,
            OperationPreset::CancelLocation => 0,
        }
    }

    pub fn application_context(&self) -> ApplicationContext {
        match self {
            OperationPreset::SendRoutingInfoForSm => ApplicationContext::SendRoutingInfoForSm,
            OperationPreset::CancelLocation => ApplicationContext::LocationCancellation,
        }
    }

    /// Sample argument, hex encoded
    ///
    /// SRI-SM: msisdn `[0]`, sm-RP-PRI `[1]` TRUE, serviceCentreAddress `[2]`.
    /// CancelLocation: IMSI OCTET STRING.
    pub fn default_payload_hex(&self) -> &'static str {
        match self {
            OperationPreset::SendRoutingInfoForSm => "8007123456789128888101FF820712345678912999",
            OperationPreset::CancelLocation => "040800010121436587f9",
        }
    }

    /// Build a Begin for this operation
    ///
    /// Missing overrides fall back to the preset's defaults.
    pub fn begin(
        &self,
        otid: u32,
        operation_code: Option<i32>,
        invoke_id: Option<i32>,
        payload_hex: Option<&str>,
        version: Option<u8>,
    ) -> Result<TransactionMessage> {
        let invocation = Invocation::from_hex(
            invoke_id.unwrap_or_else(|| self.invoke_id()),
            operation_code.unwrap_or_else(|| self.operation_code()),
            payload_hex.unwrap_or_else(|| self.default_payload_hex()),
        )?;
        let dialogue = DialoguePortion::new(
            self.application_context(),
            version.unwrap_or(MAP_VERSION_3),
        );
        Ok(TransactionMessage::begin(otid)
            .with_dialogue(dialogue)
            .with_invocation(invocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_cancel_location_defaults() {
        let msg = OperationPreset::CancelLocation
            .begin(0x11111111, None, None, None, None)
            .unwrap();
        assert_eq!(msg.components.len(), 1);
        assert_eq!(msg.components[0].operation_code, 3);
        assert_eq!(msg.components[0].invoke_id, 0);
        assert_eq!(
            &msg.components[0].payload[..],
            &[0x04, 0x08, 0x00, 0x01, 0x01, 0x21, 0x43, 0x65, 0x87, 0xF9]
        );
        let dialogue = msg.dialogue.unwrap();
        assert_eq!(dialogue.application_context.value(), 2);
        assert_eq!(dialogue.version, 3);
    }

    #[test]
    fn test_overrides_win() {
        let msg = OperationPreset::SendRoutingInfoForSm
            .begin(1, Some(46), Some(5), Some("0102"), Some(2))
            .unwrap();
        assert_eq!(msg.components[0].operation_code, 46);
        assert_eq!(msg.components[0].invoke_id, 5);
        assert_eq!(&msg.components[0].payload[..], &[0x01, 0x02]);
        assert_eq!(msg.dialogue.unwrap().version, 2);
    }

    #[test]
    fn test_bad_payload_is_decode_error() {
        let err = OperationPreset::SendRoutingInfoForSm
            .begin(1, None, None, Some("xyz"), None)
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
