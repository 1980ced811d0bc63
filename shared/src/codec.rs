//! Raw indication boundary
//!
//! The connectivity service hands us indications as:
//! ```text
//! [ msg_id: u32 ][ N bytes: service-specific payload ]
//! ```
//!
//! Payload layout belongs to the service glue, which supplies a
//! [`PayloadDecoder`]. This module owns the step in front of it: mapping the
//! message identifier to a [`MessageKind`] and checking that the decoder
//! produced an indication of that kind.

use bytes::Bytes;
use thiserror::Error;

use crate::indication::{Indication, MessageKind};

/// An undecoded indication as received from the connectivity service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIndication {
    pub msg_id: u32,
    pub payload: Bytes,
}

impl RawIndication {
    pub fn new(msg_id: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            msg_id,
            payload: payload.into(),
        }
    }
}

/// Errors that can occur while decoding an indication
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Not enough data for {kind}: need {needed} bytes, have {available}")]
    NotEnoughData {
        kind: MessageKind,
        needed: usize,
        available: usize,
    },

    #[error("Malformed {kind} payload: {reason}")]
    Malformed { kind: MessageKind, reason: String },

    #[error("Decoder returned {actual} for a {expected} message")]
    KindMismatch {
        expected: MessageKind,
        actual: MessageKind,
    },
}

/// Decodes service payloads into typed indications
pub trait PayloadDecoder: Send + Sync {
    fn decode(&self, kind: MessageKind, payload: &[u8]) -> Result<Indication, CodecError>;
}

impl<F> PayloadDecoder for F
where
    F: Fn(MessageKind, &[u8]) -> Result<Indication, CodecError> + Send + Sync,
{
    fn decode(&self, kind: MessageKind, payload: &[u8]) -> Result<Indication, CodecError> {
        self(kind, payload)
    }
}

/// Check that a payload holds at least `needed` bytes
pub fn require_len(kind: MessageKind, payload: &[u8], needed: usize) -> Result<(), CodecError> {
    if payload.len() < needed {
        return Err(CodecError::NotEnoughData {
            kind,
            needed,
            available: payload.len(),
        });
    }
    Ok(())
}

/// Try to decode a raw indication
///
/// Returns:
/// - `Ok(Some(indication))` if the message kind is known and decoded
/// - `Ok(None)` if the message identifier is not one we handle
/// - `Err(...)` if the payload is invalid
pub fn decode(
    raw: &RawIndication,
    decoder: &dyn PayloadDecoder,
) -> Result<Option<Indication>, CodecError> {
    let Some(kind) = MessageKind::from_msg_id(raw.msg_id) else {
        return Ok(None);
    };

    let indication = decoder.decode(kind, &raw.payload)?;

    if indication.kind() != kind {
        return Err(CodecError::KindMismatch {
            expected: kind,
            actual: indication.kind(),
        });
    }

    Ok(Some(indication))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indication::{msg_id, WlanMode, WlanStatus, WwanStatus};

    /// One status byte per message, enough to exercise the boundary
    fn byte_decoder(kind: MessageKind, payload: &[u8]) -> Result<Indication, CodecError> {
        require_len(kind, payload, 1)?;
        let code = payload[0] as i32;
        match kind {
            MessageKind::WlanStatus => Ok(Indication::WlanStatus {
                status: if code == 1 { WlanStatus::Enabled } else { WlanStatus::Disabled },
                mode: WlanMode::StaOnly,
            }),
            MessageKind::BringUpWwan => Ok(Indication::BringUpWwan(WwanStatus::from_code(code))),
            // Deliberately wrong so the kind check has something to catch
            MessageKind::TearDownWwan => Ok(Indication::BringUpWwan(WwanStatus::from_code(code))),
            other => Err(CodecError::Malformed {
                kind: other,
                reason: "not supported by test decoder".into(),
            }),
        }
    }

    #[test]
    fn test_decode_known_kind() {
        let raw = RawIndication::new(msg_id::BRING_UP_WWAN, vec![3u8]);
        let decoded = decode(&raw, &byte_decoder).expect("decode failed");
        assert_eq!(decoded, Some(Indication::BringUpWwan(WwanStatus::Connected)));
    }

    #[test]
    fn test_unknown_msg_id_is_skipped() {
        let raw = RawIndication::new(0xBEEF, vec![1u8, 2, 3]);
        let decoded = decode(&raw, &byte_decoder).expect("unknown ids are not errors");
        assert!(decoded.is_none());
    }

    #[test]
    fn test_short_payload() {
        let raw = RawIndication::new(msg_id::WLAN_STATUS, Vec::<u8>::new());
        let result = decode(&raw, &byte_decoder);
        assert!(matches!(
            result,
            Err(CodecError::NotEnoughData { needed: 1, available: 0, .. })
        ));
    }

    #[test]
    fn test_kind_mismatch() {
        let raw = RawIndication::new(msg_id::TEAR_DOWN_WWAN, vec![6u8]);
        let result = decode(&raw, &byte_decoder);
        assert!(matches!(
            result,
            Err(CodecError::KindMismatch {
                expected: MessageKind::TearDownWwan,
                actual: MessageKind::BringUpWwan,
            })
        ));
    }
}
