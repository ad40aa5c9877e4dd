//! Delivery modes a configured method can use.
//!
//! Stored as `SMALLINT` in `methods.mode`: `0` email, `1` text, `2` voice.

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMode {
    /// Recognised but not dispatched; selecting it is a no-op.
    Email,
    Text,
    Voice,
}

impl DeliveryMode {
    pub fn as_i16(self) -> i16 {
        match self {
            DeliveryMode::Email => 0,
            DeliveryMode::Text => 1,
            DeliveryMode::Voice => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryMode::Email => "email",
            DeliveryMode::Text => "text",
            DeliveryMode::Voice => "voice",
        }
    }
}

impl TryFrom<i16> for DeliveryMode {
    type Error = CoreError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeliveryMode::Email),
            1 => Ok(DeliveryMode::Text),
            2 => Ok(DeliveryMode::Voice),
            other => Err(CoreError::Validation(format!(
                "Unknown delivery mode: {other}"
            ))),
        }
    }
}
