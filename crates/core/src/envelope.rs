//! Compact notification envelope: `header.payload.signature`.
//!
//! Each segment is base64url without padding. The header carries the
//! signing algorithm and key selector, the payload carries the notification
//! itself. The codec never checks signatures; it keeps the raw segments so
//! the verifier can hash exactly the bytes the sender signed.

use std::borrow::Cow;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::priority::Priority;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Wire structures
// ---------------------------------------------------------------------------

/// Outer JSON request body.
///
/// `header` is a legacy unprotected header. Routing uses the request path,
/// so its contents are accepted and ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionBody {
    #[serde(default)]
    pub header: LegacyHeader,
    pub payload: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyHeader {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub notid: String,
}

impl SubmissionBody {
    pub fn new(compact: impl Into<String>) -> Self {
        Self {
            header: LegacyHeader::default(),
            payload: compact.into(),
        }
    }
}

/// First envelope segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    #[serde(rename = "alg")]
    pub algorithm: String,
    /// DNS selector of the signing key (`kid` in JWS terms).
    #[serde(rename = "kid")]
    pub selector: String,
}

/// Second envelope segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Recipient token as the sender knows it.
    pub to: String,
    #[serde(rename = "origtime")]
    pub origination_time: Timestamp,
    pub priority: Priority,
    #[serde(rename = "expires")]
    pub expires_at: Timestamp,
    pub subject: String,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Message unmarshal error")]
    Message(#[source] serde_json::Error),

    #[error("Envelope must have three dot-separated segments")]
    Segments,

    #[error("Protected headers base64 decode error")]
    HeaderEncoding(#[source] SegmentError),

    #[error("Protected headers unmarshal error")]
    HeaderJson(#[source] serde_json::Error),

    #[error("Payload base64 decode error")]
    PayloadEncoding(#[source] SegmentError),

    #[error("Payload unmarshal error")]
    PayloadJson(#[source] serde_json::Error),

    #[error("Envelope encode error")]
    Encode(#[source] serde_json::Error),
}

/// Failure to turn one base64url segment back into bytes.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error("segment length {0} cannot be padded to a multiple of four")]
    Padding(usize),

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

// ---------------------------------------------------------------------------
// Padding and segment decoding
// ---------------------------------------------------------------------------

/// Restore the `=` padding stripped from a base64url segment.
///
/// Adds `4 - (len % 4)` pad characters. A remainder of 1 can never come
/// from a valid encoding and is rejected.
pub fn pad64(segment: &str) -> Result<Cow<'_, str>, SegmentError> {
    match segment.len() % 4 {
        0 => Ok(Cow::Borrowed(segment)),
        2 => Ok(Cow::Owned(format!("{segment}=="))),
        3 => Ok(Cow::Owned(format!("{segment}="))),
        _ => Err(SegmentError::Padding(segment.len())),
    }
}

/// Decode one unpadded base64url segment.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, SegmentError> {
    let padded = pad64(segment)?;
    Ok(URL_SAFE.decode(padded.as_bytes())?)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// The three segments exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegments {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

impl RawSegments {
    /// Bytes covered by the signature: `header + "." + payload`.
    pub fn signing_input(&self) -> Vec<u8> {
        format!("{}.{}", self.header, self.payload).into_bytes()
    }
}

#[derive(Debug, Clone)]
pub struct DecodedEnvelope {
    pub header: ProtectedHeader,
    pub payload: NotificationPayload,
    pub raw: RawSegments,
}

/// Parse a request body and decode the envelope it carries.
pub fn parse_submission(body: &[u8]) -> Result<DecodedEnvelope, EnvelopeError> {
    let submission: SubmissionBody =
        serde_json::from_slice(body).map_err(EnvelopeError::Message)?;
    decode(&submission.payload)
}

/// Decode a compact `header.payload.signature` string.
pub fn decode(compact: &str) -> Result<DecodedEnvelope, EnvelopeError> {
    let mut parts = compact.splitn(3, '.');
    let (Some(header), Some(payload), Some(signature)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(EnvelopeError::Segments);
    };

    let header_bytes = decode_segment(header).map_err(EnvelopeError::HeaderEncoding)?;
    let protected: ProtectedHeader =
        serde_json::from_slice(&header_bytes).map_err(EnvelopeError::HeaderJson)?;

    let payload_bytes = decode_segment(payload).map_err(EnvelopeError::PayloadEncoding)?;
    let notification: NotificationPayload =
        serde_json::from_slice(&payload_bytes).map_err(EnvelopeError::PayloadJson)?;

    Ok(DecodedEnvelope {
        header: protected,
        payload: notification,
        raw: RawSegments {
            header: header.to_string(),
            payload: payload.to_string(),
            signature: signature.to_string(),
        },
    })
}

// ---------------------------------------------------------------------------
// Encoding (sender side)
// ---------------------------------------------------------------------------

/// The first two encoded segments, ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningInput {
    header_segment: String,
    payload_segment: String,
}

impl SigningInput {
    pub fn new(
        header: &ProtectedHeader,
        payload: &NotificationPayload,
    ) -> Result<Self, EnvelopeError> {
        let header_json = serde_json::to_vec(header).map_err(EnvelopeError::Encode)?;
        let payload_json = serde_json::to_vec(payload).map_err(EnvelopeError::Encode)?;
        Ok(Self {
            header_segment: URL_SAFE_NO_PAD.encode(header_json),
            payload_segment: URL_SAFE_NO_PAD.encode(payload_json),
        })
    }

    pub fn header_segment(&self) -> &str {
        &self.header_segment
    }

    pub fn payload_segment(&self) -> &str {
        &self.payload_segment
    }

    pub fn signing_bytes(&self) -> Vec<u8> {
        format!("{}.{}", self.header_segment, self.payload_segment).into_bytes()
    }

    /// Append a signature and produce the compact envelope.
    pub fn seal(&self, signature: &[u8]) -> String {
        format!(
            "{}.{}.{}",
            self.header_segment,
            self.payload_segment,
            URL_SAFE_NO_PAD.encode(signature)
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
