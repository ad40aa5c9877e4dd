//! Envelope signature verification (RS256).
//!
//! The signature covers the exact bytes `header_segment + "." +
//! payload_segment` as received, never the re-serialized JSON. The signer's
//! key is found through [`KeyResolver`] using the header's selector and the
//! domain the authorization trusts.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs8::der::Decode;
use rsa::pkcs8::SubjectPublicKeyInfoRef;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::dkim::KeyResolver;
use crate::envelope::{decode_segment, ProtectedHeader, RawSegments, SegmentError, SigningInput};

/// The only accepted `alg` value: RSASSA-PKCS1-v1_5 with SHA-256.
pub const SUPPORTED_ALGORITHM: &str = "RS256";

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Signature key not found for {selector} at {domain}")]
    KeyNotFound { selector: String, domain: String },

    #[error("Public key decode error")]
    KeyDecode(#[source] base64::DecodeError),

    #[error("Public key parse error: {0}")]
    KeyParse(String),

    #[error("Public key is not an RSA key")]
    KeyType,

    #[error("Signature decode error")]
    SignatureDecode(#[source] SegmentError),

    #[error("Signature verification error")]
    SignatureMismatch,
}

#[derive(Clone)]
pub struct SignatureVerifier {
    resolver: KeyResolver,
}

impl SignatureVerifier {
    pub fn new(resolver: KeyResolver) -> Self {
        Self { resolver }
    }

    /// Verify an envelope on behalf of a sender trusted at `signer_domain`.
    pub async fn verify(
        &self,
        header: &ProtectedHeader,
        raw: &RawSegments,
        signer_domain: &str,
    ) -> Result<(), VerificationError> {
        if header.algorithm != SUPPORTED_ALGORITHM {
            return Err(VerificationError::UnsupportedAlgorithm(
                header.algorithm.clone(),
            ));
        }

        let key = self
            .resolver
            .resolve(&header.selector, signer_domain)
            .await
            .ok_or_else(|| VerificationError::KeyNotFound {
                selector: header.selector.clone(),
                domain: signer_domain.to_string(),
            })?;

        verify_with_key(&key, &raw.signing_input(), &raw.signature)
    }
}

/// Parse a base64 (standard alphabet) DER SubjectPublicKeyInfo RSA key.
pub fn parse_public_key(key_b64: &str) -> Result<RsaPublicKey, VerificationError> {
    let der = STANDARD
        .decode(key_b64.as_bytes())
        .map_err(VerificationError::KeyDecode)?;

    let spki = SubjectPublicKeyInfoRef::from_der(&der)
        .map_err(|e| VerificationError::KeyParse(e.to_string()))?;
    if spki.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
        return Err(VerificationError::KeyType);
    }

    RsaPublicKey::try_from(spki).map_err(|e| VerificationError::KeyParse(e.to_string()))
}

/// Check `signature_segment` over `signing_input` with a resolved key.
pub fn verify_with_key(
    key_b64: &str,
    signing_input: &[u8],
    signature_segment: &str,
) -> Result<(), VerificationError> {
    let key = parse_public_key(key_b64)?;
    let signature =
        decode_segment(signature_segment).map_err(VerificationError::SignatureDecode)?;

    let digest = Sha256::digest(signing_input);
    key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
        .map_err(|_| VerificationError::SignatureMismatch)
}

impl SigningInput {
    /// Sign with RS256 and produce the compact envelope.
    pub fn seal_rs256(&self, key: &RsaPrivateKey) -> Result<String, rsa::Error> {
        let digest = Sha256::digest(self.signing_bytes());
        let signature = key.sign(Pkcs1v15Sign::new::<Sha256>(), &digest)?;
        Ok(self.seal(&signature))
    }
}
