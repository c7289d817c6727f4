//! Error types for BIP‑322 operations.

use alloc::string::String;

/// Error types for BIP322 message generation, signing and verification.
///
/// A signature that decodes cleanly but does not check out is never an
/// error: verification reports it as `Ok(false)`. These variants cover input
/// that could not be interpreted at all.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The address does not decode for the requested network, or its witness
    /// version is not one we can build a message for
    #[error("Invalid address {0}")]
    InvalidAddress(String),
    /// The signature payload could not be decoded into witness elements
    #[error("Malformed signature - {0}")]
    MalformedSignature(String),
    /// The network name is not recognised
    #[error("Unknown network {0}")]
    InvalidNetwork(String),
    /// The provided private key is invalid
    #[error("Invalid private key")]
    InvalidPrivateKey,
    /// The provided public key is invalid
    #[error("Invalid public key {0}")]
    InvalidPublicKey(String),
    /// The script or address type is not supported
    #[error("Type is not supported")]
    UnsupportedType,
    /// Unable to compute the signature hash
    #[error("Unable to compute signature hash - {0}")]
    SighashError(String),
    /// Error encountered when building the signing container
    #[error("Unable to extract {0}")]
    ExtractionError(String),
    /// Error encountered when decoding a PSBT
    #[error("PSBT decode error - {0}")]
    DecodeError(String),
}
