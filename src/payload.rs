//! Decoding and encoding of simple-format signature payloads.
//!
//! A payload is a serialized witness stack: one byte holding the number of
//! stack items, followed by the items. Every item a single-key wallet
//! produces is shorter than 76 bytes, so the items read back as plain script
//! pushes.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use bitcoin::{
    base64::{engine::general_purpose, Engine},
    consensus::encode::serialize,
    hex::{DisplayHex, FromHex},
    script::Instruction,
    Script, Witness,
};
use log::trace;

use crate::Error;

/// The text encodings a signature payload is exchanged in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignatureEncoding {
    #[default]
    Base64,
    Hex,
}

/// The witness elements carried by a simple BIP322 signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignaturePayload {
    elements: Vec<Vec<u8>>,
}

impl SignaturePayload {
    /// Decodes a payload from its text form.
    pub fn decode(signature: &str, encoding: SignatureEncoding) -> Result<Self, Error> {
        let bytes = match encoding {
            SignatureEncoding::Base64 => general_purpose::STANDARD
                .decode(signature.trim())
                .map_err(|e| Error::MalformedSignature(e.to_string()))?,
            SignatureEncoding::Hex => Vec::<u8>::from_hex(signature.trim())
                .map_err(|e| Error::MalformedSignature(e.to_string()))?,
        };

        Self::from_bytes(&bytes)
    }

    /// Splits raw payload bytes into witness elements.
    ///
    /// The rest after the leading item count is read as a sequence of data
    /// pushes. Anything that is not a push is rejected, as is a count that
    /// disagrees with the number of pushes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let (count, rest) = bytes
            .split_first()
            .ok_or_else(|| Error::MalformedSignature("empty payload".to_string()))?;

        let elements = Script::from_bytes(rest)
            .instructions()
            .map(|instruction| match instruction {
                Ok(Instruction::PushBytes(push)) => Ok(push.as_bytes().to_vec()),
                Ok(Instruction::Op(op)) => Err(Error::MalformedSignature(format!(
                    "unexpected opcode {}",
                    op
                ))),
                Err(e) => Err(Error::MalformedSignature(e.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if usize::from(*count) != elements.len() {
            return Err(Error::MalformedSignature(format!(
                "item count {} does not match {} items",
                count,
                elements.len()
            )));
        }
        trace!("Decoded signature payload with {} items", elements.len());

        Ok(Self { elements })
    }

    /// Wraps a finalized witness.
    pub fn from_witness(witness: &Witness) -> Self {
        Self {
            elements: witness.to_vec(),
        }
    }

    /// The decoded witness elements, in stack order.
    pub fn elements(&self) -> &[Vec<u8>] {
        &self.elements
    }

    /// Returns the first `N` elements, failing if the payload is shorter.
    pub(crate) fn expect_elements<const N: usize>(&self) -> Result<[&[u8]; N], Error> {
        if self.elements.len() < N {
            return Err(Error::MalformedSignature(format!(
                "expected {} witness elements, found {}",
                N,
                self.elements.len()
            )));
        }

        Ok(core::array::from_fn(|i| self.elements[i].as_slice()))
    }

    /// Consensus serialization of the witness stack.
    pub fn to_bytes(&self) -> Vec<u8> {
        serialize(&Witness::from_slice(&self.elements))
    }

    /// Encodes the payload into its text form.
    pub fn encode(&self, encoding: SignatureEncoding) -> String {
        let bytes = self.to_bytes();

        match encoding {
            SignatureEncoding::Base64 => general_purpose::STANDARD.encode(bytes),
            SignatureEncoding::Hex => bytes.as_slice().to_lower_hex_string(),
        }
    }
}
