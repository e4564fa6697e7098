//! Text projections for digests, ciphertexts and identifiers.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How binary output is rendered as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Uppercase hexadecimal, two characters per byte, no separators.
    Hex,
    #[default]
    Base64,
}

impl Encoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Hex => to_hex(bytes),
            Encoding::Base64 => STANDARD.encode(bytes),
        }
    }

    pub fn decode(self, text: &str) -> Result<Vec<u8>> {
        let text = text.trim();
        match self {
            Encoding::Hex => from_hex(text),
            Encoding::Base64 => STANDARD
                .decode(text)
                .map_err(|e| Error::Format(format!("invalid base64: {e}"))),
        }
    }
}

/// Uppercase hex with no delimiters.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Parses hex text in either case. Each pair of characters is one byte.
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|e| Error::Format(format!("invalid hex: {e}")))
}
