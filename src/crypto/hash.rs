use std::collections::VecDeque;
use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use tracing::debug;

use super::{SHA256_LEN, SHA384_LEN, SHA512_LEN};
use crate::error::{Error, Result};

/// One of the three SHA-2 widths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum HashWidth {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashWidth {
    pub const ALL: [HashWidth; 3] = [HashWidth::Sha256, HashWidth::Sha384, HashWidth::Sha512];

    pub const fn bits(self) -> u16 {
        match self {
            HashWidth::Sha256 => 256,
            HashWidth::Sha384 => 384,
            HashWidth::Sha512 => 512,
        }
    }

    /// Digest length in bytes.
    pub const fn output_len(self) -> usize {
        match self {
            HashWidth::Sha256 => SHA256_LEN,
            HashWidth::Sha384 => SHA384_LEN,
            HashWidth::Sha512 => SHA512_LEN,
        }
    }

    /// Hashes `data` in one shot. Strings are hashed as their UTF-8 bytes.
    pub fn digest(self, data: impl AsRef<[u8]>) -> Vec<u8> {
        let data = data.as_ref();
        match self {
            HashWidth::Sha256 => Sha256::digest(data).to_vec(),
            HashWidth::Sha384 => Sha384::digest(data).to_vec(),
            HashWidth::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Hashes everything `reader` yields without buffering it whole.
    pub fn digest_reader<R: Read>(self, reader: R) -> Result<Vec<u8>> {
        match self {
            HashWidth::Sha256 => stream_digest::<Sha256, R>(reader),
            HashWidth::Sha384 => stream_digest::<Sha384, R>(reader),
            HashWidth::Sha512 => stream_digest::<Sha512, R>(reader),
        }
    }

    /// Hashes `data` after interleaving `salt` into it with [`salted_sequence`].
    ///
    /// An empty salt leaves the data untouched, so the result equals
    /// [`HashWidth::digest`]. There is no built-in default salt; callers
    /// that want one must supply it, and a fixed salt gives no protection
    /// against precomputation.
    pub fn salted_digest(self, data: impl AsRef<[u8]>, salt: impl AsRef<[u8]>) -> Vec<u8> {
        let (data, salt) = (data.as_ref(), salt.as_ref());
        debug!(
            bits = self.bits(),
            data_len = data.len(),
            salt_len = salt.len(),
            "computing salted digest"
        );
        self.digest(salted_sequence(data, salt))
    }
}

impl TryFrom<u16> for HashWidth {
    type Error = Error;

    fn try_from(bits: u16) -> Result<Self> {
        match bits {
            256 => Ok(HashWidth::Sha256),
            384 => Ok(HashWidth::Sha384),
            512 => Ok(HashWidth::Sha512),
            other => Err(Error::invalid(
                "bits",
                format!("unsupported hash width {other}; expected 256, 384 or 512"),
            )),
        }
    }
}

impl From<HashWidth> for u16 {
    fn from(width: HashWidth) -> Self {
        width.bits()
    }
}

fn stream_digest<D, R>(mut reader: R) -> Result<Vec<u8>>
where
    D: Digest + Write,
    R: Read,
{
    let mut hasher = D::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hasher.finalize().to_vec())
}

/// Builds the buffer that gets hashed for a salted digest.
///
/// The salt is appended to the data, then every salt byte, in order, is
/// inserted once at the front and once just before the last element of
/// the growing buffer. The output has `data.len() + 3 * salt.len()` bytes
/// and must stay byte-for-byte stable for digests to agree with existing
/// data.
pub fn salted_sequence(data: &[u8], salt: &[u8]) -> Vec<u8> {
    let mut seq: VecDeque<u8> = VecDeque::with_capacity(data.len() + 3 * salt.len());
    seq.extend(data);
    seq.extend(salt);

    for &b in salt {
        seq.push_front(b);
        let before_last = seq.len() - 1;
        seq.insert(before_last, b);
    }

    seq.into()
}

pub fn sha256(data: impl AsRef<[u8]>) -> [u8; SHA256_LEN] {
    let mut out = [0u8; SHA256_LEN];
    out.copy_from_slice(&Sha256::digest(data.as_ref()));
    out
}

pub fn sha512(data: impl AsRef<[u8]>) -> [u8; SHA512_LEN] {
    let mut out = [0u8; SHA512_LEN];
    out.copy_from_slice(&Sha512::digest(data.as_ref()));
    out
}
