use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::MAX_KEY_LEN;
use super::hash::sha512;
use crate::error::{Error, Result};

/// AES key size. The derived IV has the same length as the key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum KeySize {
    Aes128,
    Aes192,
    #[default]
    Aes256,
}

impl KeySize {
    pub const ALL: [KeySize; 3] = [KeySize::Aes128, KeySize::Aes192, KeySize::Aes256];

    pub const fn bits(self) -> u16 {
        match self {
            KeySize::Aes128 => 128,
            KeySize::Aes192 => 192,
            KeySize::Aes256 => 256,
        }
    }

    pub const fn bytes(self) -> usize {
        self.bits() as usize / 8
    }
}

impl TryFrom<u16> for KeySize {
    type Error = Error;

    fn try_from(bits: u16) -> Result<Self> {
        match bits {
            128 => Ok(KeySize::Aes128),
            192 => Ok(KeySize::Aes192),
            256 => Ok(KeySize::Aes256),
            other => Err(Error::invalid(
                "key_size",
                format!("unsupported key size {other}; expected 128, 192 or 256"),
            )),
        }
    }
}

impl From<KeySize> for u16 {
    fn from(size: KeySize) -> Self {
        size.bits()
    }
}

/// Key and IV derived from a caller secret for a single cipher call.
///
/// Both buffers hold exactly `size.bytes()` meaningful bytes. They are
/// wiped on drop and never leave the call that derived them.
pub struct KeyMaterial {
    size: KeySize,
    key: [u8; MAX_KEY_LEN],
    iv: [u8; MAX_KEY_LEN],
}

impl KeyMaterial {
    pub fn size(&self) -> KeySize {
        self.size
    }

    pub fn key(&self) -> &[u8] {
        &self.key[..self.size.bytes()]
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv[..self.size.bytes()]
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("size", &self.size)
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

/// Stretches or trims an arbitrary-length secret into an AES key, and
/// takes the IV from the SHA-512 digest of the secret.
///
/// With `n = size.bytes()` and `digest = SHA512(secret)`:
///
/// - `iv` is `digest[..n]`.
/// - a secret of exactly `n` bytes is the key as is.
/// - a longer secret loses bytes from the front until `n` remain.
/// - a shorter secret is extended with `digest[n]`, `digest[n + 1]`, ...
///   and the cursor wraps back to `n` (not 0) after the last digest byte.
///
/// The output must match previously encrypted data byte for byte, so the
/// schedule above is fixed. An empty secret is valid input.
pub fn derive_key_and_iv(secret: &[u8], size: KeySize) -> KeyMaterial {
    let n = size.bytes();
    let digest = Zeroizing::new(sha512(secret));

    let mut material = KeyMaterial {
        size,
        key: [0u8; MAX_KEY_LEN],
        iv: [0u8; MAX_KEY_LEN],
    };
    material.iv[..n].copy_from_slice(&digest[..n]);

    if secret.len() >= n {
        // shrink: only the trailing n bytes survive
        material.key[..n].copy_from_slice(&secret[secret.len() - n..]);
    } else {
        // grow: append digest bytes from the cursor
        material.key[..secret.len()].copy_from_slice(secret);
        let mut cursor = n;
        for slot in &mut material.key[secret.len()..n] {
            *slot = digest[cursor];
            cursor += 1;
            if cursor > digest.len() - 1 {
                cursor = n;
            }
        }
    }

    debug!(
        key_bits = size.bits(),
        secret_len = secret.len(),
        adjusted = secret.len() != n,
        "derived key material"
    );

    material
}
