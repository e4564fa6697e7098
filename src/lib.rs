//! Hashing, salted digests, AES-CBC encryption with derived keys, and
//! 256-bit [`HashId`] identifiers.
//!
//! Every operation is a pure, in-memory transformation of its inputs, so
//! all of them can be called from any number of threads at once.

pub mod config;
pub mod crypto;
pub mod encoding;
mod error;
pub mod hash_id;
pub mod storage;

pub use crate::crypto::{HashWidth, KeyMaterial, KeySize, derive_key_and_iv};
pub use crate::encoding::Encoding;
pub use crate::error::{Error, Result};
pub use crate::hash_id::HashId;

use std::io::Read;
use zeroize::Zeroizing;

/// Encrypts and decrypts with keys derived from a caller secret.
///
/// The secret may have any length; [`derive_key_and_iv`] turns it into a
/// key and IV of the configured size on every call. Equal inputs give
/// equal ciphertexts because the IV comes from the secret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cipher {
    key_size: KeySize,
}

impl Cipher {
    pub fn new(key_size: KeySize) -> Self {
        Self { key_size }
    }

    pub fn key_size(&self) -> KeySize {
        self.key_size
    }

    pub fn encrypt(&self, plaintext: impl AsRef<[u8]>, secret: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let material = derive_key_and_iv(secret.as_ref(), self.key_size);
        crypto::encrypt(&material, plaintext.as_ref())
    }

    /// Decrypts `ciphertext` with a key derived from `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decryption`] if the ciphertext is empty, is not a
    /// whole number of blocks, or its padding does not check out. A wrong
    /// secret, a wrong key size or damaged data usually ends up here.
    pub fn decrypt(&self, ciphertext: impl AsRef<[u8]>, secret: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let material = derive_key_and_iv(secret.as_ref(), self.key_size);
        crypto::decrypt(&material, ciphertext.as_ref())
    }

    /// Decrypts and decodes the plaintext as UTF-8.
    pub fn decrypt_string(
        &self,
        ciphertext: impl AsRef<[u8]>,
        secret: impl AsRef<[u8]>,
    ) -> Result<String> {
        let plaintext = self.decrypt(ciphertext, secret)?;
        String::from_utf8(plaintext)
            .map_err(|_| Error::Format("decrypted data is not valid UTF-8".to_string()))
    }

    /// Reads all of `reader` into memory, then encrypts it.
    pub fn encrypt_reader<R: Read>(&self, reader: R, secret: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let plaintext = read_all(reader)?;
        self.encrypt(&*plaintext, secret)
    }

    /// Reads all of `reader` into memory, then decrypts it.
    pub fn decrypt_reader<R: Read>(&self, reader: R, secret: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let ciphertext = read_all(reader)?;
        self.decrypt(&*ciphertext, secret)
    }

    /// Ciphertext rendered as hex or Base64 text.
    pub fn encrypt_encoded(
        &self,
        plaintext: impl AsRef<[u8]>,
        secret: impl AsRef<[u8]>,
        encoding: Encoding,
    ) -> Result<String> {
        Ok(encoding.encode(&self.encrypt(plaintext, secret)?))
    }

    pub fn decrypt_encoded(
        &self,
        ciphertext: &str,
        secret: impl AsRef<[u8]>,
        encoding: Encoding,
    ) -> Result<Vec<u8>> {
        self.decrypt(encoding.decode(ciphertext)?, secret)
    }
}

pub fn encrypt(
    plaintext: impl AsRef<[u8]>,
    secret: impl AsRef<[u8]>,
    key_size: KeySize,
) -> Result<Vec<u8>> {
    Cipher::new(key_size).encrypt(plaintext, secret)
}

pub fn decrypt(
    ciphertext: impl AsRef<[u8]>,
    secret: impl AsRef<[u8]>,
    key_size: KeySize,
) -> Result<Vec<u8>> {
    Cipher::new(key_size).decrypt(ciphertext, secret)
}

fn read_all<R: Read>(mut reader: R) -> Result<Zeroizing<Vec<u8>>> {
    let mut buf = Zeroizing::new(Vec::new());
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}


#[cfg(test)]
mod proptest_suite {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_plaintext_roundtrips(
            plaintext in prop::collection::vec(any::<u8>(), 0..300),
            secret in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            let ciphertext = encrypt(&plaintext, &secret, KeySize::Aes128).unwrap();
            prop_assert_eq!(ciphertext.len() % 16, 0);
            prop_assert_eq!(decrypt(&ciphertext, &secret, KeySize::Aes128).unwrap(), plaintext);
        }
    }
}
