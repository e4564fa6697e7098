//! AES-CBC with PKCS#7 padding keyed from [`KeyMaterial`].
//!
//! AES has a fixed 16-byte block, so CBC uses the first block-length
//! bytes of the derived IV whatever the key size.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use tracing::debug;

use super::BLOCK_LEN;
use super::kdf::{KeyMaterial, KeySize};
use crate::error::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt plaintext. The output is always a non-empty multiple of 16 bytes.
pub fn encrypt(material: &KeyMaterial, plaintext: &[u8]) -> Result<Vec<u8>> {
    debug!(
        key_bits = material.size().bits(),
        len = plaintext.len(),
        "aes-cbc encrypt"
    );
    match material.size() {
        KeySize::Aes128 => encrypt_with::<Aes128CbcEnc>(material, plaintext),
        KeySize::Aes192 => encrypt_with::<Aes192CbcEnc>(material, plaintext),
        KeySize::Aes256 => encrypt_with::<Aes256CbcEnc>(material, plaintext),
    }
}

/// Decrypt ciphertext
///
/// # Errors
///
/// Returns [`Error::Decryption`] for empty input, a length that is not a
/// multiple of 16, or bad padding.
pub fn decrypt(material: &KeyMaterial, ciphertext: &[u8]) -> Result<Vec<u8>> {
    debug!(
        key_bits = material.size().bits(),
        len = ciphertext.len(),
        "aes-cbc decrypt"
    );
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(Error::Decryption);
    }

    match material.size() {
        KeySize::Aes128 => decrypt_with::<Aes128CbcDec>(material, ciphertext),
        KeySize::Aes192 => decrypt_with::<Aes192CbcDec>(material, ciphertext),
        KeySize::Aes256 => decrypt_with::<Aes256CbcDec>(material, ciphertext),
    }
}

fn encrypt_with<C>(material: &KeyMaterial, plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: KeyIvInit + BlockEncryptMut,
{
    let cipher = C::new_from_slices(material.key(), &material.iv()[..BLOCK_LEN])
        .map_err(|_| Error::invalid("key", "key or IV length rejected by AES"))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn decrypt_with<C>(material: &KeyMaterial, ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: KeyIvInit + BlockDecryptMut,
{
    let cipher = C::new_from_slices(material.key(), &material.iv()[..BLOCK_LEN])
        .map_err(|_| Error::invalid("key", "key or IV length rejected by AES"))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Decryption)
}
