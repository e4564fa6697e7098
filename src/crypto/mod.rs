//! Cryptographic primitives.
//!
//! SHA-2 hashing and salted digests, key/IV derivation from arbitrary
//! secrets, and AES-CBC encryption keyed from the derived material.

pub mod cipher;
pub mod hash;
pub mod kdf;

pub use cipher::{decrypt, encrypt};
pub use hash::{HashWidth, salted_sequence, sha256, sha512};
pub use kdf::{KeyMaterial, KeySize, derive_key_and_iv};

/// Length of a SHA-256 digest (32 bytes).
pub const SHA256_LEN: usize = 32;
/// Length of a SHA-384 digest (48 bytes).
pub const SHA384_LEN: usize = 48;
/// Length of a SHA-512 digest (64 bytes).
pub const SHA512_LEN: usize = 64;
/// Largest AES key, and therefore largest derived IV (32 bytes / 256 bits).
pub const MAX_KEY_LEN: usize = 32;
/// AES block length (16 bytes), also the CBC IV length.
pub const BLOCK_LEN: usize = 16;
