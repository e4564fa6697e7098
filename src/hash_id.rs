//! 256-bit content identifiers.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use getrandom::fill;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::crypto::{SHA256_LEN, sha256};
use crate::encoding::{from_hex, to_hex};
use crate::error::{Error, Result};

/// Length of the hex form (64 characters).
pub const HEX_LEN: usize = SHA256_LEN * 2;
/// Length of the compact projection (16 bytes).
pub const COMPACT_LEN: usize = 16;

/// A 256-bit identifier, normally the SHA-256 digest of some content.
///
/// Stored as four 64-bit words; word `i` is bytes `8i..8i+8` of the
/// digest read little-endian. Equality compares all four words. The hex
/// and raw byte forms are lossless and are the only persisted forms.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct HashId {
    first: u64,
    second: u64,
    third: u64,
    fourth: u64,
}

impl HashId {
    /// Wraps a 32-byte digest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `bytes` is not exactly 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; SHA256_LEN] = bytes.try_into().map_err(|_| {
            Error::invalid(
                "hash",
                format!("length must be {SHA256_LEN} bytes, got {}", bytes.len()),
            )
        })?;
        Ok(Self::from(*bytes))
    }

    /// Parses 64 hex characters, one byte per pair, in either case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `hex` is not 64 characters
    /// long, and [`Error::Format`] if any character is not a hex digit.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let chars = hex.chars().count();
        if chars != HEX_LEN {
            return Err(Error::invalid(
                "hash",
                format!("length must be {HEX_LEN} characters, got {chars}"),
            ));
        }
        Self::from_bytes(&from_hex(hex)?)
    }

    pub fn to_bytes(&self) -> [u8; SHA256_LEN] {
        let mut out = [0u8; SHA256_LEN];
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.words()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// 64 uppercase hex characters, no separators.
    pub fn to_hex(&self) -> String {
        to_hex(&self.to_bytes())
    }

    /// Folds the identifier to 128 bits: `first ^ second` then
    /// `third ^ fourth`, each little-endian.
    ///
    /// Lossy. Distinct identifiers can share a compact form, so use it only
    /// where a 128-bit slot is all there is, never as a stored key.
    pub fn to_compact(&self) -> [u8; COMPACT_LEN] {
        let mut out = [0u8; COMPACT_LEN];
        out[..8].copy_from_slice(&(self.first ^ self.second).to_le_bytes());
        out[8..].copy_from_slice(&(self.third ^ self.fourth).to_le_bytes());
        out
    }

    /// The compact form laid out as a GUID string, with the first three
    /// groups read little-endian (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
    pub fn to_guid_string(&self) -> String {
        let b = self.to_compact();
        format!(
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{}",
            u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            u16::from_le_bytes([b[4], b[5]]),
            u16::from_le_bytes([b[6], b[7]]),
            b[8],
            b[9],
            b[10..].iter().map(|x| format!("{x:02x}")).collect::<String>()
        )
    }

    /// XOR of the four words.
    pub fn long_hash_code(&self) -> u64 {
        self.first ^ self.second ^ self.third ^ self.fourth
    }

    /// XOR of the low and high halves of [`HashId::long_hash_code`].
    /// Only for in-memory placement; it is not a content hash.
    pub fn hash_code(&self) -> i32 {
        let long = self.long_hash_code();
        (long as u32 as i32) ^ ((long >> 32) as u32 as i32)
    }

    /// Identifier of `data`: its SHA-256 digest. Strings are hashed as UTF-8.
    pub fn generate(data: impl AsRef<[u8]>) -> Self {
        Self::from(sha256(data))
    }

    /// Identifier of fresh entropy: four random 128-bit values hashed
    /// together with SHA-256.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Entropy`] if the OS random generator fails.
    pub fn random() -> Result<Self> {
        let mut entropy = [0u8; 64];
        for chunk in entropy.chunks_exact_mut(16) {
            fill(chunk).map_err(|_| Error::Entropy)?;
        }
        Ok(Self::generate(entropy))
    }

    fn words(&self) -> [u64; 4] {
        [self.first, self.second, self.third, self.fourth]
    }
}

impl From<[u8; SHA256_LEN]> for HashId {
    fn from(bytes: [u8; SHA256_LEN]) -> Self {
        let word = |i: usize| {
            let mut w = [0u8; 8];
            w.copy_from_slice(&bytes[i * 8..i * 8 + 8]);
            u64::from_le_bytes(w)
        };
        Self {
            first: word(0),
            second: word(1),
            third: word(2),
            fourth: word(3),
        }
    }
}

impl From<HashId> for [u8; SHA256_LEN] {
    fn from(id: HashId) -> Self {
        id.to_bytes()
    }
}

impl Hash for HashId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code());
    }
}

impl fmt::Display for HashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for HashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashId({})", self.to_hex())
    }
}

impl FromStr for HashId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for HashId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for HashId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_bytes() -> [u8; 32] {
        let mut b = [0u8; 32];
        for (i, x) in b.iter_mut().enumerate() {
            *x = i as u8;
        }
        b
    }

    #[test]
    fn bytes_roundtrip() {
        let bytes = sample_bytes();
        assert_eq!(HashId::from_bytes(&bytes).unwrap().to_bytes(), bytes);
    }

    #[test]
    fn wrong_byte_length_fails() {
        for len in [0, 31, 33, 64] {
            let bytes = vec![0u8; len];
            assert!(matches!(
                HashId::from_bytes(&bytes),
                Err(Error::InvalidArgument { .. })
            ));
        }
    }

    #[test]
    fn words_are_little_endian_quadrants() {
        let id = HashId::from(sample_bytes());
        assert_eq!(id.first, 0x0706050403020100);
        assert_eq!(id.fourth, 0x1f1e1d1c1b1a1918);
    }

    #[test]
    fn hex_is_uppercase_in_byte_order() {
        let id = HashId::from(sample_bytes());
        assert_eq!(
            id.to_hex(),
            "000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F"
        );
        assert_eq!(id.to_string(), id.to_hex());
    }

    #[test]
    fn hex_roundtrip_accepts_lowercase() {
        let id = HashId::generate(b"content");
        assert_eq!(HashId::from_hex(&id.to_hex()).unwrap(), id);
        assert_eq!(HashId::from_hex(&id.to_hex().to_lowercase()).unwrap(), id);
        assert_eq!(id.to_hex().parse::<HashId>().unwrap(), id);
    }

    #[test]
    fn wrong_hex_length_is_invalid_argument() {
        assert!(matches!(
            HashId::from_hex("ABCD"),
            Err(Error::InvalidArgument { .. })
        ));
        let long = "0".repeat(65);
        assert!(matches!(
            HashId::from_hex(&long),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn non_hex_character_is_format_error() {
        let mut hex = "0".repeat(63);
        hex.push('G');
        assert!(matches!(HashId::from_hex(&hex), Err(Error::Format(_))));
    }

    #[test]
    fn multibyte_characters_are_format_error() {
        let mut hex = "0".repeat(63);
        hex.push('é');
        assert!(matches!(HashId::from_hex(&hex), Err(Error::Format(_))));
    }

    #[test]
    fn generate_is_sha256_of_data() {
        let id = HashId::generate("abc");
        assert_eq!(
            id.to_hex(),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
        assert_eq!(HashId::generate(b"abc"), id);
    }

    #[test]
    fn random_ids_differ() {
        let a = HashId::random().unwrap();
        let b = HashId::random().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn equality_needs_all_words() {
        let mut bytes = sample_bytes();
        let a = HashId::from(bytes);
        bytes[31] ^= 1;
        let b = HashId::from(bytes);
        assert_ne!(a, b);
        assert!(a != b);
    }

    #[test]
    fn compact_xors_word_pairs() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x0f;
        bytes[8] = 0xf0;
        bytes[16] = 0xaa;
        bytes[24] = 0xaa;
        let compact = HashId::from(bytes).to_compact();
        assert_eq!(compact[0], 0xff);
        assert_eq!(compact[8], 0x00);
        assert_eq!(&compact[1..8], &[0u8; 7]);
    }

    #[test]
    fn compact_is_lossy() {
        // swapping first and second keeps the XOR
        let mut a = [0u8; 32];
        a[0] = 1;
        let mut b = [0u8; 32];
        b[8] = 1;
        let (a, b) = (HashId::from(a), HashId::from(b));
        assert_ne!(a, b);
        assert_eq!(a.to_compact(), b.to_compact());
    }

    #[test]
    fn guid_string_uses_mixed_endian_groups() {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(&[
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ]);
        let id = HashId::from(bytes);
        assert_eq!(id.to_guid_string(), "33221100-5544-7766-8899-aabbccddeeff");
    }

    #[test]
    fn hash_code_folds_words() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x01;
        bytes[4] = 0x02;
        bytes[8] = 0x10;
        let id = HashId::from(bytes);
        assert_eq!(id.long_hash_code(), 0x0000_0002_0000_0011);
        assert_eq!(id.hash_code(), 0x13);
    }

    #[test]
    fn works_as_set_member() {
        let mut set = HashSet::new();
        set.insert(HashId::generate("a"));
        set.insert(HashId::generate("b"));
        set.insert(HashId::generate("a"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = HashId::generate("abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let back: HashId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn deserialize_rejects_bad_hex() {
        assert!(serde_json::from_str::<HashId>("\"XYZ\"").is_err());
    }
}

#[cfg(test)]
mod proptest_suite {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn raw_and_hex_forms_are_lossless(bytes in prop::array::uniform32(any::<u8>())) {
            let id = HashId::from_bytes(&bytes).unwrap();
            prop_assert_eq!(id.to_bytes(), bytes);
            prop_assert_eq!(HashId::from_hex(&id.to_hex()).unwrap(), id);
            prop_assert_eq!(id.to_hex().len(), HEX_LEN);
        }
    }
}
