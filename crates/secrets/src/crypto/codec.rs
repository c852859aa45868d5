//! AES-256-GCM envelope encryption with per-value key derivation.
//!
//! Every call to [`SecretCodec::encrypt`] draws a fresh salt and IV from the
//! OS CSPRNG. Reusing either across calls under the same master key would
//! break the authenticated-encryption guarantees, so neither is ever cached.
//!
//! The iteration count is fixed rather than caller-adjustable; key derivation
//! dominates the cost of every operation and is the same for encrypt and
//! decrypt.

use aes_gcm::{
    aead::{consts::U16, AeadInPlace, KeyInit, OsRng},
    aes::Aes256,
    AesGcm, Key, Nonce, Tag,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::MasterKey;

/// Byte length of the derived AES-256 cipher key.
pub const KEY_LEN: usize = 32;

/// Byte length of the per-value key-derivation salt.
pub const SALT_LEN: usize = 16;

/// Byte length of the GCM initialisation vector.
pub const IV_LEN: usize = 16;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Minimum decoded length of a valid envelope: salt + IV + tag with an empty
/// ciphertext.
pub const MIN_ENVELOPE_LEN: usize = SALT_LEN + IV_LEN + TAG_LEN;

/// PBKDF2-HMAC-SHA256 iteration count for key derivation.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// AES-256-GCM parameterised with the 16-byte IV carried in the envelope.
type EnvelopeCipher = AesGcm<Aes256, U16>;

/// Errors produced by the secret codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The stored value is not valid base64, decodes to fewer than
    /// [`MIN_ENVELOPE_LEN`] bytes, or authenticated to non-UTF-8 plaintext.
    /// Indicates corrupted storage or an upstream programming error; not
    /// retryable.
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(&'static str),

    /// The authentication tag did not verify: wrong master key, storage
    /// corruption, or tampering. Must never be downgraded to returning the
    /// stored value as plaintext.
    #[error("ciphertext failed authentication")]
    AuthenticationFailed,

    /// The AEAD layer rejected the encrypt operation (unreachable with a
    /// valid derived key and fresh IV).
    #[error("aead operation failed")]
    AeadFailure,
}

/// Authenticated encrypt/decrypt of secret strings under an injected master key.
///
/// The codec holds only the immutable [`MasterKey`], so a single instance is
/// safe to share across threads; every operation is a pure function of its
/// inputs plus fresh CSPRNG output.
#[derive(Clone, Debug)]
pub struct SecretCodec {
    master_key: MasterKey,
}

impl SecretCodec {
    /// Create a codec from a validated master key.
    pub fn new(master_key: MasterKey) -> Self {
        Self { master_key }
    }

    /// Encrypt a plaintext value into a self-contained envelope string.
    ///
    /// Any string encrypts successfully, including the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::AeadFailure`] on an internal AEAD error (should
    /// be unreachable with a valid key and IV).
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        use aes_gcm::aead::rand_core::RngCore;
        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);

        let key = derive_key(self.master_key.as_bytes(), &salt);
        let cipher = EnvelopeCipher::new(Key::<EnvelopeCipher>::from_slice(key.as_slice()));

        let mut ciphertext = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut ciphertext)
            .map_err(|_| CodecError::AeadFailure)?;

        let mut envelope = Vec::with_capacity(MIN_ENVELOPE_LEN + ciphertext.len());
        envelope.extend_from_slice(&salt);
        envelope.extend_from_slice(&iv);
        envelope.extend_from_slice(&tag);
        envelope.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(envelope))
    }

    /// Decrypt an envelope string back to the original plaintext.
    ///
    /// Verification is all-or-nothing: a failed tag check yields an error,
    /// never partial or garbage plaintext.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedCiphertext`] if the value is not valid
    /// base64 or is shorter than the fixed envelope header, and
    /// [`CodecError::AuthenticationFailed`] if the tag does not verify.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CodecError> {
        let envelope = STANDARD
            .decode(ciphertext)
            .map_err(|_| CodecError::MalformedCiphertext("not valid base64"))?;
        if envelope.len() < MIN_ENVELOPE_LEN {
            return Err(CodecError::MalformedCiphertext(
                "shorter than salt + iv + tag",
            ));
        }

        let (salt, rest) = envelope.split_at(SALT_LEN);
        let (iv, rest) = rest.split_at(IV_LEN);
        let (tag, data) = rest.split_at(TAG_LEN);

        // Same KDF parameters as encrypt, using the salt embedded in this
        // envelope, never a salt from any other value.
        let key = derive_key(self.master_key.as_bytes(), salt);
        let cipher = EnvelopeCipher::new(Key::<EnvelopeCipher>::from_slice(key.as_slice()));

        let mut plaintext = data.to_vec();
        cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(iv),
                b"",
                &mut plaintext,
                Tag::from_slice(tag),
            )
            .map_err(|_| CodecError::AuthenticationFailed)?;

        String::from_utf8(plaintext)
            .map_err(|_| CodecError::MalformedCiphertext("plaintext is not valid UTF-8"))
    }
}

/// Derive the AES-256 cipher key from the master key and a per-value salt.
fn derive_key(master_key: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut derived = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(master_key, salt, PBKDF2_ITERATIONS, derived.as_mut_slice());
    derived
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MasterKey;

    fn test_codec() -> SecretCodec {
        SecretCodec::new(MasterKey::from_bytes([0x42u8; 32]))
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let codec = test_codec();
        let envelope = codec.encrypt("sk-ant-api03-abcdef").unwrap();
        assert_eq!(codec.decrypt(&envelope).unwrap(), "sk-ant-api03-abcdef");
    }

    #[test]
    fn empty_string_round_trip() {
        let codec = test_codec();
        let envelope = codec.encrypt("").unwrap();
        assert_eq!(codec.decrypt(&envelope).unwrap(), "");
    }

    #[test]
    fn multibyte_utf8_round_trip() {
        let codec = test_codec();
        let plaintext = "pässwörd-秘密-🔑";
        let envelope = codec.encrypt(plaintext).unwrap();
        assert_eq!(codec.decrypt(&envelope).unwrap(), plaintext);
    }

    #[test]
    fn fresh_salt_and_iv_per_call() {
        let codec = test_codec();
        let first = codec.encrypt("same input").unwrap();
        let second = codec.encrypt("same input").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn tampered_ciphertext_fails_auth() {
        let codec = test_codec();
        let envelope = codec.encrypt("tamper me").unwrap();
        let mut raw = STANDARD.decode(&envelope).unwrap();
        // Flip a byte in the ciphertext region, past the fixed header.
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        let tampered = STANDARD.encode(raw);
        assert_eq!(
            codec.decrypt(&tampered),
            Err(CodecError::AuthenticationFailed)
        );
    }

    #[test]
    fn tampered_tag_fails_auth() {
        let codec = test_codec();
        let envelope = codec.encrypt("tamper me").unwrap();
        let mut raw = STANDARD.decode(&envelope).unwrap();
        raw[SALT_LEN + IV_LEN] ^= 0x01;
        let tampered = STANDARD.encode(raw);
        assert_eq!(
            codec.decrypt(&tampered),
            Err(CodecError::AuthenticationFailed)
        );
    }

    #[test]
    fn wrong_master_key_fails_auth() {
        let envelope = test_codec().encrypt("secret").unwrap();
        let other = SecretCodec::new(MasterKey::from_bytes([0x43u8; 32]));
        assert_eq!(other.decrypt(&envelope), Err(CodecError::AuthenticationFailed));
    }

    #[test]
    fn rejects_non_base64_input() {
        let codec = test_codec();
        assert!(matches!(
            codec.decrypt("not base64 at all!"),
            Err(CodecError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn rejects_short_envelope() {
        let codec = test_codec();
        let short = STANDARD.encode([0u8; MIN_ENVELOPE_LEN - 1]);
        assert!(matches!(
            codec.decrypt(&short),
            Err(CodecError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn envelope_layout_matches_plaintext_length() {
        let codec = test_codec();
        let envelope = codec.encrypt("12345").unwrap();
        let raw = STANDARD.decode(&envelope).unwrap();
        assert_eq!(raw.len(), MIN_ENVELOPE_LEN + 5);
    }
}
