//! Configuration loading and master-key resolution for the secrets subsystem.
//!
//! All values are read from environment variables at startup. Key resolution
//! happens once, before the first codec operation: a [`SecretCodec`] cannot be
//! constructed without a validated [`MasterKey`], so a missing or malformed
//! key surfaces at process start rather than on first use.
//!
//! [`SecretCodec`]: crate::crypto::SecretCodec

use std::fmt;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use zeroize::Zeroizing;

/// Byte length of the master key (the key-derivation input, not the cipher key).
pub const MASTER_KEY_LEN: usize = 32;

/// Well-known development key, usable only when insecure fallback is enabled.
const INSECURE_FALLBACK_KEY: [u8; MASTER_KEY_LEN] = *b"deckhand-insecure-dev-key-32byte";

/// Errors produced while resolving the master key.
#[derive(Debug, Error)]
pub enum MasterKeyError {
    /// No key was configured and the insecure fallback is not permitted.
    #[error("no master key configured; set ENC_KEY (generate one with: openssl rand -base64 32)")]
    ConfigurationMissing,

    /// The configured key is not valid base64.
    #[error("ENC_KEY is not valid base64")]
    InvalidEncoding,

    /// The configured key decodes to the wrong number of bytes.
    #[error("ENC_KEY must decode to {MASTER_KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// The process-wide key-derivation input: 32 raw bytes, loaded once at
/// startup and immutable for the process lifetime.
///
/// The buffer is overwritten with zeroes on drop, and the `Debug` impl never
/// prints key material, not even in debug builds.
#[derive(Clone)]
pub struct MasterKey(Zeroizing<[u8; MASTER_KEY_LEN]>);

impl MasterKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Decode a base64-encoded key, validating the decoded length.
    ///
    /// # Errors
    ///
    /// Returns [`MasterKeyError::InvalidEncoding`] if `encoded` is not valid
    /// base64, or [`MasterKeyError::InvalidLength`] if it does not decode to
    /// exactly [`MASTER_KEY_LEN`] bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, MasterKeyError> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|_| MasterKeyError::InvalidEncoding)?,
        );
        if decoded.len() != MASTER_KEY_LEN {
            return Err(MasterKeyError::InvalidLength(decoded.len()));
        }
        let mut bytes = [0u8; MASTER_KEY_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self::from_bytes(bytes))
    }

    /// Borrow the raw key bytes for key derivation.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

/// Validated secrets-subsystem configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretsConfig {
    /// Base64 encoding of the 32-byte master key. Required unless the
    /// insecure fallback is enabled.
    #[serde(default)]
    pub enc_key: Option<String>,

    /// Permit the well-known development key when `enc_key` is absent.
    /// Must stay `false` in production deployments.
    #[serde(default)]
    pub allow_insecure_fallback: bool,
}

impl SecretsConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment source cannot be read or the
    /// values cannot be deserialised.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: SecretsConfig = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        Ok(c)
    }

    /// Resolve the master key from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MasterKeyError::ConfigurationMissing`] if no key is
    /// configured and the insecure fallback is not enabled, or an encoding
    /// error if `enc_key` is present but invalid.
    pub fn master_key(&self) -> Result<MasterKey, MasterKeyError> {
        match &self.enc_key {
            Some(encoded) => MasterKey::from_base64(encoded),
            None if self.allow_insecure_fallback => {
                warn!("no master key configured; using the insecure development fallback key");
                Ok(MasterKey::from_bytes(INSECURE_FALLBACK_KEY))
            }
            None => Err(MasterKeyError::ConfigurationMissing),
        }
    }
}
