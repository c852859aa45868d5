//! Authenticated secret encryption, display masking, and ciphertext detection.
//!
//! This module is intentionally free of configuration-source dependencies:
//! it operates on an injected [`MasterKey`](crate::config::MasterKey) and
//! in-memory strings only.
//!
//! # Envelope format
//!
//! ```text
//! base64( salt[16] || iv[16] || tag[16] || ciphertext[..] )
//! ```
//!
//! Each stored value carries its own random salt and IV, so every envelope is
//! independently decryptable given only the master key. The cipher key is
//! derived per value with PBKDF2-HMAC-SHA256; the authentication tag makes
//! any post-storage modification detectable.

pub mod codec;
pub mod detect;
pub mod mask;

pub use codec::{CodecError, SecretCodec};
pub use detect::is_encrypted;
pub use mask::mask;
