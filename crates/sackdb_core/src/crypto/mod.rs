//! Payload encryption for SackDB.
//!
//! Payloads can be encrypted at rest with AES in CBC mode and PKCS#7
//! padding. Only the payload bytes are transformed; record headers and key
//! names stay in the clear.
//!
//! ## Security Model
//!
//! - AES-128, AES-192 or AES-256, selected by key length (16, 24, 32 bytes)
//! - 16-byte IV supplied by the caller and reused for every record
//! - Confidentiality only: there is no authentication tag, so tampering
//!   surfaces as a padding error or as garbage plaintext
//! - Key material is zeroized on drop
//!
//! ## Usage
//!
//! ```
//! use sackdb_core::crypto::KeyMaterial;
//!
//! let material = KeyMaterial::generate();
//! let ciphertext = material.encrypt(b"secret data").unwrap();
//! let plaintext = material.decrypt(&ciphertext).unwrap();
//! assert_eq!(plaintext, b"secret data");
//! ```

mod aes_cbc;
mod key;

pub use aes_cbc::{decrypt, encrypt, BLOCK_SIZE, IV_SIZE, KEY_SIZES};
pub use key::{KeyMaterial, DEFAULT_KEY_SIZE};
