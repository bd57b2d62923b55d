//! Key and IV handling.

use super::aes_cbc::{self, IV_SIZE, KEY_SIZES};
use crate::error::{CoreError, CoreResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key size used by [`KeyMaterial::generate`] (AES-256).
pub const DEFAULT_KEY_SIZE: usize = 32;

/// A cipher key and initialization vector.
///
/// Sizes are not checked on construction; a wrong-size key or IV is reported
/// as [`CoreError::InvalidKeyMaterial`] by the first encrypt or decrypt call,
/// or eagerly by [`validate`](Self::validate).
///
/// The bytes are zeroized when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    key: Vec<u8>,
    iv: Vec<u8>,
}

impl KeyMaterial {
    /// Creates key material from raw bytes.
    pub fn new(key: impl Into<Vec<u8>>, iv: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            iv: iv.into(),
        }
    }

    /// Generates a random AES-256 key and IV.
    #[must_use]
    pub fn generate() -> Self {
        Self::random(DEFAULT_KEY_SIZE)
    }

    /// Generates a random key of `key_size` bytes and a random IV.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKeyMaterial`] if `key_size` is not 16, 24
    /// or 32.
    pub fn generate_with_key_size(key_size: usize) -> CoreResult<Self> {
        if !KEY_SIZES.contains(&key_size) {
            return Err(CoreError::invalid_key_material(format!(
                "key must be 16, 24 or 32 bytes, got {key_size}"
            )));
        }
        Ok(Self::random(key_size))
    }

    fn random(key_size: usize) -> Self {
        let mut rng = rand::thread_rng();
        let mut key = vec![0u8; key_size];
        let mut iv = vec![0u8; IV_SIZE];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut iv);
        Self { key, iv }
    }

    /// Decodes key material from standard base64 strings.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if either string is not valid
    /// base64.
    pub fn from_base64(key: &str, iv: &str) -> CoreResult<Self> {
        let key = STANDARD
            .decode(key.trim())
            .map_err(|e| CoreError::invalid_config(format!("key is not valid base64: {e}")))?;
        let iv = STANDARD
            .decode(iv.trim())
            .map_err(|e| CoreError::invalid_config(format!("IV is not valid base64: {e}")))?;
        Ok(Self { key, iv })
    }

    /// Encodes the key and IV as standard base64 strings.
    ///
    /// # Security
    ///
    /// The returned strings are the secret; don't log them.
    #[must_use]
    pub fn to_base64(&self) -> (String, String) {
        (STANDARD.encode(&self.key), STANDARD.encode(&self.iv))
    }

    /// Returns the key bytes.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Returns the IV bytes.
    #[must_use]
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Checks the key and IV sizes without encrypting anything.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKeyMaterial`] if either size is wrong.
    pub fn validate(&self) -> CoreResult<()> {
        if !KEY_SIZES.contains(&self.key.len()) {
            return Err(CoreError::invalid_key_material(format!(
                "key must be 16, 24 or 32 bytes, got {}",
                self.key.len()
            )));
        }
        if self.iv.len() != IV_SIZE {
            return Err(CoreError::invalid_key_material(format!(
                "IV must be {IV_SIZE} bytes, got {}",
                self.iv.len()
            )));
        }
        Ok(())
    }

    /// Encrypts `plaintext` with this key and IV.
    ///
    /// # Errors
    ///
    /// See [`aes_cbc::encrypt`].
    pub fn encrypt(&self, plaintext: &[u8]) -> CoreResult<Vec<u8>> {
        aes_cbc::encrypt(plaintext, &self.key, &self.iv)
    }

    /// Decrypts `ciphertext` with this key and IV.
    ///
    /// # Errors
    ///
    /// See [`aes_cbc::decrypt`].
    pub fn decrypt(&self, ciphertext: &[u8]) -> CoreResult<Vec<u8>> {
        aes_cbc::decrypt(ciphertext, &self.key, &self.iv)
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}
