//! AES-CBC with PKCS#7 padding.

use crate::error::{CoreError, CoreResult};
use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;
/// Size of the CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;
/// Accepted key sizes in bytes (AES-128, AES-192, AES-256).
pub const KEY_SIZES: [usize; 3] = [16, 24, 32];

/// Encrypts `plaintext` with AES-CBC and PKCS#7 padding.
///
/// The AES variant is chosen by the key length. The output is always a
/// non-empty multiple of [`BLOCK_SIZE`]; an empty input yields one padding
/// block.
///
/// # Errors
///
/// Returns [`CoreError::InvalidKeyMaterial`] if the key is not 16, 24 or 32
/// bytes, or the IV is not 16 bytes.
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> CoreResult<Vec<u8>> {
    check_iv(iv)?;
    match key.len() {
        16 => encrypt_with::<Aes128>(plaintext, key, iv),
        24 => encrypt_with::<Aes192>(plaintext, key, iv),
        32 => encrypt_with::<Aes256>(plaintext, key, iv),
        other => Err(bad_key_len(other)),
    }
}

/// Decrypts AES-CBC `ciphertext` and strips PKCS#7 padding.
///
/// # Errors
///
/// Returns [`CoreError::InvalidKeyMaterial`] for a wrong-size key or IV, and
/// [`CoreError::DecryptionFailed`] if the input is not a whole number of
/// blocks or the padding is invalid (wrong key, wrong IV, or corruption).
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> CoreResult<Vec<u8>> {
    check_iv(iv)?;
    match key.len() {
        16 => decrypt_with::<Aes128>(ciphertext, key, iv),
        24 => decrypt_with::<Aes192>(ciphertext, key, iv),
        32 => decrypt_with::<Aes256>(ciphertext, key, iv),
        other => Err(bad_key_len(other)),
    }
}

fn encrypt_with<C>(plaintext: &[u8], key: &[u8], iv: &[u8]) -> CoreResult<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CoreError::invalid_key_material("key or IV length rejected by cipher"))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn decrypt_with<C>(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> CoreResult<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CoreError::decryption_failed(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_SIZE}",
            ciphertext.len()
        )));
    }

    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CoreError::invalid_key_material("key or IV length rejected by cipher"))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CoreError::decryption_failed("invalid padding"))
}

fn check_iv(iv: &[u8]) -> CoreResult<()> {
    if iv.len() != IV_SIZE {
        return Err(CoreError::invalid_key_material(format!(
            "IV must be {IV_SIZE} bytes, got {}",
            iv.len()
        )));
    }
    Ok(())
}

fn bad_key_len(len: usize) -> CoreError {
    CoreError::invalid_key_material(format!("key must be 16, 24 or 32 bytes, got {len}"))
}
