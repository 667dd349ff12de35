//! Tenant-scoped credential encryption.
//!
//! Each tenant gets its own ChaCha20-Poly1305 key, derived from the master key
//! with HKDF-SHA256 and the tenant id as context. A ciphertext produced for one
//! tenant does not open under another.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use crate::errors::StorageError;

const NONCE_LEN: usize = 12;
const KEY_SALT: &[u8] = b"coinhub/trading-account-credentials/v1";

#[derive(Clone)]
pub struct CredentialCipher {
    master_key: [u8; 32],
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher").finish_non_exhaustive()
    }
}

impl CredentialCipher {
    pub fn new(master_key: [u8; 32]) -> Self {
        Self { master_key }
    }

    /// Builds a cipher from a base64 (or raw 32-character) master key.
    pub fn from_encoded(raw: &str) -> Result<Self, StorageError> {
        decode_master_key(raw).map(Self::new)
    }

    fn tenant_cipher(&self, tenant_id: &str) -> Result<ChaCha20Poly1305, StorageError> {
        let hk = Hkdf::<Sha256>::new(Some(KEY_SALT), &self.master_key);
        let mut key = [0u8; 32];
        hk.expand(tenant_id.as_bytes(), &mut key)
            .map_err(|e| StorageError::Crypto(format!("Failed to derive tenant key: {e}")))?;
        ChaCha20Poly1305::new_from_slice(&key)
            .map_err(|e| StorageError::Crypto(format!("Invalid tenant key: {e}")))
    }

    /// Encrypts `plaintext` for `tenant_id`. Output is base64 of nonce followed by ciphertext.
    pub fn encrypt(&self, tenant_id: &str, plaintext: &str) -> Result<String, StorageError> {
        let cipher = self.tenant_cipher(tenant_id)?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| StorageError::Crypto("Failed to encrypt credential".into()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    pub fn decrypt(&self, tenant_id: &str, sealed: &str) -> Result<String, StorageError> {
        let bytes = BASE64
            .decode(sealed)
            .map_err(|e| StorageError::Crypto(format!("Failed to decode credential: {e}")))?;
        if bytes.len() <= NONCE_LEN {
            return Err(StorageError::Crypto("Credential ciphertext too short".into()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .tenant_cipher(tenant_id)?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| StorageError::Crypto("Failed to decrypt credential".into()))?;
        String::from_utf8(plaintext)
            .map_err(|_| StorageError::Crypto("Credential is not valid UTF-8".into()))
    }
}

/// Decodes a 32-byte master key given as base64 or as a raw 32-character string.
pub fn decode_master_key(raw: &str) -> Result<[u8; 32], StorageError> {
    let trimmed = raw.trim();
    let decoded = match BASE64.decode(trimmed) {
        Ok(bytes) => bytes,
        Err(_) if trimmed.len() == 32 => trimmed.as_bytes().to_vec(),
        Err(_) => {
            return Err(StorageError::InvalidKey(
                "COINHUB_SECRET_KEY must be a base64 string or 32-byte ascii value".into(),
            ))
        }
    };

    <[u8; 32]>::try_from(decoded.as_slice()).map_err(|_| {
        StorageError::InvalidKey("COINHUB_SECRET_KEY must decode to exactly 32 bytes".into())
    })
}
