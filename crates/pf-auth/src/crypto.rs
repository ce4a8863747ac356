use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

use crate::errors::{AuthError, Result};

pub const SALT_LEN: usize = 16;
const AAD_VERSION: &str = "v1";

/// AES-256 key (32 bytes)
#[derive(Clone, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; 32],
}

impl EncryptionKey {
    /// Derive a key from a passphrase with Argon2id
    pub fn derive(passphrase: &[u8], salt: &[u8]) -> Result<Self> {
        let params = Params::new(19 * 1024, 2, 1, Some(32))
            .map_err(|e| AuthError::Crypto(format!("Invalid Argon2 params: {e}")))?;

        let mut key = [0u8; 32];
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password_into(passphrase, salt, &mut key)
            .map_err(|e| AuthError::Crypto(format!("Key derivation failed: {e}")))?;

        Ok(Self { key })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Random salt for a new store
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::fill(&mut salt)
        .map_err(|e| AuthError::Crypto(format!("No randomness available: {e}")))?;
    Ok(salt)
}

/// Encrypted data with nonce and authentication tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// Base64url-encoded nonce (12 bytes)
    pub nonce: String,
    /// Base64url-encoded ciphertext + tag
    pub ciphertext: String,
    pub aad_version: String,
}

fn aad(version: &str, context: &str) -> String {
    format!("perfil-store|{version}|{context}")
}

/// Encrypt with AES-256-GCM, binding the ciphertext to `context`
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8], context: &str) -> Result<EncryptedBlob> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let aad = aad(AAD_VERSION, context);

    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|e| AuthError::Crypto(format!("Encryption failed: {e}")))?;

    Ok(EncryptedBlob {
        nonce: URL_SAFE_NO_PAD.encode(nonce),
        ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
        aad_version: AAD_VERSION.to_string(),
    })
}

/// Decrypt; any mismatch (key, context, tampering) reports a corrupted store
pub fn decrypt(key: &EncryptionKey, blob: &EncryptedBlob, context: &str) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let nonce_bytes = URL_SAFE_NO_PAD
        .decode(&blob.nonce)
        .map_err(|_| AuthError::CorruptedStore)?;
    if nonce_bytes.len() != 12 {
        return Err(AuthError::CorruptedStore);
    }

    let ciphertext = URL_SAFE_NO_PAD
        .decode(&blob.ciphertext)
        .map_err(|_| AuthError::CorruptedStore)?;
    let aad = aad(&blob.aad_version, context);

    cipher
        .decrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: &ciphertext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|_| AuthError::CorruptedStore)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(passphrase: &str) -> EncryptionKey {
        EncryptionKey::derive(passphrase.as_bytes(), b"0123456789abcdef").unwrap()
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = key("correct horse");
        let blob = encrypt(&key, b"{\"access_token\":\"a\"}", "tokens").unwrap();
        let plaintext = decrypt(&key, &blob, "tokens").unwrap();
        assert_eq!(plaintext, b"{\"access_token\":\"a\"}");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(key("same").as_bytes(), key("same").as_bytes());
        assert_ne!(key("same").as_bytes(), key("other").as_bytes());
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let blob = encrypt(&key("right"), b"data", "tokens").unwrap();
        assert!(matches!(
            decrypt(&key("wrong"), &blob, "tokens"),
            Err(AuthError::CorruptedStore)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = key("k");
        let mut blob = encrypt(&key, b"data", "tokens").unwrap();

        let mut bytes = URL_SAFE_NO_PAD.decode(&blob.ciphertext).unwrap();
        bytes[0] ^= 0xFF;
        blob.ciphertext = URL_SAFE_NO_PAD.encode(bytes);

        assert!(matches!(
            decrypt(&key, &blob, "tokens"),
            Err(AuthError::CorruptedStore)
        ));
    }

    #[test]
    fn test_context_is_bound() {
        let key = key("k");
        let blob = encrypt(&key, b"data", "tokens").unwrap();
        assert!(decrypt(&key, &blob, "elsewhere").is_err());
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
    }
}
