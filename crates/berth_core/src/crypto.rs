//! Backup encryption using AES-256-GCM.

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{StoreError, StoreResult};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Size of the random salt stored with encrypted backups.
pub const SALT_SIZE: usize = 16;

/// Encryption key for AES-256-GCM.
///
/// Zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Derives a key from a passphrase using HKDF-SHA256.
    ///
    /// The salt must be random per backup and stored alongside the
    /// ciphertext so the key can be re-derived at restore time.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::EncryptionFailed`] if HKDF expansion
    /// fails.
    pub fn derive_from_passphrase(passphrase: &str, salt: &[u8]) -> StoreResult<Self> {
        use hkdf::Hkdf;
        use sha2::Sha256;

        let hk = Hkdf::<Sha256>::new(Some(salt), passphrase.as_bytes());
        let mut bytes = [0u8; KEY_SIZE];
        hk.expand(b"berth-backup-key-v1", &mut bytes)
            .map_err(|_| StoreError::encryption_failed("HKDF expand failed"))?;
        Ok(Self { bytes })
    }

    /// Returns the key as a byte slice.
    ///
    /// Never log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generates a fresh random salt for an encrypted backup.
#[must_use]
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Encrypts and decrypts backup payloads with AES-256-GCM.
pub struct CryptoManager {
    cipher: Aes256Gcm,
}

impl CryptoManager {
    /// Creates a crypto manager with the given key.
    #[must_use]
    pub fn new(key: &EncryptionKey) -> Self {
        // Infallible: the key is always exactly AES-256's key size.
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Encrypts a payload.
    ///
    /// Output layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
    /// The nonce is random per call.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::EncryptionFailed`] on a cipher failure.
    pub fn encrypt(&self, plaintext: &[u8]) -> StoreResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| StoreError::encryption_failed("AES-GCM encryption error"))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypts a payload produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::Decryption`] when the payload is too
    /// short, the key is wrong, or the data was tampered with.
    pub fn decrypt(&self, payload: &[u8]) -> StoreResult<Vec<u8>> {
        if payload.len() < NONCE_SIZE + TAG_SIZE {
            return Err(StoreError::decryption("payload too short"));
        }

        let nonce = Nonce::from_slice(&payload[..NONCE_SIZE]);
        self.cipher
            .decrypt(nonce, &payload[NONCE_SIZE..])
            .map_err(|_| StoreError::decryption("wrong key or corrupted payload"))
    }
}
