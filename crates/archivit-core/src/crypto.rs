//! Password handling, key derivation and AES-GCM chunk encryption.

use aes_gcm::Aes128Gcm;
use aes_gcm::Nonce as GcmNonce;
use aes_gcm::aead::Aead;
use aes_gcm::aead::KeyInit;
use aes_gcm::aead::Payload;
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::ArchiveError;
use crate::Result;

/// Length of the archive nonce, which also salts key derivation.
pub const NONCE_LEN: usize = 12;

/// Derived key length (AES-128).
pub const KEY_LEN: usize = 16;

/// Authentication tag appended to every ciphertext chunk.
pub const TAG_LEN: usize = 16;

/// PBKDF2 iteration count.
pub const PBKDF2_ROUNDS: u32 = 65_536;

/// Minimum password length in characters.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Maximum password length in characters.
pub const MAX_PASSWORD_CHARS: usize = 16;

/// An archive or chunk nonce.
pub type Nonce = [u8; NONCE_LEN];

/// Failures raised by [`CipherKit`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The authentication tag did not verify.
    #[error("tag verification failed")]
    TagMismatch,
    /// Encryption itself failed.
    #[error("encryption failed")]
    Encrypt,
    /// Key material has the wrong shape.
    #[error("invalid key length")]
    InvalidKey,
}

impl From<CipherError> for ArchiveError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::TagMismatch => Self::PasswordMismatch,
            other => Self::Crypto(other.to_string()),
        }
    }
}

/// A validated password held in memory that is wiped on drop.
///
/// # Examples
///
/// ```
/// use archivit_core::crypto::Password;
///
/// assert!(Password::new("secret1").is_ok());
/// assert!(Password::new("short").is_err());
/// assert!(Password::new("        ").is_err());
/// ```
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validates `value` and takes a private copy of it.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidPassword`] unless the password has
    /// 6 to 16 characters and is not only whitespace.
    pub fn new(value: &str) -> Result<Self> {
        let chars = value.chars().count();
        if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&chars) {
            return Err(ArchiveError::InvalidPassword {
                reason: format!(
                    "must be {MIN_PASSWORD_CHARS} to {MAX_PASSWORD_CHARS} characters, got {chars}"
                ),
            });
        }
        if value.trim().is_empty() {
            return Err(ArchiveError::InvalidPassword {
                reason: "must not be only whitespace".to_string(),
            });
        }
        Ok(Self(Zeroizing::new(value.to_string())))
    }

    /// Returns the password bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Password-based key derivation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDerivation {
    /// PBKDF2-HMAC-SHA1, used by older containers.
    Pbkdf2Sha1,
    /// PBKDF2-HMAC-SHA256, used for new containers.
    Pbkdf2Sha256,
}

impl KeyDerivation {
    /// Derives a 128-bit key from `password`, salted with the archive nonce.
    #[must_use]
    pub fn derive(self, password: &Password, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        match self {
            Self::Pbkdf2Sha1 => {
                pbkdf2_hmac::<sha1::Sha1>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut *key);
            }
            Self::Pbkdf2Sha256 => {
                pbkdf2_hmac::<sha2::Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut *key);
            }
        }
        key
    }
}

/// Generates a fresh random archive nonce.
#[must_use]
pub fn generate_nonce() -> Nonce {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill(&mut nonce);
    nonce
}

/// Derives the nonce for chunk `index` from the archive nonce.
///
/// The big-endian index is XORed into the last eight bytes, so distinct
/// indices always give distinct nonces.
///
/// # Examples
///
/// ```
/// use archivit_core::crypto::chunk_nonce;
///
/// let base = [0u8; 12];
/// assert_eq!(chunk_nonce(&base, 0), base);
/// assert_eq!(chunk_nonce(&base, 1)[11], 1);
/// ```
#[must_use]
pub fn chunk_nonce(base: &Nonce, index: u64) -> Nonce {
    let mut nonce = *base;
    for (byte, counter) in nonce[NONCE_LEN - 8..].iter_mut().zip(index.to_be_bytes()) {
        *byte ^= counter;
    }
    nonce
}

/// AES-128-GCM keyed from a password for the lifetime of one archive call.
///
/// The derived key only lives inside the cipher state, which is wiped when
/// the kit is dropped.
pub struct CipherKit {
    cipher: Aes128Gcm,
    nonce: Nonce,
}

impl CipherKit {
    /// Derives the key for `password` and the archive `nonce`.
    pub fn new(password: &Password, nonce: Nonce, kdf: KeyDerivation) -> Result<Self> {
        let key = kdf.derive(password, &nonce);
        let cipher =
            Aes128Gcm::new_from_slice(key.as_slice()).map_err(|_| CipherError::InvalidKey)?;
        Ok(Self { cipher, nonce })
    }

    /// The archive nonce this kit was derived with.
    #[must_use]
    pub const fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// Encrypts one chunk. `aad` is authenticated but not encrypted.
    pub fn encrypt(
        &self,
        nonce: &Nonce,
        plaintext: &[u8],
        aad: &[u8],
    ) -> std::result::Result<Vec<u8>, CipherError> {
        self.cipher
            .encrypt(
                GcmNonce::from_slice(nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| CipherError::Encrypt)
    }

    /// Decrypts one chunk.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::TagMismatch`] when the tag does not verify,
    /// which happens for a wrong password as well as for altered data.
    pub fn decrypt(
        &self,
        nonce: &Nonce,
        ciphertext: &[u8],
        aad: &[u8],
    ) -> std::result::Result<Vec<u8>, CipherError> {
        self.cipher
            .decrypt(
                GcmNonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| CipherError::TagMismatch)
    }
}

impl std::fmt::Debug for CipherKit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherKit")
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}
