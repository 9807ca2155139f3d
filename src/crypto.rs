use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{self, Argon2, Params};
use rand::RngCore;
use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
/// Prepended to the plaintext so a wrong passphrase is detected after decryption.
const MAGIC: &[u8] = b"CYKEL_JOURNAL_V1";

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key derivation failed")]
    KeyDerivation,
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed, wrong passphrase or corrupted journal")]
    Decryption,
    #[error("journal is too short to be valid")]
    InvalidFormat,
}

/// A journal passphrase, wiped from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Passphrase(String);

impl Passphrase {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Passphrase(***)")
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KdfParams {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_memory_kib() -> u32 {
    65536
}
fn default_iterations() -> u32 {
    3
}
fn default_parallelism() -> u32 {
    1
}

fn derive_key(
    passphrase: &Passphrase,
    salt: &[u8],
    kdf: KdfParams,
) -> Result<[u8; KEY_LEN], CryptoError> {
    let params = Params::new(kdf.memory_kib, kdf.iterations, kdf.parallelism, Some(KEY_LEN))
        .map_err(|_| CryptoError::KeyDerivation)?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|_| CryptoError::KeyDerivation)?;

    Ok(key)
}

/// Seal `plaintext` under `passphrase`.
/// Layout: salt (32) || nonce (12) || ciphertext
pub fn seal(
    passphrase: &Passphrase,
    plaintext: &[u8],
    kdf: KdfParams,
) -> Result<Vec<u8>, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let mut key = derive_key(passphrase, &salt, kdf)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::Encryption)?;
    key.zeroize();

    let mut payload = Vec::with_capacity(MAGIC.len() + plaintext.len());
    payload.extend_from_slice(MAGIC);
    payload.extend_from_slice(plaintext);

    let sealed = cipher.encrypt(Nonce::from_slice(&nonce_bytes), payload.as_slice());
    payload.zeroize();
    let ciphertext = sealed.map_err(|_| CryptoError::Encryption)?;

    let mut output = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&salt);
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Reverse of [`seal`]. A wrong passphrase surfaces as [`CryptoError::Decryption`].
pub fn open(
    passphrase: &Passphrase,
    sealed: &[u8],
    kdf: KdfParams,
) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < SALT_LEN + NONCE_LEN + MAGIC.len() {
        return Err(CryptoError::InvalidFormat);
    }

    let (salt, rest) = sealed.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    let mut key = derive_key(passphrase, salt, kdf)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::Decryption)?;
    key.zeroize();

    let mut decrypted = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::Decryption)?;

    if !decrypted.starts_with(MAGIC) {
        decrypted.zeroize();
        return Err(CryptoError::Decryption);
    }

    let plaintext = decrypted[MAGIC.len()..].to_vec();
    decrypted.zeroize();
    Ok(plaintext)
}

#[cfg(test)]
pub(crate) fn fast_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}
