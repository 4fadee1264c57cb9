use std::fs;
use std::path::PathBuf;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::journal::Journal;

/// File identity and layout version, stored in the clear ahead of the
/// ciphertext. Everything after the header is opaque without the passphrase.
const MAGIC: &[u8; 4] = b"CICV";
const VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Argon2id work factors: 19 MiB, two passes, one lane.
const ARGON2_MEMORY_KIB: u32 = 19_456;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_LANES: u32 = 1;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("key derivation failed")]
    KeyDerivation,
    #[error("encryption failed")]
    Encryption,
    #[error("wrong passphrase or corrupted vault")]
    WrongPassphrase,
    #[error("not a vault file")]
    Malformed,
    #[error("vault layout version {0} is not supported")]
    UnsupportedVersion(u8),
    #[error("no local data directory on this system")]
    NoDataDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Derived key that wipes itself when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
struct SealKey([u8; KEY_LEN]);

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<SealKey, VaultError> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_LANES,
        Some(KEY_LEN),
    )
    .map_err(|_| VaultError::KeyDerivation)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = SealKey([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key.0)
        .map_err(|_| VaultError::KeyDerivation)?;
    Ok(key)
}

/// Encrypt a journal under a passphrase.
/// Layout: magic (4) || version (1) || salt (16) || nonce (12) || ciphertext.
pub fn seal(passphrase: &str, journal: &Journal) -> Result<Vec<u8>, VaultError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(passphrase, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key.0).map_err(|_| VaultError::Encryption)?;

    let mut plaintext = serde_json::to_vec(journal)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
        .map_err(|_| VaultError::Encryption)?;
    plaintext.zeroize();

    let mut sealed = Vec::with_capacity(HEADER_LEN + SALT_LEN + NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(MAGIC);
    sealed.push(VERSION);
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt a sealed journal. The GCM tag authenticates the passphrase, so a
/// wrong one fails here rather than yielding garbage records.
pub fn open(passphrase: &str, sealed: &[u8]) -> Result<Journal, VaultError> {
    if sealed.len() < HEADER_LEN || &sealed[..MAGIC.len()] != MAGIC {
        return Err(VaultError::Malformed);
    }
    let version = sealed[MAGIC.len()];
    if version != VERSION {
        return Err(VaultError::UnsupportedVersion(version));
    }
    let body = &sealed[HEADER_LEN..];
    if body.len() < SALT_LEN + NONCE_LEN {
        return Err(VaultError::Malformed);
    }

    let salt = &body[..SALT_LEN];
    let nonce_bytes = &body[SALT_LEN..SALT_LEN + NONCE_LEN];
    let ciphertext = &body[SALT_LEN + NONCE_LEN..];

    let key = derive_key(passphrase, salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key.0).map_err(|_| VaultError::WrongPassphrase)?;
    let mut plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| VaultError::WrongPassphrase)?;

    let journal = serde_json::from_slice(&plaintext);
    plaintext.zeroize();
    Ok(journal?)
}

fn vault_path() -> Result<PathBuf, VaultError> {
    let dir = dirs::data_local_dir()
        .ok_or(VaultError::NoDataDir)?
        .join("ciclo");
    fs::create_dir_all(&dir)?;
    Ok(dir.join("journal.vault"))
}

/// Whether a vault has been created on this machine before.
pub fn exists() -> Result<bool, VaultError> {
    Ok(vault_path()?.exists())
}

pub fn save(passphrase: &str, journal: &Journal) -> Result<(), VaultError> {
    let sealed = seal(passphrase, journal)?;
    fs::write(vault_path()?, sealed)?;
    Ok(())
}

pub fn load(passphrase: &str) -> Result<Journal, VaultError> {
    let sealed = fs::read(vault_path()?)?;
    open(passphrase, &sealed)
}

/// Remove the vault file. Without an exported backup the records are gone.
pub fn wipe() -> Result<(), VaultError> {
    let path = vault_path()?;
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
