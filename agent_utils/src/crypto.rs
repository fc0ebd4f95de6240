/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fs;
use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// The process-wide at-rest encryption key. Initialised once at
/// startup and never mutated; probe tasks share it read-only.
#[derive(Clone)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    /// Load the hex-encoded key from `path`, generating and persisting
    /// a fresh random key if the file does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(hex_key) => {
                let bytes = hex::decode(hex_key.trim())
                    .map_err(|_| Error::InvalidKey(path.to_path_buf()))?;
                let key = <[u8; KEY_LEN]>::try_from(bytes.as_slice())
                    .map_err(|_| Error::InvalidKey(path.to_path_buf()))?;
                Ok(Self(key))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut key = [0u8; KEY_LEN];
                OsRng.fill_bytes(&mut key);
                write_private(path, hex::encode(key).as_bytes())
                    .map_err(|e| Error::WriteKey(path.to_path_buf(), e))?;
                log::info!(
                    "generated new master key at {}",
                    path.display()
                );
                Ok(Self(key))
            }
            Err(e) => Err(Error::ReadKey(path.to_path_buf(), e)),
        }
    }

    pub fn from_bytes(key: [u8; KEY_LEN]) -> Self {
        Self(key)
    }
}

#[cfg(unix)]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(data)
}

#[cfg(not(unix))]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    fs::write(path, data)
}

/// AES-256-GCM at-rest encryption. Ciphertexts are
/// `base64(nonce || sealed)`; the empty string passes through in both
/// directions so optional fields round-trip without special cases.
pub struct Crypto {
    cipher: Aes256Gcm,
}

impl Crypto {
    pub fn new(key: &MasterKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0)),
        }
    }

    pub fn encrypt(&self, plain: &str) -> Result<String> {
        if plain.is_empty() {
            return Ok(String::new());
        }
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plain.as_bytes())
            .map_err(|_| Error::Encrypt)?;
        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(BASE64.encode(out))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        if ciphertext.is_empty() {
            return Ok(String::new());
        }
        let raw = BASE64.decode(ciphertext)?;
        if raw.len() < NONCE_LEN {
            return Err(Error::CiphertextTooShort);
        }
        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| Error::Decrypt)?;
        String::from_utf8(plain).map_err(|_| Error::Decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crypto() -> Crypto {
        Crypto::new(&MasterKey::from_bytes([42u8; 32]))
    }

    #[test]
    fn roundtrip() {
        let crypto = crypto();
        for plain in ["rtsp://cam/stream", "päßwörd", "a"] {
            let sealed = crypto.encrypt(plain).unwrap();
            assert_ne!(sealed, plain);
            assert_eq!(crypto.decrypt(&sealed).unwrap(), plain);
        }
    }

    #[test]
    fn empty_passes_through() {
        let crypto = crypto();
        assert_eq!(crypto.encrypt("").unwrap(), "");
        assert_eq!(crypto.decrypt("").unwrap(), "");
    }

    #[test]
    fn nonces_differ() {
        let crypto = crypto();
        let a = crypto.encrypt("same").unwrap();
        let b = crypto.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn short_ciphertext_rejected() {
        let crypto = crypto();
        // Valid base64, but shorter than a nonce once decoded.
        let short = BASE64.encode([1u8; 4]);
        assert!(matches!(
            crypto.decrypt(&short),
            Err(Error::CiphertextTooShort)
        ));
    }

    #[test]
    fn wrong_key_rejected() {
        let sealed = crypto().encrypt("secret").unwrap();
        let other = Crypto::new(&MasterKey::from_bytes([43u8; 32]));
        assert!(matches!(other.decrypt(&sealed), Err(Error::Decrypt)));
    }
}
