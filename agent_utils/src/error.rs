/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /* Name resolution */
    #[error("failed to resolve hostname: {0}")]
    Resolve(trust_dns_resolver::error::ResolveError),
    #[error("hostname resolution did not yield an ip address")]
    ResolveMissing,

    /* Master key */
    #[error("failed to read master key {0}: {1}")]
    ReadKey(PathBuf, #[source] std::io::Error),
    #[error("failed to write master key {0}: {1}")]
    WriteKey(PathBuf, #[source] std::io::Error),
    #[error("master key {0} is not a hex-encoded 32-byte key")]
    InvalidKey(PathBuf),

    /* Encryption */
    #[error("encryption failed")]
    Encrypt,
    #[error("ciphertext is not valid base64: {0}")]
    CiphertextEncoding(#[from] base64::DecodeError),
    #[error("ciphertext shorter than nonce")]
    CiphertextTooShort,
    #[error("decryption failed (wrong key or corrupt data)")]
    Decrypt,

    /* Password vault */
    #[error("password vault entry not found: {0}")]
    MissingPWEntry(device_base::CredentialId),
    #[error("password vault error: {0}")]
    Vault(#[from] device_base::Error),
}
