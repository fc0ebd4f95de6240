/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::sync::Arc;

use log::debug;

use device_base::{CredentialId, CredentialStore};

use crate::crypto::Crypto;
use crate::error::Result;

/// Plaintext credentials, decrypted on the way out of the store.
#[derive(Clone, Debug)]
pub struct Creds {
    pub username: String,
    pub password: String,
}

/// The credential vault: the stored rows keep username and password
/// encrypted under the master key; this is the only place they are
/// decrypted.
#[derive(Clone)]
pub struct KeyVault {
    store: Arc<dyn CredentialStore>,
    crypto: Arc<Crypto>,
}

impl KeyVault {
    pub fn new(store: Arc<dyn CredentialStore>, crypto: Arc<Crypto>) -> Self {
        Self { store, crypto }
    }

    pub async fn retrieve_creds(&self, id: CredentialId) -> Result<Creds> {
        debug!("Password Vault: retrieving credentials for {}", id);
        let entry = self.store.get_by_id(id).await?;
        Ok(Creds {
            username: self.crypto.decrypt(&entry.username)?,
            password: self.crypto.decrypt(&entry.password)?,
        })
    }

    /// Decrypt an encrypted catalog field (e.g. a camera's stored RTSP
    /// url) with the same master key.
    pub fn decrypt_field(&self, value: &str) -> Result<String> {
        self.crypto.decrypt(value)
    }
}
