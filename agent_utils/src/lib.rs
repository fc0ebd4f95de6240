/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod crypto;
mod error;
mod utils;
mod vault;

pub use crypto::{Crypto, MasterKey};
pub use error::{Error, Result};
pub use utils::{ip_lookup, ip_lookup_one};
pub use vault::{Creds, KeyVault};
