/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::net::IpAddr;

use trust_dns_resolver::AsyncResolver;

use crate::error::{Error, Result};

pub async fn ip_lookup(hostname: &str) -> Result<Vec<IpAddr>> {
    Ok(AsyncResolver::tokio_from_system_conf()
        .map_err(Error::Resolve)?
        .lookup_ip(hostname)
        .await
        .map_err(Error::Resolve)?
        .iter()
        .collect())
}

pub async fn ip_lookup_one(hostname: &str) -> Result<IpAddr> {
    if let Ok(addr) = hostname.parse() {
        return Ok(addr);
    }
    AsyncResolver::tokio_from_system_conf()
        .map_err(Error::Resolve)?
        .lookup_ip(hostname)
        .await
        .map_err(Error::Resolve)?
        .iter()
        .next()
        .ok_or(Error::ResolveMissing)
}
