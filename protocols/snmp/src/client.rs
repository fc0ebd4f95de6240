/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::net::SocketAddr;

use snmp2::{v3, AsyncSession, Oid};
use tokio::time::timeout;

use agent_utils::ip_lookup_one;
use device_base::{AuthProtocol, PrivProtocol};

use crate::config::{SnmpAuth, SnmpConfig};
use crate::error::{Error, Result};
use crate::oid::oid_starts_with;
use crate::value::SnmpValue;

/// Hard cap on getnext rounds per walk, against agents that never
/// terminate a subtree.
const MAX_WALK_STEPS: usize = 10_000;

/// SNMP client speaking v1/v2c (community) or v3 (USM). A fresh UDP
/// association is opened per call and released on all exit paths; no
/// session state is kept between calls.
pub struct SnmpClient {
    config: SnmpConfig,
}

enum Access {
    Read,
    Write,
}

impl SnmpClient {
    pub fn new(config: SnmpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SnmpConfig {
        &self.config
    }

    /// GET a single object.
    pub async fn get(&self, oid: &Oid<'static>) -> Result<SnmpValue> {
        let mut last = Error::Timeout;
        for attempt in 0..=self.config.timing.retries {
            if attempt > 0 {
                log::debug!("SNMP: get {}: retry {}", oid, attempt);
            }
            match self.try_get(oid).await {
                Ok(value) => return Ok(value),
                Err(e) if e.retryable() => last = e,
                Err(e) => return Err(e),
            }
        }
        Err(last)
    }

    /// GET several objects over one association. Null-ish replies
    /// (noSuchObject and friends) come back as `None` instead of
    /// failing the whole call.
    pub async fn get_multi(
        &self,
        oids: &[Oid<'static>],
    ) -> Result<Vec<Option<SnmpValue>>> {
        let mut last = Error::Timeout;
        for attempt in 0..=self.config.timing.retries {
            if attempt > 0 {
                log::debug!(
                    "SNMP: {}: get_multi retry {}",
                    self.config.host,
                    attempt
                );
            }
            match self.try_get_multi(oids).await {
                Ok(values) => return Ok(values),
                Err(e) if e.retryable() => last = e,
                Err(e) => return Err(e),
            }
        }
        Err(last)
    }

    /// Walk the subtree under `root`, feeding each decoded varbind to
    /// `visit`. The walk stops when `visit` returns `false`, when the
    /// agent leaves the subtree, or at end-of-mib.
    pub async fn walk(
        &self,
        root: &Oid<'static>,
        mut visit: impl FnMut(&Oid<'_>, SnmpValue) -> bool + Send,
    ) -> Result<()> {
        let mut session = self.open(Access::Read).await?;
        let mut current = root.to_owned();

        for _ in 0..MAX_WALK_STEPS {
            let mut pdu = timeout(
                self.config.timing.timeout_duration(),
                session.getnext(&current),
            )
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Error::Query)?;

            let Some((oid, value)) = pdu.varbinds.next() else {
                break;
            };
            if !oid_starts_with(&oid, root) {
                break;
            }
            let Some(decoded) = SnmpValue::decode(&value) else {
                break;
            };
            if !visit(&oid, decoded) {
                break;
            }
            current = oid.to_owned();
        }

        Ok(())
    }

    /// SET a single object. Requires a write community (v1/v2c) or
    /// authPriv credentials (v3); fails before any packet is sent
    /// otherwise.
    pub async fn set(
        &self,
        oid: &Oid<'static>,
        value: SnmpValue,
    ) -> Result<()> {
        match &self.config.auth {
            SnmpAuth::Community { write: None, .. } => {
                return Err(Error::MissingWriteCommunity)
            }
            auth if !auth.writable() => {
                return Err(Error::WriteRequiresAuthPriv)
            }
            _ => {}
        }

        let mut last = Error::Timeout;
        for attempt in 0..=self.config.timing.retries {
            if attempt > 0 {
                log::debug!("SNMP: set {}: retry {}", oid, attempt);
            }
            match self.try_set(oid, &value).await {
                Ok(()) => return Ok(()),
                Err(e) if e.retryable() => last = e,
                Err(e) => return Err(e),
            }
        }
        Err(last)
    }

    async fn try_get(&self, oid: &Oid<'static>) -> Result<SnmpValue> {
        let mut session = self.open(Access::Read).await?;
        let mut pdu = timeout(
            self.config.timing.timeout_duration(),
            session.get(oid),
        )
        .await
        .map_err(|_| Error::Timeout)?
        .map_err(Error::Query)?;

        let (_oid, value) = pdu
            .varbinds
            .next()
            .ok_or_else(|| Error::EmptyResponse(oid.to_string()))?;
        SnmpValue::decode(&value)
            .ok_or_else(|| Error::NoSuchObject(oid.to_string()))
    }

    async fn try_get_multi(
        &self,
        oids: &[Oid<'static>],
    ) -> Result<Vec<Option<SnmpValue>>> {
        let mut session = self.open(Access::Read).await?;
        let mut values = Vec::with_capacity(oids.len());
        for oid in oids {
            let mut pdu = timeout(
                self.config.timing.timeout_duration(),
                session.get(oid),
            )
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Error::Query)?;
            values.push(
                pdu.varbinds
                    .next()
                    .and_then(|(_oid, value)| SnmpValue::decode(&value)),
            );
        }
        Ok(values)
    }

    async fn try_set(
        &self,
        oid: &Oid<'static>,
        value: &SnmpValue,
    ) -> Result<()> {
        let mut session = self.open(Access::Write).await?;
        timeout(
            self.config.timing.timeout_duration(),
            session.set(&[(oid, value.encode())]),
        )
        .await
        .map_err(|_| Error::Timeout)?
        .map_err(Error::Query)?;
        Ok(())
    }

    /// Open a fresh association for one call. Dropping the session
    /// releases the socket on every exit path.
    async fn open(&self, access: Access) -> Result<AsyncSession> {
        let ip = ip_lookup_one(&self.config.host).await?;
        let addr = SocketAddr::new(ip, self.config.port).to_string();

        let session = match &self.config.auth {
            SnmpAuth::Community {
                version,
                read,
                write,
            } => {
                let community = match access {
                    Access::Read => read,
                    // `set` has verified presence before opening.
                    Access::Write => write.as_ref().unwrap_or(read),
                };
                match version {
                    device_base::SnmpVersion::V1 => timeout(
                        self.config.timing.timeout_duration(),
                        AsyncSession::new_v1(
                            addr.as_str(),
                            community.as_bytes(),
                            0,
                        ),
                    )
                    .await
                    .map_err(|_| Error::Timeout)?
                    .map_err(Error::Connection)?,
                    _ => timeout(
                        self.config.timing.timeout_duration(),
                        AsyncSession::new_v2c(
                            addr.as_str(),
                            community.as_bytes(),
                            0,
                        ),
                    )
                    .await
                    .map_err(|_| Error::Timeout)?
                    .map_err(Error::Connection)?,
                }
            }
            SnmpAuth::Usm {
                user,
                auth,
                privacy,
                ..
            } => {
                let security = build_security(user, auth, privacy);
                let mut session = timeout(
                    self.config.timing.timeout_duration(),
                    AsyncSession::new_v3(addr.as_str(), 0, security),
                )
                .await
                .map_err(|_| Error::Timeout)?
                .map_err(Error::Connection)?;
                // Engine id / time discovery round-trip.
                timeout(
                    self.config.timing.timeout_duration(),
                    session.init(),
                )
                .await
                .map_err(|_| Error::Timeout)?
                .map_err(Error::Query)?;
                session
            }
        };

        Ok(session)
    }
}

fn build_security(
    user: &str,
    auth: &Option<(AuthProtocol, String)>,
    privacy: &Option<(PrivProtocol, String)>,
) -> v3::Security {
    let mut security = match auth {
        None => v3::Security::new(user.as_bytes(), b""),
        Some((proto, key)) => {
            v3::Security::new(user.as_bytes(), key.as_bytes())
                .with_auth_protocol(auth_protocol(*proto))
        }
    };
    if let Some((proto, key)) = privacy {
        security = security.with_auth(v3::Auth::AuthPriv {
            cipher: cipher(*proto),
            privacy_password: key.as_bytes().to_vec(),
        });
    }
    security
}

fn auth_protocol(proto: AuthProtocol) -> v3::AuthProtocol {
    match proto {
        AuthProtocol::Md5 => v3::AuthProtocol::Md5,
        AuthProtocol::Sha1 => v3::AuthProtocol::Sha1,
        AuthProtocol::Sha224 => v3::AuthProtocol::Sha224,
        AuthProtocol::Sha256 => v3::AuthProtocol::Sha256,
        AuthProtocol::Sha384 => v3::AuthProtocol::Sha384,
        AuthProtocol::Sha512 => v3::AuthProtocol::Sha512,
    }
}

fn cipher(proto: PrivProtocol) -> v3::Cipher {
    match proto {
        PrivProtocol::Des => v3::Cipher::Des,
        PrivProtocol::Aes128 => v3::Cipher::Aes128,
        PrivProtocol::Aes192 => v3::Cipher::Aes192,
        PrivProtocol::Aes256 => v3::Cipher::Aes256,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::parse_oid;
    use device_base::SnmpVersion;

    fn read_only_client() -> SnmpClient {
        SnmpClient::new(
            SnmpConfig::new(
                "127.0.0.1",
                SnmpAuth::Community {
                    version: SnmpVersion::V2c,
                    read: "public".into(),
                    write: None,
                },
            )
            .with_timing(TimingConfig {
                retries: 0,
                timeout: 0.2,
            }),
        )
    }

    #[tokio::test]
    async fn set_without_write_community_is_config_error() {
        let client = read_only_client();
        let oid = parse_oid("1.3.6.1.2.1.2.2.1.7.1").unwrap();
        // Fails before any packet is sent: no agent is listening here.
        assert!(matches!(
            client.set(&oid, SnmpValue::Int(2)).await,
            Err(Error::MissingWriteCommunity)
        ));
    }

    #[tokio::test]
    async fn get_fails_without_agent() {
        let client = read_only_client();
        let oid = parse_oid("1.3.6.1.2.1.1.3.0").unwrap();
        // Depending on the platform this is a timeout or an icmp
        // port-unreachable surfacing as a receive error.
        assert!(matches!(
            client.get(&oid).await,
            Err(Error::Timeout)
                | Err(Error::Connection(_))
                | Err(Error::Query(_))
        ));
    }
}
