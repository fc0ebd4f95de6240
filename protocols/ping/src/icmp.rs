/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::net::IpAddr;

use rand::random;
use serde::{Deserialize, Serialize};
use surge_ping::{Client, Config, PingIdentifier, PingSequence};

use agent_utils::ip_lookup_one;

use crate::config::PingConfig;
use crate::error::{Error, Result};
use crate::tcp;

/// Aggregated echo statistics for one probe. Any received packet
/// counts as success; partial loss is not offline.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PingResult {
    pub success: bool,
    pub sent: u16,
    pub received: u16,
    pub loss_pct: f64,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
}

impl PingResult {
    fn from_rtts(sent: u16, rtts: &[f64]) -> Self {
        let received = rtts.len() as u16;
        let loss_pct = match sent {
            0 => 0.0,
            n => f64::from(n - received) / f64::from(n) * 100.0,
        };
        let min = rtts.iter().copied().fold(f64::INFINITY, f64::min);
        let max = rtts.iter().copied().fold(0.0, f64::max);
        let avg = match received {
            0 => 0.0,
            n => rtts.iter().sum::<f64>() / f64::from(n),
        };
        PingResult {
            success: received > 0,
            sent,
            received,
            loss_pct,
            min_ms: if received > 0 { min } else { 0.0 },
            avg_ms: avg,
            max_ms: max,
        }
    }

    fn from_connect(rtt_ms: f64) -> Self {
        PingResult {
            success: true,
            sent: 1,
            received: 1,
            loss_pct: 0.0,
            min_ms: rtt_ms,
            avg_ms: rtt_ms,
            max_ms: rtt_ms,
        }
    }

    fn all_lost(sent: u16) -> Self {
        PingResult {
            success: false,
            sent,
            received: 0,
            loss_pct: 100.0,
            min_ms: 0.0,
            avg_ms: 0.0,
            max_ms: 0.0,
        }
    }
}

/// ICMP echo prober with a TCP-connect fallback for hosts that drop
/// echo requests. Needs a privileged (raw) socket for ICMP.
pub struct Pinger {
    config: PingConfig,
}

impl Pinger {
    pub fn new(config: PingConfig) -> Self {
        Self { config }
    }

    /// Probe `target` (IPv4 literal or DNS name). ICMP first; if no
    /// echo comes back, TCP connect on the fallback candidate set.
    /// Cancellation is cooperative: dropping the returned future
    /// aborts the in-flight socket operation.
    pub async fn check(&self, target: &str) -> Result<PingResult> {
        let addr = ip_lookup_one(target).await?;

        match self.icmp_probe(addr).await {
            Ok(result) if result.success => return Ok(result),
            Ok(result) => {
                log::debug!(
                    "ping {}: {}/{} echo replies; trying tcp fallback",
                    target,
                    result.received,
                    result.sent
                );
            }
            Err(e) => {
                log::debug!(
                    "ping {}: icmp unavailable ({}); trying tcp fallback",
                    target,
                    e
                );
            }
        }

        match tcp::connect_any(addr, tcp::FALLBACK_PORTS, self.config.timeout_duration())
            .await
        {
            Some((port, rtt)) => {
                log::debug!(
                    "ping {}: tcp connect to port {} in {:.1} ms",
                    target,
                    port,
                    rtt.as_secs_f64() * 1000.0
                );
                Ok(PingResult::from_connect(rtt.as_secs_f64() * 1000.0))
            }
            None => Ok(PingResult::all_lost(self.config.count)),
        }
    }

    async fn icmp_probe(&self, addr: IpAddr) -> Result<PingResult> {
        let client =
            Client::new(&Config::default()).map_err(Error::Socket)?;
        let mut pinger = client.pinger(addr, PingIdentifier(random())).await;
        pinger.timeout(self.config.timeout_duration());

        let payload = [0u8; 56];
        let mut rtts = Vec::with_capacity(usize::from(self.config.count));
        for seq in 0..self.config.count {
            match pinger.ping(PingSequence(seq), &payload).await {
                Ok((_packet, rtt)) => {
                    rtts.push(rtt.as_secs_f64() * 1000.0);
                }
                Err(e) => {
                    log::debug!("ping {}: seq {} lost: {}", addr, seq, e);
                }
            }
        }

        Ok(PingResult::from_rtts(self.config.count, &rtts))
    }
}
