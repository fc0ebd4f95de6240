/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt::Write;
use std::sync::Arc;
use std::time::Instant;

use tokio::time::timeout;

use agent_utils::{ip_lookup_one, KeyVault};
use camera_protocol::{CameraProbe, CameraProber};
use device_base::{Device, DeviceClass, DeviceStore};
use ping_protocol::{connect_one, PingConfig, Pinger};
use protocol::ProbeReport;
use snmp_protocol::{
    SnmpAuth, SnmpClient, SnmpConfig, TFortisSwitch, TimingConfig,
};

use crate::config::MonitorConfig;
use crate::reconcile::reconcile_ports;
use crate::sink::EventSink;

/// Routes a device to the probe path for its class and normalizes
/// whatever happens into a `ProbeReport`. Probe tasks never mutate
/// the catalog; the one side effect is the background port reconcile
/// scheduled for switches that answered SNMP.
pub struct ProbeRouter {
    store: Arc<dyn DeviceStore>,
    vault: KeyVault,
    sink: Arc<EventSink>,
    config: MonitorConfig,
}

impl ProbeRouter {
    pub fn new(
        store: Arc<dyn DeviceStore>,
        vault: KeyVault,
        sink: Arc<EventSink>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            store,
            vault,
            sink,
            config,
        }
    }

    pub async fn probe(&self, device: &Device) -> ProbeReport {
        match device.class {
            DeviceClass::Switch => self.probe_switch(device).await,
            DeviceClass::Server => self.probe_server(device).await,
            DeviceClass::Camera => self.probe_camera(device).await,
            DeviceClass::Other => self.probe_ping(device).await,
        }
    }

    /// ICMP with TCP fallback; the common degradation path of every
    /// class.
    async fn probe_ping(&self, device: &Device) -> ProbeReport {
        let pinger = Pinger::new(PingConfig {
            count: 3,
            timeout: self.config.ping_timeout,
        });
        match pinger.check(&device.ip).await {
            Ok(result) if result.success => {
                ProbeReport::online(result.avg_ms)
            }
            Ok(result) => ProbeReport::offline(Some(format!(
                "no reply to {} echo requests or tcp fallback",
                result.sent
            ))),
            Err(e) => ProbeReport::offline(Some(e.to_string())),
        }
    }

    async fn probe_switch(&self, device: &Device) -> ProbeReport {
        let config = match self.store.switch_config(device.id).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                log::debug!(
                    "switch {}: no SNMP config; degrading to ping",
                    device.name
                );
                return self.probe_ping(device).await;
            }
            Err(e) => {
                log::warn!(
                    "switch {}: failed to load config: {}",
                    device.name,
                    e
                );
                return self.probe_ping(device).await;
            }
        };

        let auth = match SnmpAuth::from_switch(&config) {
            Ok(auth) => auth,
            Err(e) => {
                log::warn!(
                    "switch {}: incomplete SNMP credentials ({}); \
                     degrading to ping",
                    device.name,
                    e
                );
                return self.probe_ping(device).await;
            }
        };

        let client = SnmpClient::new(
            SnmpConfig::new(device.ip.clone(), auth).with_timing(
                TimingConfig {
                    retries: 2,
                    timeout: self.config.snmp_timeout,
                },
            ),
        );
        let switch = TFortisSwitch::new(client);

        let start = Instant::now();
        match switch.test_connection().await {
            Ok(()) => {
                let latency = start.elapsed().as_secs_f64() * 1000.0;
                // Port state is reconciled in the background; its
                // events may trail the device's own status event.
                tokio::spawn(reconcile_ports(
                    switch,
                    device.id,
                    config.port_count,
                    self.store.clone(),
                    self.sink.clone(),
                ));
                ProbeReport::online(latency)
            }
            Err(e) => {
                log::debug!(
                    "switch {}: SNMP failed ({}); degrading to ping",
                    device.name,
                    e
                );
                let report = self.probe_ping(device).await;
                match report.status {
                    device_base::DeviceStatus::Online => report
                        .with_diagnostic(format!("snmp unavailable: {}", e)),
                    _ => report,
                }
            }
        }
    }

    async fn probe_server(&self, device: &Device) -> ProbeReport {
        let report = self.probe_ping(device).await;
        if report.status != device_base::DeviceStatus::Online {
            return report;
        }

        let ports = match self.store.server_config(device.id).await {
            Ok(Some(config)) => config.tcp_ports,
            _ => Vec::new(),
        };
        if ports.is_empty() {
            return report;
        }

        // Listed services are diagnostics only: a closed port does
        // not demote reachability.
        let Ok(addr) = ip_lookup_one(&device.ip).await else {
            return report;
        };
        let mut closed = Vec::new();
        for port in ports {
            if connect_one(
                addr,
                port,
                self.config.ping_timeout_duration(),
            )
            .await
            .is_none()
            {
                closed.push(port);
            }
        }
        match closed.is_empty() {
            true => report,
            false => {
                let mut diagnostic =
                    String::from("tcp ports not answering:");
                for port in &closed {
                    let _ = write!(diagnostic, " {}", port);
                }
                log::debug!("server {}: {}", device.name, diagnostic);
                report.with_diagnostic(diagnostic)
            }
        }
    }

    async fn probe_camera(&self, device: &Device) -> ProbeReport {
        let probe = match self.store.camera_config(device.id).await {
            Ok(Some(config)) => {
                let rtsp_url = match config.rtsp_url.as_deref() {
                    Some(encrypted) => {
                        match self.vault.decrypt_field(encrypted) {
                            Ok(url) if url.is_empty() => None,
                            Ok(url) => Some(url),
                            Err(e) => {
                                log::warn!(
                                    "camera {}: failed to decrypt \
                                     rtsp url: {}",
                                    device.name,
                                    e
                                );
                                None
                            }
                        }
                    }
                    None => None,
                };
                CameraProbe {
                    ip: device.ip.clone(),
                    rtsp_url,
                    onvif_port: config.onvif_port,
                    snapshot_url: config.snapshot_url,
                }
            }
            _ => CameraProbe {
                ip: device.ip.clone(),
                rtsp_url: None,
                onvif_port: None,
                snapshot_url: None,
            },
        };

        let prober =
            match CameraProber::new(self.config.ping_timeout_duration()) {
                Ok(prober) => prober,
                Err(e) => {
                    log::warn!(
                        "camera {}: failed to build prober: {}",
                        device.name,
                        e
                    );
                    return self.probe_ping(device).await;
                }
            };

        let checked = timeout(
            crate::pool::TASK_TIMEOUT,
            prober.check(&probe),
        )
        .await;
        match checked {
            Ok(Ok(report)) if report.available => {
                ProbeReport::online(report.latency_ms)
            }
            Ok(Ok(_)) | Ok(Err(_)) | Err(_) => {
                // Camera services are down or misconfigured; the host
                // itself may still be up.
                let report = self.probe_ping(device).await;
                match report.status {
                    device_base::DeviceStatus::Online => report
                        .with_diagnostic(String::from(
                            "camera services unreachable; host answers ping",
                        )),
                    _ => report,
                }
            }
        }
    }
}
