/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use agent_utils::ip_lookup_one;
use ping_protocol::connect_one;

use crate::error::Result;
use crate::rtsp::rtsp_options_check;

const HTTP_PORT: u16 = 80;
const RTSP_PORT: u16 = 554;

/// What is known about the camera before probing; all fields beyond
/// the address are optional.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CameraProbe {
    pub ip: String,
    #[serde(default)]
    pub rtsp_url: Option<String>,
    #[serde(default)]
    pub onvif_port: Option<u16>,
    #[serde(default)]
    pub snapshot_url: Option<String>,
}

/// Outcome of the composed camera probe: availability is the OR of
/// the sub-probes, latency the average over the successful ones.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CameraReport {
    pub available: bool,
    pub latency_ms: f64,
    pub rtsp_ok: Option<bool>,
    pub onvif_ok: Option<bool>,
    pub snapshot_ok: Option<bool>,
}

pub struct CameraProber {
    timeout: Duration,
    http: reqwest::Client,
}

impl CameraProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            timeout,
            http: reqwest::Client::builder()
                .user_agent("NetWatch")
                .timeout(timeout)
                .build()
                .map_err(std::io::Error::other)?,
        })
    }

    pub async fn check(&self, probe: &CameraProbe) -> Result<CameraReport> {
        if probe.rtsp_url.is_none()
            && probe.onvif_port.is_none()
            && probe.snapshot_url.is_none()
        {
            return self.bare_check(&probe.ip).await;
        }

        let mut latencies = Vec::new();
        let mut track = |ok: bool, elapsed: Duration| {
            if ok {
                latencies.push(elapsed.as_secs_f64() * 1000.0);
            }
            ok
        };

        let rtsp_ok = match &probe.rtsp_url {
            Some(url) => {
                let start = Instant::now();
                let ok = match rtsp_options_check(url, self.timeout).await {
                    Ok(()) => true,
                    Err(e) => {
                        debug!("camera {}: rtsp probe: {}", probe.ip, e);
                        false
                    }
                };
                Some(track(ok, start.elapsed()))
            }
            None => None,
        };

        let onvif_ok = match probe.onvif_port {
            Some(port) => {
                let start = Instant::now();
                let ok = self.onvif_check(&probe.ip, port).await;
                Some(track(ok, start.elapsed()))
            }
            None => None,
        };

        let snapshot_ok = match &probe.snapshot_url {
            Some(url) => {
                let start = Instant::now();
                let ok = self.snapshot_check(url).await;
                Some(track(ok, start.elapsed()))
            }
            None => None,
        };

        let available = [rtsp_ok, onvif_ok, snapshot_ok]
            .iter()
            .any(|probe| *probe == Some(true));
        let latency_ms = match latencies.is_empty() {
            true => 0.0,
            false => {
                latencies.iter().sum::<f64>() / latencies.len() as f64
            }
        };

        Ok(CameraReport {
            available,
            latency_ms,
            rtsp_ok,
            onvif_ok,
            snapshot_ok,
        })
    }

    /// Nothing is configured: fall back to a plain connect on the
    /// HTTP and RTSP well-known ports.
    async fn bare_check(&self, ip: &str) -> Result<CameraReport> {
        let addr = ip_lookup_one(ip).await?;
        for port in [HTTP_PORT, RTSP_PORT] {
            if let Some(rtt) = connect_one(addr, port, self.timeout).await {
                return Ok(CameraReport {
                    available: true,
                    latency_ms: rtt.as_secs_f64() * 1000.0,
                    rtsp_ok: None,
                    onvif_ok: None,
                    snapshot_ok: None,
                });
            }
        }
        Ok(CameraReport {
            available: false,
            latency_ms: 0.0,
            rtsp_ok: None,
            onvif_ok: None,
            snapshot_ok: None,
        })
    }

    /// TCP connect plus an HTTP GET on the device-service path; any
    /// answer other than 404 means an ONVIF-ish service lives there.
    async fn onvif_check(&self, ip: &str, port: u16) -> bool {
        let Ok(addr) = ip_lookup_one(ip).await else {
            return false;
        };
        if connect_one(addr, port, self.timeout).await.is_none() {
            return false;
        }
        let url = format!("http://{}:{}/onvif/device_service", ip, port);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().as_u16() != 404,
            Err(e) => {
                debug!("camera {}: onvif probe: {}", ip, e);
                false
            }
        }
    }

    /// HEAD on the snapshot url. 200 with an image content type is a
    /// working snapshot; 401/403 means the endpoint exists behind
    /// auth, which still proves the camera is there.
    async fn snapshot_check(&self, url: &str) -> bool {
        match self.http.head(url).send().await {
            Ok(response) => match response.status().as_u16() {
                200 => response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(|value| value.starts_with("image/"))
                    .unwrap_or(false),
                401 | 403 => true,
                _ => false,
            },
            Err(e) => {
                debug!("camera snapshot {}: {}", url, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn bare_check_uses_well_known_ports() {
        // No configured URLs; an open port 80 is enough.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let prober = CameraProber::new(Duration::from_millis(500)).unwrap();
        // The fallback tries 80 then 554 on the probe ip; point the
        // probe at a host where both are closed to see the negative.
        let report = prober
            .check(&CameraProbe {
                ip: addr.ip().to_string(),
                rtsp_url: None,
                onvif_port: None,
                snapshot_url: None,
            })
            .await
            .unwrap();
        assert!(!report.available);
    }

    #[tokio::test]
    async fn rtsp_alone_makes_camera_available() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 512];
            let _ = stream.read(&mut buf).await;
            stream
                .write_all(b"RTSP/1.0 401 Unauthorized\r\n\r\n")
                .await
                .unwrap();
        });

        let prober = CameraProber::new(Duration::from_secs(1)).unwrap();
        let report = prober
            .check(&CameraProbe {
                ip: addr.ip().to_string(),
                rtsp_url: Some(format!("rtsp://{}/main", addr)),
                onvif_port: None,
                snapshot_url: None,
            })
            .await
            .unwrap();
        assert!(report.available);
        assert_eq!(report.rtsp_ok, Some(true));
        assert_eq!(report.onvif_ok, None);
        assert!(report.latency_ms > 0.0);
    }
}
