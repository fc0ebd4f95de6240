/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use agent_utils::ip_lookup_one;

use crate::error::{Error, Result};

const RTSP_DEFAULT_PORT: u16 = 554;

/// Send a single `OPTIONS` request and look for an `RTSP/1.0` token
/// in whatever comes back. Any RTSP-speaking endpoint counts,
/// including a 401: reachability, not authorization, is being probed.
pub async fn rtsp_options_check(
    rtsp_url: &str,
    deadline: Duration,
) -> Result<()> {
    let url = Url::parse(rtsp_url)?;
    let host = url.host_str().ok_or(Error::MissingHost)?.to_string();
    let port = url.port().unwrap_or(RTSP_DEFAULT_PORT);
    let addr = ip_lookup_one(&host).await?;

    let mut stream = timeout(
        deadline,
        TcpStream::connect((addr, port)),
    )
    .await
    .map_err(|_| Error::Timeout)??;

    let request =
        format!("OPTIONS {} RTSP/1.0\r\nCSeq: 1\r\n\r\n", rtsp_url);
    timeout(deadline, stream.write_all(request.as_bytes()))
        .await
        .map_err(|_| Error::Timeout)??;

    let mut reply = [0u8; 512];
    let n = timeout(deadline, stream.read(&mut reply))
        .await
        .map_err(|_| Error::Timeout)??;

    match String::from_utf8_lossy(&reply[..n]).contains("RTSP/1.0") {
        true => Ok(()),
        false => Err(Error::NotRtsp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn rtsp_server(reply: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 512];
            let _ = stream.read(&mut buf).await;
            stream.write_all(reply).await.unwrap();
        });
        format!("rtsp://{}/stream", addr)
    }

    #[tokio::test]
    async fn ok_reply_is_reachable() {
        let url =
            rtsp_server(b"RTSP/1.0 200 OK\r\nCSeq: 1\r\n\r\n").await;
        assert!(rtsp_options_check(&url, Duration::from_secs(1))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn unauthorized_still_counts() {
        let url = rtsp_server(
            b"RTSP/1.0 401 Unauthorized\r\nCSeq: 1\r\n\r\n",
        )
        .await;
        assert!(rtsp_options_check(&url, Duration::from_secs(1))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn non_rtsp_reply_is_protocol_error() {
        let url = rtsp_server(b"HTTP/1.1 200 OK\r\n\r\n").await;
        assert!(matches!(
            rtsp_options_check(&url, Duration::from_secs(1)).await,
            Err(Error::NotRtsp)
        ));
    }
}
