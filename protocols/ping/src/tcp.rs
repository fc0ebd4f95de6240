/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::time::timeout;

/// Candidate ports for the TCP fallback when ICMP is filtered, tried
/// in order, first success wins.
pub const FALLBACK_PORTS: &[u16] = &[80, 443, 22, 8080];

/// Connect to one port, returning the connect RTT on success.
pub async fn connect_one(
    addr: IpAddr,
    port: u16,
    deadline: Duration,
) -> Option<Duration> {
    let sockaddr = SocketAddr::new(addr, port);
    let start = Instant::now();
    match timeout(deadline, TcpStream::connect(sockaddr)).await {
        Ok(Ok(_stream)) => Some(start.elapsed()),
        Ok(Err(e)) => {
            log::debug!("tcp {}: connect failed: {}", sockaddr, e);
            None
        }
        Err(_) => {
            log::debug!("tcp {}: connect timed out", sockaddr);
            None
        }
    }
}

/// Try each candidate in order; stop at the first open port.
pub async fn connect_any(
    addr: IpAddr,
    ports: &[u16],
    deadline: Duration,
) -> Option<(u16, Duration)> {
    for &port in ports {
        if let Some(rtt) = connect_one(addr, port, deadline).await {
            return Some((port, rtt));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn open_port_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let rtt = connect_one(
            addr.ip(),
            addr.port(),
            Duration::from_secs(1),
        )
        .await;
        assert!(rtt.is_some());
    }

    #[tokio::test]
    async fn closed_port_fails() {
        // Bind then drop to get a port that is very likely closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let rtt = connect_one(
            addr.ip(),
            addr.port(),
            Duration::from_millis(500),
        )
        .await;
        assert!(rtt.is_none());
    }

    #[tokio::test]
    async fn first_open_candidate_wins() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let closed = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let a = l.local_addr().unwrap().port();
            drop(l);
            a
        };
        let found = connect_any(
            addr.ip(),
            &[closed, addr.port()],
            Duration::from_millis(500),
        )
        .await;
        assert_eq!(found.map(|(p, _)| p), Some(addr.port()));
    }
}
