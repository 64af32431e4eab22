//! TCP connect probes for flagged domains.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Probes a fixed port set with short connect timeouts. An unreachable
/// port counts as closed, never as an error.
pub struct PortProbe {
    ports: Vec<u16>,
}

impl PortProbe {
    pub fn new(ports: Vec<u16>) -> Self {
        Self { ports }
    }

    pub async fn open_ports(&self, host: &str) -> Vec<u16> {
        let mut open = Vec::new();
        for &port in &self.ports {
            if is_port_open(host, port).await {
                open.push(port);
            }
        }
        open
    }
}

pub async fn is_port_open(host: &str, port: u16) -> bool {
    matches!(
        timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detects_open_and_closed_ports() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();

        assert!(is_port_open("127.0.0.1", port).await);
        drop(listener);
        assert!(!is_port_open("127.0.0.1", port).await);
    }

    #[tokio::test]
    async fn probe_reports_only_open_ports() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let open_port = listener.local_addr().expect("addr").port();
        let closed_port = {
            let scratch = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            scratch.local_addr().expect("addr").port()
        };

        let probe = PortProbe::new(vec![open_port, closed_port]);
        assert_eq!(probe.open_ports("127.0.0.1").await, vec![open_port]);
    }
}
