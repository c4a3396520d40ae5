// file: src/provision/wait.rs
// version: 1.0.0
// guid: 2c7e9a51-0d84-4f3b-93f5-6f8f4cfa0b19

//! Bounded wait for the API server to start listening

use super::context::WaitPolicy;
use crate::error::KmachineError;
use crate::machine::API_SERVER_PORT;
use crate::network::CommandExecutor;
use crate::Result;
use regex::Regex;
use tracing::{debug, info, warn};

/// Socket table listing; `ss` covers hosts without net-tools
pub const LISTENERS_COMMAND: &str = "netstat -an 2>/dev/null || ss -ltn";

/// Matches listening-socket table lines for one local port
#[derive(Debug, Clone)]
pub struct ListenerMatcher {
    port_re: Regex,
}

impl ListenerMatcher {
    pub fn new(port: u16) -> Result<Self> {
        let port_re = Regex::new(&format!(r":{}\b", port))
            .map_err(|e| KmachineError::config(format!("Invalid listener pattern: {}", e)))?;
        Ok(Self { port_re })
    }

    /// True when any line shows a socket in LISTEN state on the port
    pub fn is_listening(&self, table: &str) -> bool {
        table
            .lines()
            .any(|line| line.contains("LISTEN") && self.port_re.is_match(line))
    }
}

/// Poll `executor` until the API server port is listening
///
/// # Errors
///
/// Returns `KmachineError::Timeout` once `policy.attempts` polls have all
/// come back not ready. Poll command failures count as not ready.
pub async fn wait_for_api_server<E: CommandExecutor + ?Sized>(
    executor: &mut E,
    policy: WaitPolicy,
) -> Result<()> {
    let matcher = ListenerMatcher::new(API_SERVER_PORT)?;
    info!(
        "Waiting for the API server on port {} ({} attempts, {:?} apart)",
        API_SERVER_PORT, policy.attempts, policy.interval
    );

    for attempt in 1..=policy.attempts {
        match executor.execute_with_output(LISTENERS_COMMAND).await {
            Ok(table) if matcher.is_listening(&table) => {
                info!("API server is listening (attempt {})", attempt);
                return Ok(());
            }
            Ok(_) => debug!("API server not listening yet (attempt {})", attempt),
            Err(e) => warn!("Listener poll failed (attempt {}): {}", attempt, e),
        }

        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(KmachineError::timeout(format!(
        "API server did not listen on port {} after {} attempts",
        API_SERVER_PORT, policy.attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netstat_listen_line() {
        let m = ListenerMatcher::new(6443).unwrap();
        let table = "Active Internet connections (servers and established)\n\
                     tcp6       0      0 :::6443                 :::*                    LISTEN\n";
        assert!(m.is_listening(table));
    }

    #[test]
    fn test_ss_listen_line() {
        let m = ListenerMatcher::new(6443).unwrap();
        let table = "State  Recv-Q Send-Q Local Address:Port Peer Address:Port\n\
                     LISTEN 0      128    *:6443             *:*\n";
        assert!(m.is_listening(table));
    }

    #[test]
    fn test_other_port_or_state_not_ready() {
        let m = ListenerMatcher::new(6443).unwrap();
        assert!(!m.is_listening("tcp 0 0 0.0.0.0:64430 0.0.0.0:* LISTEN\n"));
        assert!(!m.is_listening("tcp 0 0 10.0.0.5:6443 10.0.0.9:51000 ESTABLISHED\n"));
        assert!(!m.is_listening(""));
    }

    #[test]
    fn test_waits_on_the_advertised_port() {
        let url = crate::machine::api_server_url("tcp://10.0.0.5:2376").unwrap();
        let port = url.rsplit(':').next().unwrap();
        let m = ListenerMatcher::new(API_SERVER_PORT).unwrap();
        assert!(m.is_listening(&format!("tcp 0 0 0.0.0.0:{port} 0.0.0.0:* LISTEN\n")));
    }
}
