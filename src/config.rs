use std::time::Duration;

/// Default per-call timeout (30 seconds).
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Session client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Command line used to spawn the server process (program + args).
    pub server_command: Vec<String>,
    /// Maximum wall-clock time for one call, handshake included.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(server_command: Vec<String>) -> Self {
        Self {
            server_command,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Load configuration from environment.
    ///
    /// - `MCP_SERVER_COMMAND` (required) — server command line, whitespace-split
    /// - `MCP_REQUEST_TIMEOUT_SECS` (optional, default 30) — max seconds per call
    pub fn from_env() -> Result<Self, String> {
        let raw = std::env::var("MCP_SERVER_COMMAND")
            .map_err(|_| "MCP_SERVER_COMMAND environment variable is not set".to_string())?;
        let server_command: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
        if server_command.is_empty() {
            return Err("MCP_SERVER_COMMAND must not be empty".to_string());
        }

        let timeout_secs = match std::env::var("MCP_REQUEST_TIMEOUT_SECS") {
            Ok(val) => val
                .parse::<u64>()
                .map_err(|_| "MCP_REQUEST_TIMEOUT_SECS must be a positive integer".to_string())?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            server_command,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_thirty_seconds() {
        let config = ClientConfig::new(vec!["server".into()]);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn timeout_is_injectable() {
        let config = ClientConfig::new(vec!["server".into()])
            .with_timeout(Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(1));
    }
}
