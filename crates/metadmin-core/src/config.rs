// ── Runtime backend configuration ──
//
// Describes where the backend lives and how requests behave. The CLI
// builds a `BackendConfig` from its profile and hands it in; core never
// reads config files.

use std::time::Duration;

use metadmin_api::{ApiClient, TransportConfig};

use crate::error::CoreError;

/// Configuration for talking to one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub host: String,
    pub port: u16,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Default for the transient failure notification of each request.
    pub notify_on_error: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 8080,
            timeout: Duration::from_secs(30),
            notify_on_error: true,
        }
    }
}

impl BackendConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig::default().with_timeout(self.timeout)
    }

    /// Build the HTTP client for this backend.
    pub fn client(&self) -> Result<ApiClient, CoreError> {
        Ok(ApiClient::new(&self.host, self.port, &self.transport())?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn client_targets_v1_base() {
        let config = BackendConfig {
            host: "api.internal".into(),
            port: 9000,
            ..BackendConfig::default()
        };
        assert_eq!(
            config.client().unwrap().base_url().as_str(),
            "http://api.internal:9000/v1/"
        );
    }
}
