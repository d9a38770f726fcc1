//! OpenNebula inventory HTTP client
//!
//! Async HTTP client with connection pooling and timeouts that fetches the
//! VM pool document from the configured endpoint.

use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};

use super::parser::{parse_pool, CollectResult};
use crate::error::CollectorError;
use crate::inventory::VmRecord;

/// OpenNebula inventory client
#[derive(Clone)]
pub struct OneClient {
    client: Client,
    endpoint: String,
    timeout_ms: u64,
    auth: Option<(String, String)>,
}

impl OneClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `endpoint` - URL serving the VM pool document
    /// * `timeout_ms` - request timeout in milliseconds
    /// * `insecure_ssl` - accept invalid TLS certificates
    ///
    /// # Example
    /// ```ignore
    /// let client = OneClient::new("https://one.example.com/vmpool", 5000, false)?
    ///     .with_auth("oneadmin", "secret");
    /// ```
    pub fn new(endpoint: &str, timeout_ms: u64, insecure_ssl: bool) -> CollectResult<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(insecure_ssl)
            .build()
            .map_err(CollectorError::HttpClientInit)?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            timeout_ms,
            auth: None,
        })
    }

    /// Set basic auth credentials
    pub fn with_auth(mut self, user: &str, password: &str) -> Self {
        self.auth = Some((user.to_string(), password.to_string()));
        self
    }

    /// Endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the current VM pool snapshot
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn fetch_pool(&self) -> CollectResult<Vec<VmRecord>> {
        debug!("Fetching VM pool");

        let mut req = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some((user, password)) = &self.auth {
            req = req.basic_auth(user, Some(password));
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                CollectorError::timeout_with_duration(self.timeout_ms)
            } else {
                CollectorError::from(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CollectorError::AuthenticationFailed);
        }
        if !status.is_success() {
            return Err(CollectorError::HttpStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(CollectorError::HttpResponse)?;

        let vms = parse_pool(&body)?;
        debug!(vms = vms.len(), "VM pool fetched");
        Ok(vms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = OneClient::new("http://localhost:2633/vmpool", 5000, false);
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_insecure() {
        let client = OneClient::new("https://localhost/vmpool", 5000, true);
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_with_auth() {
        let client = OneClient::new("http://localhost:2633/vmpool", 5000, false)
            .unwrap()
            .with_auth("oneadmin", "secret");
        assert!(client.auth.is_some());
        assert_eq!(client.endpoint(), "http://localhost:2633/vmpool");
    }
}
