//! VisionForge HTTP Client
//!
//! A simple, type-safe HTTP client for the VisionForge training API.
//!
//! # Example
//!
//! ```no_run
//! use visionforge_client::VisionForgeClient;
//! use visionforge_core::domain::training::TrainingConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = VisionForgeClient::new("http://localhost:8000");
//!
//!     let mut config = TrainingConfig::new("traffic_cones");
//!     config.epochs = 50;
//!
//!     let job = client.submit_training(&config).await?;
//!     println!("Submitted training job: {}", job.job_id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod models;
mod training;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// Path prefix of the versioned API
const API_PREFIX: &str = "/api/v1";

/// HTTP client for the VisionForge server API
#[derive(Debug, Clone)]
pub struct VisionForgeClient {
    /// Base URL of the server (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl VisionForgeClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:8000")
    ///
    /// # Example
    /// ```
    /// use visionforge_client::VisionForgeClient;
    ///
    /// let client = VisionForgeClient::new("http://localhost:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use visionforge_client::VisionForgeClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = VisionForgeClient::with_client("http://localhost:8000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an API path such as `/train`
    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Error responses carry `{"error": "..."}`; the message is extracted when
    /// present, otherwise the raw body is kept.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::debug!("Request failed with status {}: {}", status, body);
            return Err(ClientError::api_error(status.as_u16(), error_message(body)));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

fn error_message(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("error")?.as_str().map(str::to_string))
        .unwrap_or(body)
}
