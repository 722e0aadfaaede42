//! AWS session management.
//!
//! The base configuration is loaded once through the standard credential
//! chain; assumed-role sessions are derived from it via STS and cached per
//! role ARN. Per-region client configurations are rebuilt from a session by
//! swapping the region.

use std::collections::HashMap;
use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use aws_types::region::Region;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::ScrapeConfig;
use crate::error::{ScrapeError, ScrapeResult};

const ROLE_SESSION_NAME: &str = "metrics";

/// Owns the base credentials session and the assumed-role session cache.
pub struct SessionProvider {
    base: SdkConfig,
    sts: aws_sdk_sts::Client,
    sessions: Mutex<HashMap<String, SdkConfig>>,
}

impl SessionProvider {
    /// Load the base configuration with the configured timeouts and build
    /// the STS client used for assuming roles.
    pub async fn new(config: &ScrapeConfig) -> Self {
        let timeouts = TimeoutConfig::builder()
            .connect_timeout(Duration::from_secs_f64(config.connect_timeout))
            .read_timeout(Duration::from_secs_f64(config.read_timeout))
            .build();

        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.default_region.clone()))
            .timeout_config(timeouts)
            .load()
            .await;

        let sts_config = Self::for_region(&base, &config.sts_region);
        let sts = aws_sdk_sts::Client::new(&sts_config);

        Self {
            base,
            sts,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Rebuild a configuration for another region, keeping credentials and
    /// timeouts.
    pub fn for_region(config: &SdkConfig, region: &str) -> SdkConfig {
        config
            .to_builder()
            .region(Region::new(region.to_string()))
            .build()
    }

    /// The session for a role: the base session when `role` is `None`,
    /// otherwise an assumed-role session cached by role ARN. The cache
    /// mutex is held across the whole check-and-create so concurrent first
    /// requests for the same role assume it only once.
    pub async fn session_for(&self, role: Option<&str>) -> ScrapeResult<SdkConfig> {
        let Some(role) = role else {
            return Ok(self.base.clone());
        };

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(role) {
            return Ok(session.clone());
        }

        debug!(role = %role, "assuming role");
        let session = self.assume_role(role).await?;
        sessions.insert(role.to_string(), session.clone());
        Ok(session)
    }

    async fn assume_role(&self, role: &str) -> ScrapeResult<SdkConfig> {
        let response = self
            .sts
            .assume_role()
            .role_arn(role)
            .role_session_name(ROLE_SESSION_NAME)
            .send()
            .await
            .map_err(|e| ScrapeError::auth("assume_role", e))?;

        let credentials = response.credentials().ok_or_else(|| ScrapeError::Auth {
            message: format!("assume_role for {role} returned no credentials"),
        })?;

        let provider = Credentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            Some(credentials.session_token().to_string()),
            None,
            "sts-assume-role",
        );

        Ok(self
            .base
            .to_builder()
            .credentials_provider(SharedCredentialsProvider::new(provider))
            .build())
    }
}
