//! Account identity labels.
//!
//! The account id and alias are context labels on every emitted message.
//! Both lookups are memoised with a double-checked RwLock and swallow API
//! failures to the empty string so a missing permission never fails a
//! scrape.

use aws_config::SdkConfig;
use tokio::sync::{RwLock, Semaphore};
use tracing::warn;

use crate::config::api_concurrency;

pub struct StsApi {
    client: aws_sdk_sts::Client,
    limit: Semaphore,
    account_id: RwLock<Option<String>>,
}

impl StsApi {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_sts::Client::new(conf),
            limit: Semaphore::new(api_concurrency("STS_API_CONCURRENCY", 5)),
            account_id: RwLock::new(None),
        }
    }

    /// The caller's account id, or empty when the lookup fails.
    pub async fn account_id(&self) -> String {
        let read_guard = self.account_id.read().await;
        if let Some(id) = read_guard.as_ref() {
            return id.clone();
        }
        drop(read_guard);

        let mut write_guard = self.account_id.write().await;
        // Check again in case another task resolved it while we waited.
        if let Some(id) = write_guard.as_ref() {
            return id.clone();
        }

        let id = {
            let _permit = self.limit.acquire().await.expect("semaphore closed");
            match self.client.get_caller_identity().send().await {
                Ok(response) => response.account().unwrap_or_default().to_string(),
                Err(e) => {
                    warn!(error = ?e, "get_caller_identity failed, omitting account_id label");
                    String::new()
                }
            }
        };
        *write_guard = Some(id.clone());
        id
    }
}

pub struct SupportAppApi {
    client: aws_sdk_supportapp::Client,
    account_alias: RwLock<Option<String>>,
}

impl SupportAppApi {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_supportapp::Client::new(conf),
            account_alias: RwLock::new(None),
        }
    }

    /// The account's Support App alias, or empty when unset or the lookup
    /// fails.
    pub async fn account_alias(&self) -> String {
        let read_guard = self.account_alias.read().await;
        if let Some(alias) = read_guard.as_ref() {
            return alias.clone();
        }
        drop(read_guard);

        let mut write_guard = self.account_alias.write().await;
        if let Some(alias) = write_guard.as_ref() {
            return alias.clone();
        }

        let alias = match self.client.get_account_alias().send().await {
            Ok(response) => response.account_alias().unwrap_or_default().to_string(),
            Err(e) => {
                warn!(error = ?e, "get_account_alias failed, omitting account_alias label");
                String::new()
            }
        };
        *write_guard = Some(alias.clone());
        alias
    }
}
