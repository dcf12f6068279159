pub mod nexmo;
pub mod twilio;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use secrecy::SecretString;

use crate::config::AppConfig;
use crate::models::SmsProvider;

use self::nexmo::NexmoSmsProvider;
use self::twilio::TwilioSmsProvider;

/// A shop's stored provider credentials. For Nexmo the secret is the API
/// secret; for Twilio it is the auth token.
pub struct Credentials {
    pub api_key: String,
    pub api_secret: SecretString,
}

/// What a provider reported back for one submitted message.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub message_id: Option<String>,
    /// Per-message error text reported inside an otherwise successful response.
    pub error_text: Option<String>,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_message(
        &self,
        credentials: &Credentials,
        to: &str,
        from: &str,
        body: &str,
    ) -> anyhow::Result<DeliveryReport>;
}

/// HTTP client built on first use and reused for the life of the process.
pub(crate) struct LazyHttpClient {
    name: &'static str,
    timeout: Duration,
    cell: OnceCell<reqwest::Client>,
}

impl LazyHttpClient {
    pub(crate) fn new(name: &'static str, timeout: Duration) -> Self {
        Self {
            name,
            timeout,
            cell: OnceCell::new(),
        }
    }

    pub(crate) fn get(&self) -> anyhow::Result<&reqwest::Client> {
        self.cell.get_or_try_init(|| {
            tracing::debug!(provider = self.name, "initializing SMS provider client");
            reqwest::Client::builder()
                .timeout(self.timeout)
                .build()
                .with_context(|| format!("failed to build {} HTTP client", self.name))
        })
    }
}

/// The configured provider clients, constructed once and shared through
/// `AppState`.
#[derive(Clone)]
pub struct Providers {
    twilio: Arc<dyn MessagingProvider>,
    nexmo: Arc<dyn MessagingProvider>,
}

impl Providers {
    pub fn new(twilio: Arc<dyn MessagingProvider>, nexmo: Arc<dyn MessagingProvider>) -> Self {
        Self { twilio, nexmo }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        Self::new(
            Arc::new(TwilioSmsProvider::new(config.twilio_api_url.clone(), timeout)),
            Arc::new(NexmoSmsProvider::new(config.nexmo_api_url.clone(), timeout)),
        )
    }

    /// `None` for a provider tag that has no client.
    pub fn get(&self, provider: &SmsProvider) -> Option<&dyn MessagingProvider> {
        match provider {
            SmsProvider::Twilio => Some(self.twilio.as_ref()),
            SmsProvider::Nexmo => Some(self.nexmo.as_ref()),
            SmsProvider::Unknown(_) => None,
        }
    }
}
