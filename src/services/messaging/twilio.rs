use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use secrecy::ExposeSecret;

use super::{Credentials, DeliveryReport, LazyHttpClient, MessagingProvider};

pub struct TwilioSmsProvider {
    base_url: String,
    client: LazyHttpClient,
}

impl TwilioSmsProvider {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: LazyHttpClient::new("twilio", timeout),
        }
    }
}

#[async_trait]
impl MessagingProvider for TwilioSmsProvider {
    async fn send_message(
        &self,
        credentials: &Credentials,
        to: &str,
        from: &str,
        body: &str,
    ) -> anyhow::Result<DeliveryReport> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, credentials.api_key
        );

        let resp = self
            .client
            .get()?
            .post(&url)
            .basic_auth(
                &credentials.api_key,
                Some(credentials.api_secret.expose_secret()),
            )
            .form(&[("To", to), ("From", from), ("Body", body)])
            .send()
            .await
            .context("failed to send Twilio SMS")?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .context("failed to read Twilio response")?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|data| data["message"].as_str().map(|s| s.to_string()))
                .unwrap_or(text);
            anyhow::bail!("Twilio API error ({}): {}", status, message);
        }

        let data: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse Twilio response ({status})"))?;

        Ok(DeliveryReport {
            message_id: data["sid"].as_str().map(|s| s.to_string()),
            error_text: None,
            raw: data,
        })
    }
}
