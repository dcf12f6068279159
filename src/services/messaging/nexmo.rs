use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use secrecy::ExposeSecret;

use super::{Credentials, DeliveryReport, LazyHttpClient, MessagingProvider};

pub struct NexmoSmsProvider {
    base_url: String,
    client: LazyHttpClient,
}

impl NexmoSmsProvider {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: LazyHttpClient::new("nexmo", timeout),
        }
    }
}

#[async_trait]
impl MessagingProvider for NexmoSmsProvider {
    async fn send_message(
        &self,
        credentials: &Credentials,
        to: &str,
        from: &str,
        body: &str,
    ) -> anyhow::Result<DeliveryReport> {
        let url = format!("{}/sms/json", self.base_url);

        let resp = self
            .client
            .get()?
            .post(&url)
            .form(&[
                ("api_key", credentials.api_key.as_str()),
                ("api_secret", credentials.api_secret.expose_secret()),
                ("from", from),
                ("to", to),
                ("text", body),
            ])
            .send()
            .await
            .context("failed to send Nexmo SMS")?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .context("failed to read Nexmo response")?;

        if !status.is_success() {
            anyhow::bail!("Nexmo API error ({}): {}", status, text);
        }

        let data: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse Nexmo response ({status})"))?;

        // Nexmo answers 200 even when a message is refused; the verdict is
        // per message, and only the first one is ours.
        let first = &data["messages"][0];
        Ok(DeliveryReport {
            message_id: first["message-id"].as_str().map(|s| s.to_string()),
            error_text: first["error-text"]
                .as_str()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
            raw: data,
        })
    }
}
