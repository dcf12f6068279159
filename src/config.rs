use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub default_shop_id: String,
    pub twilio_api_url: String,
    pub nexmo_api_url: String,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "shop_sms.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            default_shop_id: env::var("DEFAULT_SHOP_ID").unwrap_or_else(|_| "default".to_string()),
            twilio_api_url: env::var("TWILIO_API_URL")
                .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
            nexmo_api_url: env::var("NEXMO_API_URL")
                .unwrap_or_else(|_| "https://rest.nexmo.com".to_string()),
            request_timeout_secs: parse_timeout_secs(env::var("SMS_REQUEST_TIMEOUT_SECS").ok()),
        }
    }
}

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A zero timeout would fail every provider call, so it counts as unset.
fn parse_timeout_secs(value: Option<String>) -> u64 {
    value
        .and_then(|v| v.trim().parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}
