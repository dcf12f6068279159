use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Provider selected by a shop's stored `sms_provider` tag.
///
/// The tag is stored verbatim at save time; anything other than an exact
/// `"twilio"` or `"nexmo"` becomes `Unknown` and is never dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmsProvider {
    Twilio,
    Nexmo,
    Unknown(Option<String>),
}

impl SmsProvider {
    pub fn parse(tag: Option<&str>) -> Self {
        match tag {
            Some("twilio") => SmsProvider::Twilio,
            Some("nexmo") => SmsProvider::Nexmo,
            other => SmsProvider::Unknown(other.map(str::to_string)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SmsProvider::Twilio => "twilio",
            SmsProvider::Nexmo => "nexmo",
            SmsProvider::Unknown(Some(tag)) => tag,
            SmsProvider::Unknown(None) => "",
        }
    }
}

impl fmt::Display for SmsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SmsSettings {
    pub id: String,
    pub shop_id: String,
    pub sms_provider: Option<String>,
    pub api_key: Option<String>,
    pub api_token: Option<String>,
    pub sms_phone: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SmsSettings {
    pub fn provider(&self) -> SmsProvider {
        SmsProvider::parse(self.sms_provider.as_deref())
    }
}

/// Partial settings as submitted by a shop admin. Absent fields leave the
/// stored value untouched on update. A `shopId` in the payload is ignored;
/// the shop always comes from the caller's context.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsSettingsUpdate {
    pub sms_provider: Option<String>,
    pub api_key: Option<String>,
    pub api_token: Option<String>,
    pub sms_phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveOutcome {
    Inserted,
    Updated,
}
