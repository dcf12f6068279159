//! Shop SMS settings and best-effort notification sends.
//!
//! `send` never returns an error: missing preconditions are skipped quietly,
//! provider failures are logged, and the resulting [`DispatchOutcome`] is
//! only there for callers (and tests) that want to look at it.

use std::sync::Arc;

use anyhow::anyhow;
use rusqlite::Connection;
use tokio::task::JoinHandle;

use crate::db::queries;
use crate::models::{SaveOutcome, SmsProvider, SmsSettings, SmsSettingsUpdate};
use crate::services::messaging::{Credentials, DeliveryReport};
use crate::services::phone::{format_phone_number, mask_phone_number};
use crate::state::AppState;

/// Why a send was dropped before reaching a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UserNotFound,
    MissingPhone,
    MissingCountry,
    SettingsNotFound,
    InvalidPhone,
    UnknownProvider(Option<String>),
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Skipped(SkipReason),
    Sent {
        provider: SmsProvider,
        report: DeliveryReport,
    },
    /// The provider accepted the request but refused the message.
    Rejected {
        provider: SmsProvider,
        error_text: String,
        report: DeliveryReport,
    },
    Failed {
        provider: SmsProvider,
        error: String,
    },
    LookupFailed(String),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent { .. })
    }
}

/// Stores the shop's provider settings, creating its record on first save and
/// merging into it afterwards.
pub fn save_settings(
    conn: &Connection,
    shop_id: &str,
    settings: &SmsSettingsUpdate,
) -> anyhow::Result<SaveOutcome> {
    if queries::count_sms_settings(conn, shop_id)? >= 1 {
        queries::update_sms_settings(conn, shop_id, settings)?;
        tracing::info!(shop_id, "updated SMS settings");
        return Ok(SaveOutcome::Updated);
    }

    let id = uuid::Uuid::new_v4().to_string();
    queries::insert_sms_settings(conn, &id, shop_id, settings)?;
    tracing::info!(shop_id, settings_id = %id, "created SMS settings");
    Ok(SaveOutcome::Inserted)
}

struct Recipient {
    phone: String,
    country: String,
    settings: SmsSettings,
}

fn load_recipient(
    state: &AppState,
    user_id: &str,
    shop_id: &str,
) -> anyhow::Result<Result<Recipient, SkipReason>> {
    let db = state
        .db
        .lock()
        .map_err(|_| anyhow!("database lock poisoned"))?;

    let Some(user) = queries::get_user(&db, user_id)? else {
        return Ok(Err(SkipReason::UserNotFound));
    };

    let (phone, country) = match user.contact() {
        (None, _) => return Ok(Err(SkipReason::MissingPhone)),
        (_, None) => return Ok(Err(SkipReason::MissingCountry)),
        (Some(phone), Some(country)) => (phone.to_string(), country.to_string()),
    };

    let Some(settings) = queries::get_sms_settings(&db, shop_id)? else {
        return Ok(Err(SkipReason::SettingsNotFound));
    };

    Ok(Ok(Recipient {
        phone,
        country,
        settings,
    }))
}

/// Sends `message` to the phone number in `user_id`'s address book through
/// the provider configured for `shop_id`.
pub async fn send(state: &AppState, message: &str, user_id: &str, shop_id: &str) -> DispatchOutcome {
    let recipient = match load_recipient(state, user_id, shop_id) {
        Ok(Ok(recipient)) => recipient,
        Ok(Err(reason)) => return DispatchOutcome::Skipped(reason),
        Err(e) => {
            tracing::error!(error = %e, user_id, shop_id, "failed to load SMS recipient or settings");
            return DispatchOutcome::LookupFailed(e.to_string());
        }
    };

    let settings = recipient.settings;
    let to = match format_phone_number(&recipient.phone, &recipient.country) {
        Ok(to) => to,
        Err(e) => {
            tracing::debug!(error = %e, user_id, "could not format recipient phone number");
            return DispatchOutcome::Skipped(SkipReason::InvalidPhone);
        }
    };

    let provider = settings.provider();
    let Some(client) = state.providers.get(&provider) else {
        return DispatchOutcome::Skipped(SkipReason::UnknownProvider(settings.sms_provider));
    };

    tracing::debug!("choose {provider}");

    let credentials = Credentials {
        api_key: settings.api_key.clone().unwrap_or_default(),
        api_secret: settings.api_token.clone().unwrap_or_default().into(),
    };
    let from = settings.sms_phone.as_deref().unwrap_or_default();

    match client.send_message(&credentials, &to, from, message).await {
        Ok(report) => {
            tracing::debug!(provider = %provider, result = %report.raw, "SMS provider result");
            match report.error_text.clone() {
                Some(error_text) => {
                    tracing::error!(
                        provider = %provider,
                        to = %mask_phone_number(&to),
                        error_text = %error_text,
                        "{provider} error sending sms"
                    );
                    DispatchOutcome::Rejected {
                        provider,
                        error_text,
                        report,
                    }
                }
                None => {
                    tracing::info!(
                        provider = %provider,
                        to = %mask_phone_number(&to),
                        message_id = report.message_id.as_deref().unwrap_or(""),
                        "SMS sent"
                    );
                    DispatchOutcome::Sent { provider, report }
                }
            }
        }
        Err(e) => {
            tracing::error!(provider = %provider, error = %e, "{provider} error");
            DispatchOutcome::Failed {
                provider,
                error: e.to_string(),
            }
        }
    }
}

/// Runs [`send`] on its own task so the caller does not wait on the provider.
pub fn spawn_send(
    state: Arc<AppState>,
    message: String,
    user_id: String,
    shop_id: String,
) -> JoinHandle<DispatchOutcome> {
    tokio::spawn(async move { send(&state, &message, &user_id, &shop_id).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn update(provider: &str, phone: &str) -> SmsSettingsUpdate {
        SmsSettingsUpdate {
            sms_provider: Some(provider.to_string()),
            api_key: Some("k".to_string()),
            api_token: Some("t".to_string()),
            sms_phone: Some(phone.to_string()),
        }
    }

    #[test]
    fn test_first_save_inserts_one_record() {
        let conn = setup_db();
        let outcome = save_settings(&conn, "s1", &update("twilio", "+15559999")).unwrap();

        assert_eq!(outcome, SaveOutcome::Inserted);
        assert_eq!(queries::count_sms_settings(&conn, "s1").unwrap(), 1);
        let settings = queries::get_sms_settings(&conn, "s1").unwrap().unwrap();
        assert_eq!(settings.shop_id, "s1");
        assert_eq!(settings.provider(), SmsProvider::Twilio);
    }

    #[test]
    fn test_second_save_updates_in_place() {
        let conn = setup_db();
        save_settings(&conn, "s1", &update("twilio", "+15559999")).unwrap();
        let first_id = queries::get_sms_settings(&conn, "s1").unwrap().unwrap().id;

        let outcome = save_settings(&conn, "s1", &update("nexmo", "+15558888")).unwrap();

        assert_eq!(outcome, SaveOutcome::Updated);
        assert_eq!(queries::count_sms_settings(&conn, "s1").unwrap(), 1);
        let settings = queries::get_sms_settings(&conn, "s1").unwrap().unwrap();
        assert_eq!(settings.id, first_id);
        assert_eq!(settings.provider(), SmsProvider::Nexmo);
        assert_eq!(settings.sms_phone.as_deref(), Some("+15558888"));
    }

    #[test]
    fn test_other_shop_settings_do_not_trigger_update() {
        let conn = setup_db();
        save_settings(&conn, "shop-a", &update("twilio", "+15550001")).unwrap();

        let outcome = save_settings(&conn, "shop-b", &update("nexmo", "+15550002")).unwrap();

        assert_eq!(outcome, SaveOutcome::Inserted);
        let a = queries::get_sms_settings(&conn, "shop-a").unwrap().unwrap();
        let b = queries::get_sms_settings(&conn, "shop-b").unwrap().unwrap();
        assert_eq!(a.provider(), SmsProvider::Twilio);
        assert_eq!(a.sms_phone.as_deref(), Some("+15550001"));
        assert_eq!(b.provider(), SmsProvider::Nexmo);
    }

    #[test]
    fn test_save_accepts_unrecognized_provider() {
        let conn = setup_db();
        save_settings(&conn, "s1", &update("carrier-pigeon", "+15559999")).unwrap();

        let settings = queries::get_sms_settings(&conn, "s1").unwrap().unwrap();
        assert_eq!(
            settings.provider(),
            SmsProvider::Unknown(Some("carrier-pigeon".to_string()))
        );
    }
}
