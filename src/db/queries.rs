use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{AddressBook, SmsSettings, SmsSettingsUpdate, User};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── SMS Settings ──

pub fn count_sms_settings(conn: &Connection, shop_id: &str) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sms_settings WHERE shop_id = ?1",
        params![shop_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn get_sms_settings(conn: &Connection, shop_id: &str) -> anyhow::Result<Option<SmsSettings>> {
    let result = conn.query_row(
        "SELECT id, shop_id, sms_provider, api_key, api_token, sms_phone, created_at, updated_at
         FROM sms_settings WHERE shop_id = ?1",
        params![shop_id],
        |row| {
            let created_at: String = row.get(6)?;
            let updated_at: String = row.get(7)?;
            Ok(SmsSettings {
                id: row.get(0)?,
                shop_id: row.get(1)?,
                sms_provider: row.get(2)?,
                api_key: row.get(3)?,
                api_token: row.get(4)?,
                sms_phone: row.get(5)?,
                created_at: parse_timestamp(&created_at),
                updated_at: parse_timestamp(&updated_at),
            })
        },
    );

    match result {
        Ok(settings) => Ok(Some(settings)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_sms_settings(
    conn: &Connection,
    id: &str,
    shop_id: &str,
    settings: &SmsSettingsUpdate,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO sms_settings (id, shop_id, sms_provider, api_key, api_token, sms_phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            shop_id,
            settings.sms_provider,
            settings.api_key,
            settings.api_token,
            settings.sms_phone,
        ],
    )?;
    Ok(())
}

/// Merges the supplied fields into the shop's record. Returns the number of
/// rows touched.
pub fn update_sms_settings(
    conn: &Connection,
    shop_id: &str,
    settings: &SmsSettingsUpdate,
) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE sms_settings SET
           sms_provider = COALESCE(?2, sms_provider),
           api_key = COALESCE(?3, api_key),
           api_token = COALESCE(?4, api_token),
           sms_phone = COALESCE(?5, sms_phone),
           updated_at = datetime('now')
         WHERE shop_id = ?1",
        params![
            shop_id,
            settings.sms_provider,
            settings.api_key,
            settings.api_token,
            settings.sms_phone,
        ],
    )?;
    Ok(count)
}

// ── Users ──

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, name, address_book FROM users WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        },
    );

    match result {
        Ok((id, name, address_book_json)) => {
            // An unreadable address book is treated like a missing one.
            let address_book = address_book_json
                .and_then(|json| serde_json::from_str::<AddressBook>(&json).ok());
            Ok(Some(User {
                id,
                name,
                address_book,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    let address_book = user
        .address_book
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO users (id, name, address_book)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           address_book = excluded.address_book,
           updated_at = datetime('now')",
        params![user.id, user.name, address_book],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn twilio_update() -> SmsSettingsUpdate {
        SmsSettingsUpdate {
            sms_provider: Some("twilio".to_string()),
            api_key: Some("AC123".to_string()),
            api_token: Some("secret".to_string()),
            sms_phone: Some("+15559999".to_string()),
        }
    }

    #[test]
    fn test_get_missing_settings() {
        let conn = setup_db();
        assert!(get_sms_settings(&conn, "shop-1").unwrap().is_none());
        assert_eq!(count_sms_settings(&conn, "shop-1").unwrap(), 0);
    }

    #[test]
    fn test_update_merges_supplied_fields() {
        let conn = setup_db();
        insert_sms_settings(&conn, "id-1", "shop-1", &twilio_update()).unwrap();

        let patch = SmsSettingsUpdate {
            sms_phone: Some("+15550000".to_string()),
            ..Default::default()
        };
        assert_eq!(update_sms_settings(&conn, "shop-1", &patch).unwrap(), 1);

        let settings = get_sms_settings(&conn, "shop-1").unwrap().unwrap();
        assert_eq!(settings.sms_phone.as_deref(), Some("+15550000"));
        assert_eq!(settings.sms_provider.as_deref(), Some("twilio"));
        assert_eq!(settings.api_key.as_deref(), Some("AC123"));
        assert_eq!(settings.api_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_update_is_scoped_to_shop() {
        let conn = setup_db();
        insert_sms_settings(&conn, "id-1", "shop-1", &twilio_update()).unwrap();

        let touched = update_sms_settings(&conn, "shop-2", &twilio_update()).unwrap();
        assert_eq!(touched, 0);
        assert!(get_sms_settings(&conn, "shop-2").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_shop_insert_rejected() {
        let conn = setup_db();
        insert_sms_settings(&conn, "id-1", "shop-1", &twilio_update()).unwrap();
        assert!(insert_sms_settings(&conn, "id-2", "shop-1", &twilio_update()).is_err());
    }

    #[test]
    fn test_user_round_trip_with_address_book() {
        let conn = setup_db();
        let user = User {
            id: "u1".to_string(),
            name: Some("Ada".to_string()),
            address_book: Some(AddressBook {
                phone: Some("5551234".to_string()),
                country: Some("US".to_string()),
            }),
        };
        save_user(&conn, &user).unwrap();

        let loaded = get_user(&conn, "u1").unwrap().unwrap();
        assert_eq!(loaded.name.as_deref(), Some("Ada"));
        assert_eq!(loaded.contact(), (Some("5551234"), Some("US")));
    }

    #[test]
    fn test_user_without_address_book() {
        let conn = setup_db();
        let user = User {
            id: "u2".to_string(),
            name: None,
            address_book: None,
        };
        save_user(&conn, &user).unwrap();

        let loaded = get_user(&conn, "u2").unwrap().unwrap();
        assert_eq!(loaded.contact(), (None, None));
        assert!(get_user(&conn, "nobody").unwrap().is_none());
    }
}
