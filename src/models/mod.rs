pub mod sms_settings;
pub mod user;

pub use sms_settings::{SaveOutcome, SmsProvider, SmsSettings, SmsSettingsUpdate};
pub use user::{AddressBook, User};
