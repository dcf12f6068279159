pub mod messaging;
pub mod phone;
pub mod sms;
