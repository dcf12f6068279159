use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AddressBook {
    pub phone: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub address_book: Option<AddressBook>,
}

impl User {
    /// Phone and country from the address book. Each is `None` on its own when
    /// absent or empty, so callers can tell which one is missing.
    pub fn contact(&self) -> (Option<&str>, Option<&str>) {
        let book = self.address_book.as_ref();
        let phone = book
            .and_then(|b| b.phone.as_deref())
            .filter(|p| !p.is_empty());
        let country = book
            .and_then(|b| b.country.as_deref())
            .filter(|c| !c.is_empty());
        (phone, country)
    }
}
