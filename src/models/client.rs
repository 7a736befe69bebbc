use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::measurements::{empty_as_none, Measurements};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "phoneNumber", with = "empty_as_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub measurements: Measurements,
    /// Milliseconds since the Unix epoch, set once at creation.
    pub created_at: i64,
}

impl Client {
    /// Build a brand new client with a fresh identifier and creation time.
    pub fn new(name: impl Into<String>, phone: Option<String>, measurements: Measurements) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            phone,
            measurements,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn phone_display(&self) -> &str {
        self.phone.as_deref().unwrap_or("No phone")
    }
}
