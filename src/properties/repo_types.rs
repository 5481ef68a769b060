use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Listing record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Property {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid, // owner
    pub image: String, // public URL
    #[serde(skip_serializing)]
    pub image_key: String, // storage key, used for cleanup
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub categories: String,
    pub size: String,
    pub address: String,
    pub city: String,
    pub condition: String,
    pub approved: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

/// Everything needed to create a listing. New listings always start pending.
#[derive(Debug, Clone)]
pub struct NewProperty {
    pub user_id: Uuid,
    pub image: String,
    pub image_key: String,
    pub name: String,
    pub kind: String,
    pub categories: String,
    pub size: String,
    pub address: String,
    pub city: String,
    pub condition: String,
}

/// Descriptive fields an owner may change. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PropertyPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub categories: Option<String>,
    pub size: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub condition: Option<String>,
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl PropertyPatch {
    /// Blank strings mean "leave as is".
    pub fn normalized(self) -> Self {
        Self {
            name: non_blank(self.name),
            kind: non_blank(self.kind),
            categories: non_blank(self.categories),
            size: non_blank(self.size),
            address: non_blank(self.address),
            city: non_blank(self.city),
            condition: non_blank(self.condition),
        }
    }
}

/// Store-level query. Every `Some` narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyFilter {
    pub approved: Option<bool>,
    pub owner: Option<Uuid>,
    pub id: Option<Uuid>,
    pub city: Option<String>,
    pub kind: Option<String>,
    pub categories: Option<String>,
}

/// Entry of the city catalog used by the browse UI.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct City {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub state: String,
    #[serde(rename = "type")]
    pub kind: String,
}
