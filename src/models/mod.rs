use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub url_handle: String,
}

/// Input for creating a category. An absent id is assigned on insert.
#[derive(Debug, Clone, Default)]
pub struct CategoryDraft {
    pub id: Option<Uuid>,
    pub name: String,
    pub url_handle: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub featured_image_url: String,
    pub url_handle: String,
    pub published_date: DateTime<Utc>,
    pub author: String,
    pub is_visible: bool,
    pub categories: Vec<Category>,
}

/// Scalar post fields plus the complete list of category ids to associate.
#[derive(Debug, Clone)]
pub struct BlogPostDraft {
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub featured_image_url: String,
    pub url_handle: String,
    pub published_date: DateTime<Utc>,
    pub author: String,
    pub is_visible: bool,
    pub category_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogImage {
    pub id: Uuid,
    pub file_name: String,
    pub file_extension: String,
    pub title: String,
    pub url: String,
    pub date_created: DateTime<Utc>,
}

impl BlogImage {
    pub fn full_file_name(&self) -> String {
        format!("{}{}", self.file_name, self.file_extension)
    }
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Reader,
    Writer,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Reader, Role::Writer];

    /// Well-known ids the roles are seeded with.
    pub fn id(self) -> Uuid {
        match self {
            Role::Reader => Uuid::from_u128(0xff4e682a_94dd_43e8_bafd_cceaec160d90),
            Role::Writer => Uuid::from_u128(0xf6301485_34e0_46ec_a436_d1fda69ea8d9),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Reader => "Reader",
            Role::Writer => "Writer",
        }
    }

    pub fn from_name(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.name() == name)
    }
}

pub mod db_operations;
