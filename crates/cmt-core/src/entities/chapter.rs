//! Chapter entity - one local chapter of the fraternity

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: Snowflake,
    pub name: String,
    /// URL-safe unique key, e.g. `alpha-beta`
    pub slug: String,
    pub school: Option<String>,
    pub region: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    pub fn new(id: Snowflake, name: String, slug: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            slug,
            school: None,
            region: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Lowercase, hyphen-separated slug derived from a display name
    pub fn slugify(name: &str) -> String {
        name.split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
