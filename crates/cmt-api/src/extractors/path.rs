//! Path parameter extractors
//!
//! Ids arrive as decimal strings and are parsed into [`Snowflake`]s.

use cmt_core::Snowflake;
use serde::Deserialize;

use crate::response::ApiError;

fn parse_id(raw: &str, name: &str) -> Result<Snowflake, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::invalid_path(format!("Invalid {name} format")))
}

/// Path parameters with chapter_id
#[derive(Debug, Deserialize)]
pub struct ChapterIdPath {
    pub chapter_id: String,
}

impl ChapterIdPath {
    pub fn chapter_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.chapter_id, "chapter_id")
    }
}

/// Path parameters with member_id
#[derive(Debug, Deserialize)]
pub struct MemberIdPath {
    pub member_id: String,
}

impl MemberIdPath {
    pub fn member_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.member_id, "member_id")
    }
}

/// Path parameters with member_id and a role interval id
#[derive(Debug, Deserialize)]
pub struct MemberIntervalPath {
    pub member_id: String,
    pub interval_id: String,
}

impl MemberIntervalPath {
    pub fn member_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.member_id, "member_id")
    }

    pub fn interval_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.interval_id, "interval_id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        let path = MemberIntervalPath {
            member_id: "42".to_string(),
            interval_id: "x".to_string(),
        };
        assert_eq!(path.member_id().unwrap(), Snowflake::new(42));
        assert_eq!(path.interval_id().unwrap_err().error_code(), "INVALID_PATH_PARAMETER");
    }
}
