use std::fmt;

use thiserror::Error;

/// The kind of record a lookup failed to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Story,
    Chapter,
    ReadingList,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Story => "Story",
            EntityKind::Chapter => "Chapter",
            EntityKind::ReadingList => "Reading list",
            EntityKind::User => "User",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(EntityKind),
    #[error("Cannot delete default reading list")]
    DefaultList,
    #[error("validation error: {0}")]
    Validation(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages_name_the_entity() {
        assert_eq!(ServiceError::NotFound(EntityKind::Story).to_string(), "Story not found");
        assert_eq!(
            ServiceError::NotFound(EntityKind::ReadingList).to_string(),
            "Reading list not found"
        );
    }
}
