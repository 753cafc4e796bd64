//! User identity as seen by the daily task engine.
//!
//! Profile fields live outside this crate; the engine only needs a stable
//! identifier and the streak counter exposed through the user store port.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rejections from [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The identifier was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// The identifier was not a canonical UUID.
    #[error("user id must be a canonical UUID without surrounding whitespace")]
    InvalidId,
}

/// Stable user identifier stored as a UUID.
///
/// # Examples
/// ```
/// use petcare_backend::domain::UserId;
///
/// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid uuid");
/// assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
/// assert!(UserId::new(" 3fa85f64-5717-4562-b3fc-2c963f66afa6").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a user id from text, as received from CLI flags or JSON.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        match raw.as_ref() {
            "" => Err(UserValidationError::EmptyId),
            text if text.trim() != text => Err(UserValidationError::InvalidId),
            text => Uuid::parse_str(text)
                .map(Self)
                .map_err(|_| UserValidationError::InvalidId),
        }
    }

    /// Wrap an already-parsed UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for user identifier parsing.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case("not-a-uuid", UserValidationError::InvalidId)]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
    fn rejects_malformed_ids(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[rstest]
    fn serde_round_trips_through_strings() {
        let id = UserId::random();
        let encoded = serde_json::to_string(&id).expect("serialise id");
        assert_eq!(encoded, format!("\"{id}\""));
        let decoded: UserId = serde_json::from_str(&encoded).expect("deserialise id");
        assert_eq!(decoded, id);
    }
}
