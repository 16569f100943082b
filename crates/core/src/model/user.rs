use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest display name we keep.
pub const MAX_USERNAME_CHARS: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UsernameError {
    #[error("please enter a username")]
    Empty,

    #[error("username must be at most {max} characters")]
    TooLong { max: usize },
}

/// Display name used to greet the player. Not a credential.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Trim and validate a display name.
    ///
    /// # Errors
    ///
    /// Returns `UsernameError::Empty` for blank input and
    /// `UsernameError::TooLong` past `MAX_USERNAME_CHARS`.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, UsernameError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UsernameError::Empty);
        }
        if trimmed.chars().count() > MAX_USERNAME_CHARS {
            return Err(UsernameError::TooLong {
                max: MAX_USERNAME_CHARS,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Username({})", self.0)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank() {
        assert_eq!(Username::parse("  ada ").unwrap().as_str(), "ada");
        assert_eq!(Username::parse("   ").unwrap_err(), UsernameError::Empty);
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "x".repeat(MAX_USERNAME_CHARS + 1);
        assert_eq!(
            Username::parse(long).unwrap_err(),
            UsernameError::TooLong {
                max: MAX_USERNAME_CHARS
            }
        );
    }
}
