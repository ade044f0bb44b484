//! Validated video identifier.

use std::fmt;

/// Number of characters a valid video id must have.
pub const VIDEO_ID_LENGTH: usize = 11;

/// Opaque, validated video identifier.
///
/// Construction always goes through [`VideoId::parse`]; there is no `new()`
/// that fabricates one, since video ids are supplied by the caller, not
/// generated locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VideoIdError {
    #[error("video id must be {VIDEO_ID_LENGTH} characters, got {0}")]
    WrongLength(usize),
    #[error("video id contains characters outside [A-Za-z0-9_-]")]
    InvalidCharacters,
}

impl VideoId {
    /// Validate and wrap a raw string. Rejects anything that isn't exactly
    /// [`VIDEO_ID_LENGTH`] characters from the `[A-Za-z0-9_-]` class.
    pub fn parse(raw: &str) -> Result<Self, VideoIdError> {
        if raw.chars().count() != VIDEO_ID_LENGTH {
            return Err(VideoIdError::WrongLength(raw.chars().count()));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(VideoIdError::InvalidCharacters);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_ids() {
        assert!(VideoId::parse("jNQXAC9IVRw").is_ok());
        assert!(VideoId::parse("bdq-IYxhByw").is_ok());
        assert!(VideoId::parse("a_b-C9d0E1_").is_ok());
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(VideoId::parse("short"), Err(VideoIdError::WrongLength(5)));
        assert_eq!(
            VideoId::parse("waytoolongvideoid"),
            Err(VideoIdError::WrongLength(17))
        );
    }

    #[test]
    fn rejects_path_traversal() {
        assert_eq!(VideoId::parse("../etc"), Err(VideoIdError::WrongLength(6)));
        // 11 chars but contains slashes/dots - must still be rejected on charset.
        assert_eq!(
            VideoId::parse("../../etc12"),
            Err(VideoIdError::InvalidCharacters)
        );
    }
}
