//! Playback offset, canonicalised the way filenames and job ids spell it.

use std::fmt;

/// A non-negative, finite playback offset in seconds.
///
/// Equality and the canonical textual form both go through the same
/// shortest round-tripping formatter Rust's `f64` `Display` already uses, so
/// `5.3` and `5.30` (which parse to the identical `f64`) always produce the
/// same string and the same fingerprint. The one adjustment on top of the
/// default formatter is that whole numbers keep a trailing `.0` (`5` becomes
/// `5.0`) to match the filenames the upstream generator already has on disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeOffset(f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimeOffsetError {
    #[error("offset must be finite and non-negative")]
    NotFiniteOrNegative,
}

impl TimeOffset {
    pub fn parse(seconds: f64) -> Result<Self, TimeOffsetError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(TimeOffsetError::NotFiniteOrNegative);
        }
        Ok(Self(seconds))
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// The decimal form used in filenames, job ids and the `X-Timestamp`
    /// header.
    pub fn canonical(&self) -> String {
        let s = format!("{}", self.0);
        if s.contains('.') {
            s
        } else {
            format!("{s}.0")
        }
    }

    /// Truncated (not rounded) to millisecond precision and re-spelled in
    /// the same shortest canonical form `canonical()` uses, so this is a
    /// genuine prefix of the filenames a writer actually produces (e.g.
    /// `5.3` stays `"5.3"`, not `"5.300"`) — used to repair float-formatting
    /// drift when scanning a folder for a near match.
    pub fn millis_prefix(&self) -> String {
        let truncated = (self.0 * 1000.0).floor() / 1000.0;
        Self(truncated).canonical()
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_matches_across_equal_values() {
        let a = TimeOffset::parse(5.3).unwrap();
        let b = TimeOffset::parse(5.30).unwrap();
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a.canonical(), "5.3");
    }

    #[test]
    fn whole_numbers_keep_trailing_zero() {
        let t = TimeOffset::parse(0.0).unwrap();
        assert_eq!(t.canonical(), "0.0");
        let t = TimeOffset::parse(17.0).unwrap();
        assert_eq!(t.canonical(), "17.0");
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        assert!(TimeOffset::parse(-1.0).is_err());
        assert!(TimeOffset::parse(f64::NAN).is_err());
        assert!(TimeOffset::parse(f64::INFINITY).is_err());
    }

    #[test]
    fn millis_prefix_is_a_genuine_prefix_of_the_canonical_form() {
        let t = TimeOffset::parse(5.3).unwrap();
        let canonical = t.canonical();
        assert!(canonical.starts_with(&t.millis_prefix()));
    }

    #[test]
    fn millis_prefix_truncates_rather_than_rounds() {
        let t = TimeOffset::parse(5.3009).unwrap();
        assert_eq!(t.millis_prefix(), "5.3");
    }
}
