use std::{fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;

/// Separator between the segments of a [`ChapterNumber`].
pub const SEPARATOR: char = '.';

/// The dotted hierarchical number of a chapter, e.g. `4.2.1`.
///
/// A chapter number is non-empty, contains no whitespace and has no empty
/// segments. The number of every descendant chapter begins with the number of
/// its parent followed by [`SEPARATOR`].
///
/// Ordering is plain string ordering. Catalog traversal never relies on it:
/// chapters are visited in the order they are declared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChapterNumber(NonEmptyString);

impl ChapterNumber {
    /// Creates a new `ChapterNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidNumberError`] if the string is empty, contains
    /// whitespace, or contains an empty segment (`"4..1"`, `".4"`, `"4."`).
    pub fn new(s: String) -> Result<Self, InvalidNumberError> {
        let non_empty =
            NonEmptyString::new(s.clone()).map_err(|_| InvalidNumberError(s.clone()))?;

        if s.chars().any(char::is_whitespace) || s.split(SEPARATOR).any(str::is_empty) {
            return Err(InvalidNumberError(s));
        }

        Ok(Self(non_empty))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The individual segments of the number.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.as_str().split(SEPARATOR)
    }

    /// The nesting depth of the chapter, starting at 1 for top-level chapters.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Whether `other` is a (possibly indirect) descendant of this number.
    ///
    /// ```
    /// use tailoring::domain::ChapterNumber;
    ///
    /// let parent: ChapterNumber = "4.2".parse().unwrap();
    ///
    /// assert!(parent.is_ancestor_of(&"4.2.1".parse().unwrap()));
    /// assert!(parent.is_ancestor_of(&"4.2.1.3".parse().unwrap()));
    /// assert!(!parent.is_ancestor_of(&"4.21".parse().unwrap()));
    /// assert!(!parent.is_ancestor_of(&parent));
    /// ```
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other
            .as_str()
            .strip_prefix(self.as_str())
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }
}

impl TryFrom<String> for ChapterNumber {
    type Error = InvalidNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ChapterNumber {
    type Error = InvalidNumberError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl AsRef<str> for ChapterNumber {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for ChapterNumber {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChapterNumber {
    type Err = InvalidNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Error returned when a string is not a valid chapter number.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid chapter number '{0}': must be non-empty, without whitespace or empty segments")]
pub struct InvalidNumberError(String);

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("1"; "top level")]
    #[test_case("4.2.1"; "nested")]
    #[test_case("A.1"; "annex")]
    fn accepts_valid_numbers(input: &str) {
        let number = ChapterNumber::from_str(input).unwrap();
        assert_eq!(number.as_str(), input);
    }

    #[test_case(""; "empty")]
    #[test_case("4..1"; "empty segment")]
    #[test_case(".4"; "leading separator")]
    #[test_case("4."; "trailing separator")]
    #[test_case("4 1"; "whitespace")]
    fn rejects_invalid_numbers(input: &str) {
        assert_eq!(
            ChapterNumber::from_str(input),
            Err(InvalidNumberError(input.to_string()))
        );
    }

    #[test]
    fn depth_counts_segments() {
        assert_eq!(ChapterNumber::from_str("1").unwrap().depth(), 1);
        assert_eq!(ChapterNumber::from_str("4.2.1").unwrap().depth(), 3);
    }

    #[test]
    fn ancestor_requires_separator_boundary() {
        let parent = ChapterNumber::from_str("1").unwrap();
        assert!(parent.is_ancestor_of(&ChapterNumber::from_str("1.1").unwrap()));
        assert!(!parent.is_ancestor_of(&ChapterNumber::from_str("10").unwrap()));
        assert!(!parent.is_ancestor_of(&ChapterNumber::from_str("2.1").unwrap()));
    }
}
