use serde::{Deserialize, Serialize};

/// Number of characters shown when a commit id is displayed in short form.
pub const SHORT_LEN: usize = 8;

/// Newtype for a version-control commit identifier.
///
/// An empty id is valid and means "unknown": reading the checked-out commit is
/// best-effort and a failure degrades to an empty id instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Create a commit id, trimming surrounding whitespace (as printed by git).
    pub fn new(s: impl Into<String>) -> Self {
        let s: String = s.into();
        Self(s.trim().to_string())
    }

    /// The unknown commit id.
    pub fn unknown() -> Self {
        Self(String::new())
    }

    /// Return the full id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is unknown.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first [`SHORT_LEN`] characters of the id (or all of it if shorter).
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_schema::CommitId;
    ///
    /// let id = CommitId::new("0123456789abcdef");
    /// assert_eq!(id.short(), "01234567");
    /// assert_eq!(CommitId::new("abc123").short(), "abc123");
    /// ```
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CommitId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for CommitId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CommitId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
