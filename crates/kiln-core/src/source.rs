//! Source reference resolution.
//!
//! Turns what the operator typed (`org/repo`, `host/org/repo`, or a full URL)
//! into an [`Origin`]. Pure string interpretation: no network, no filesystem.

use thiserror::Error;

/// Host used when a reference does not name one.
pub const DEFAULT_HOST: &str = "github.com";

/// Hosts recognised anywhere inside a reference.
const KNOWN_HOSTS: [&str; 3] = ["gitlab.com", "codeberg.org", "github.com"];

/// A reference that cannot name a repository.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SourceError {
    /// Nothing left once the scheme and host were stripped.
    #[error("invalid package reference '{0}': no repository path")]
    EmptyPath(String),
}

/// Where a package's source is fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    host: String,
    path: String,
}

impl Origin {
    /// Resolve a package reference.
    ///
    /// Known hosts are matched by substring first; otherwise a dotted first
    /// segment followed by at least two more segments is taken as the host;
    /// otherwise [`DEFAULT_HOST`] is assumed.
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_core::Origin;
    ///
    /// let origin = Origin::resolve("sharkdp/fd").unwrap();
    /// assert_eq!(origin.url(), "https://github.com/sharkdp/fd");
    ///
    /// let origin = Origin::resolve("git.sr.ht/~sircmpwn/aerc").unwrap();
    /// assert_eq!(origin.host(), "git.sr.ht");
    /// assert_eq!(origin.path(), "~sircmpwn/aerc");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::EmptyPath`] if no repository path remains.
    pub fn resolve(reference: &str) -> Result<Self, SourceError> {
        let without_scheme = reference
            .split_once("://")
            .map_or(reference, |(_, rest)| rest);
        let segments: Vec<&str> = without_scheme
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let known = KNOWN_HOSTS.iter().find(|h| reference.contains(*h)).copied();
        let dotted_host = segments.len() > 2 && segments[0].contains('.');

        let host = match known {
            Some(h) => h.to_string(),
            None if dotted_host => segments[0].to_string(),
            None => DEFAULT_HOST.to_string(),
        };

        let strip_first = segments.first().is_some_and(|s| *s == host) || dotted_host;
        let path_segments = if strip_first {
            segments.get(1..).unwrap_or_default()
        } else {
            &segments[..]
        };

        if path_segments.is_empty() {
            return Err(SourceError::EmptyPath(reference.to_string()));
        }

        Ok(Self {
            host,
            path: path_segments.join("/"),
        })
    }

    /// Host name, e.g. `github.com`.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Repository path on the host, e.g. `sharkdp/fd`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// HTTPS clone URL.
    pub fn url(&self) -> String {
        format!("https://{}/{}", self.host, self.path)
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.host, self.path)
    }
}
