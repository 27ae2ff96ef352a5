use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// The identifier of an installed package.
///
/// Derived from the last path segment of a source reference with any `.git`
/// suffix removed; it is the unique key of the registry and the name of the
/// installed binary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    /// Wrap an already-derived name.
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Derive the package name from a source reference.
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_schema::PackageName;
    ///
    /// assert_eq!(PackageName::from_reference("sharkdp/fd"), "fd");
    /// assert_eq!(PackageName::from_reference("https://codeberg.org/dnkl/foot.git"), "foot");
    /// assert_eq!(PackageName::from_reference("gitlab.com/org/tool/"), "tool");
    /// ```
    pub fn from_reference(reference: &str) -> Self {
        let last = reference
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(reference);
        Self(last.strip_suffix(".git").unwrap_or(last).to_string())
    }

    /// Whether the name can be used as a single directory and file name.
    ///
    /// Empty names, `.`, `..` and names containing a path separator are not.
    ///
    /// ```
    /// use kiln_schema::PackageName;
    ///
    /// assert!(PackageName::from_reference("org/fd").is_path_safe());
    /// assert!(!PackageName::from_reference("org/..").is_path_safe());
    /// assert!(!PackageName::from_reference("org/.git").is_path_safe());
    /// ```
    pub fn is_path_safe(&self) -> bool {
        !matches!(self.0.as_str(), "" | "." | "..") && !self.0.contains(['/', '\\', '\0'])
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for PackageName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The build procedure used to produce an installed binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    /// `Makefile` / `makefile`, built with `make`.
    Make,
    /// `Cargo.toml`, built with `cargo build --release`.
    Cargo,
    /// `CMakeLists.txt`, generated into `build/` and built with `make`.
    Cmake,
    /// `configure` script followed by `make`.
    Configure,
    /// `build.zig`, built with `zig build`.
    Zig,
    /// A project-local `build.sh`.
    Shell,
}

impl BuildSystem {
    /// All build systems in detection priority order.
    pub const ALL: [Self; 6] = [
        Self::Make,
        Self::Cargo,
        Self::Cmake,
        Self::Configure,
        Self::Zig,
        Self::Shell,
    ];

    /// The tag persisted in the registry.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Make => "make",
            Self::Cargo => "cargo",
            Self::Cmake => "cmake",
            Self::Configure => "configure",
            Self::Zig => "zig",
            Self::Shell => "shell",
        }
    }
}

impl std::fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an installed binary lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InstallScope {
    /// Shared system executable directory (e.g. `/usr/local/bin`).
    #[default]
    System,
    /// Per-user executable directory (e.g. `~/.local/bin`).
    Local,
}

impl InstallScope {
    /// Scope from the persisted `local` flag.
    pub fn from_local(local: bool) -> Self {
        if local { Self::Local } else { Self::System }
    }

    /// Whether this is the per-user scope.
    pub fn is_local(self) -> bool {
        self == Self::Local
    }
}

impl std::fmt::Display for InstallScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// One installed package, as persisted in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Unique key: the derived package name.
    pub name: PackageName,
    /// Source reference as originally supplied (re-resolved on upgrade).
    pub repo: String,
    /// Build procedure used for the installed binary.
    pub build_system: BuildSystem,
    /// Commit checked out when the binary was built; empty when unknown.
    #[serde(default)]
    pub hash: crate::CommitId,
    /// Installed to the per-user directory rather than the system one.
    #[serde(default)]
    pub local: bool,
    /// Linked statically.
    #[serde(default, rename = "static")]
    pub static_link: bool,
    /// Branch the source was cloned from, if one was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Time of the last successful install of this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
}

impl PackageRecord {
    /// Install scope derived from the `local` flag.
    pub fn scope(&self) -> InstallScope {
        InstallScope::from_local(self.local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_bare_reference() {
        assert_eq!(PackageName::from_reference("BurntSushi/ripgrep"), "ripgrep");
    }

    #[test]
    fn test_name_strips_git_suffix_only_at_end() {
        assert_eq!(PackageName::from_reference("org/my.git.tool.git"), "my.git.tool");
        assert_eq!(PackageName::from_reference("org/gitui"), "gitui");
    }

    #[test]
    fn test_path_safe_names() {
        for reference in ["org/tool", "org/.hidden", "org/a..b", "org/tool.git"] {
            assert!(PackageName::from_reference(reference).is_path_safe(), "{reference}");
        }
        for reference in ["org/..", "org/.", "org/.git", "org/..git", "", "/"] {
            assert!(!PackageName::from_reference(reference).is_path_safe(), "{reference}");
        }
        assert!(!PackageName::new("a\\b").is_path_safe());
    }

    #[test]
    fn test_build_system_tags() {
        let json = serde_json::to_string(&BuildSystem::Cmake).unwrap();
        assert_eq!(json, "\"cmake\"");
        for bs in BuildSystem::ALL {
            let round: BuildSystem =
                serde_json::from_str(&format!("\"{}\"", bs.as_str())).unwrap();
            assert_eq!(round, bs);
        }
    }

    #[test]
    fn test_record_reads_minimal_legacy_entry() {
        let json = r#"{
            "name": "foo",
            "repo": "org/foo",
            "build_system": "make",
            "hash": "abc123",
            "local": false,
            "static": true
        }"#;
        let record: PackageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "foo");
        assert_eq!(record.hash, "abc123");
        assert!(record.static_link);
        assert_eq!(record.scope(), InstallScope::System);
        assert!(record.branch.is_none());
        assert!(record.installed_at.is_none());
    }

    #[test]
    fn test_record_omits_absent_optionals() {
        let record = PackageRecord {
            name: PackageName::new("fd"),
            repo: "sharkdp/fd".to_string(),
            build_system: BuildSystem::Cargo,
            hash: crate::CommitId::unknown(),
            local: true,
            static_link: false,
            branch: None,
            installed_at: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"static\":false"));
        assert!(json.contains("\"hash\":\"\""));
        assert!(!json.contains("branch"));
        assert!(!json.contains("installed_at"));
    }
}
