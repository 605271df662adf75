//! Section headers (`[default]`, `[name]`, `[profile name]`) and file dialects.

use regex::Regex;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// Name that marks the default profile.
pub const DEFAULT_PROFILE: &str = "default";

/// Header rendering convention of a file.
///
/// The credentials file always writes `[name]`; the config file writes
/// `[profile name]` for everything except the default section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Credentials,
    Config,
}

impl Dialect {
    /// Infer the dialect from a file name: `config` uses [`Dialect::Config`],
    /// anything else [`Dialect::Credentials`].
    pub fn from_path(path: &Path) -> Self {
        match path.file_name().and_then(|f| f.to_str()) {
            Some(name) if name.eq_ignore_ascii_case("config") => Dialect::Config,
            _ => Dialect::Credentials,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Credentials => "credentials",
            Dialect::Config => "config",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credentials" => Ok(Dialect::Credentials),
            "config" => Ok(Dialect::Config),
            other => Err(format!(
                "unknown dialect '{other}' (expected 'credentials' or 'config')"
            )),
        }
    }
}

/// Identity of a profile within a file: the default section or a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProfileKey {
    Default,
    Named(String),
}

impl ProfileKey {
    /// `None` and the default marker map to [`ProfileKey::Default`].
    pub fn for_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            None => ProfileKey::Default,
            Some(n) if n.eq_ignore_ascii_case(DEFAULT_PROFILE) => ProfileKey::Default,
            Some(n) => ProfileKey::Named(n.to_string()),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ProfileKey::Default)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ProfileKey::Default => None,
            ProfileKey::Named(n) => Some(n),
        }
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileKey::Default => f.write_str(DEFAULT_PROFILE),
            ProfileKey::Named(n) => f.write_str(n),
        }
    }
}

fn default_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\[\s*default\s*\]$")
            .expect("default_header_regex: pattern is valid and should always compile")
    })
}

fn named_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\[\s*(?:profile\s+)?([A-Za-z0-9_.\-]+)\s*\]$")
            .expect("named_header_regex: pattern is valid and should always compile")
    })
}

/// A classified section header line.
#[derive(Debug, Clone)]
pub struct ProfileHeader {
    raw_text: String,
    profile_name: Option<String>,
    dialect: Dialect,
}

impl ProfileHeader {
    /// Classify `line` as a header.
    ///
    /// Returns `None` when the line does not follow the header grammar; this
    /// never fails harder than that.
    pub fn classify(line: &str, dialect: Dialect) -> Option<Self> {
        let trimmed = line.trim();

        if default_header_regex().is_match(trimmed) {
            return Some(Self {
                raw_text: trimmed.to_string(),
                profile_name: None,
                dialect,
            });
        }

        let caps = named_header_regex().captures(trimmed)?;
        let name = caps.get(1)?.as_str();

        Some(Self {
            raw_text: trimmed.to_string(),
            profile_name: Some(name.to_string()),
            dialect,
        })
    }

    /// True when `line` follows the header grammar.
    pub fn is_header(line: &str) -> bool {
        let trimmed = line.trim();
        default_header_regex().is_match(trimmed) || named_header_regex().is_match(trimmed)
    }

    /// The `[default]` header.
    pub fn default_header(dialect: Dialect) -> Self {
        Self::for_name(None, dialect)
    }

    /// Header for `name`; `None` or the default marker give the default header.
    pub fn for_name(name: Option<&str>, dialect: Dialect) -> Self {
        Self::for_key(&ProfileKey::for_name(name), dialect)
    }

    /// Header carrying exactly `key`. A named profile called `default` keeps
    /// its name and renders as `[profile default]`.
    pub fn for_key(key: &ProfileKey, dialect: Dialect) -> Self {
        let mut header = Self {
            raw_text: String::new(),
            profile_name: key.name().map(str::to_string),
            dialect,
        };
        header.raw_text = header.to_canonical_text();
        header
    }

    pub fn profile_name(&self) -> Option<&str> {
        self.profile_name.as_deref()
    }

    pub fn is_default(&self) -> bool {
        self.profile_name.is_none()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The header line as it was read (trimmed).
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Identity within a file. Only a `[default]` line is the default
    /// profile; `[profile default]` is a named profile.
    pub fn key(&self) -> ProfileKey {
        match &self.profile_name {
            None => ProfileKey::Default,
            Some(name) => ProfileKey::Named(name.clone()),
        }
    }

    /// Render per dialect: `[default]`, `[name]` or `[profile name]`.
    pub fn to_canonical_text(&self) -> String {
        match (&self.profile_name, self.dialect) {
            (None, _) => format!("[{DEFAULT_PROFILE}]"),
            (Some(name), Dialect::Credentials) if name.eq_ignore_ascii_case(DEFAULT_PROFILE) => {
                format!("[profile {name}]")
            }
            (Some(name), Dialect::Credentials) => format!("[{name}]"),
            (Some(name), Dialect::Config) => format!("[profile {name}]"),
        }
    }
}

/// Headers compare by defaultness and name only.
impl PartialEq for ProfileHeader {
    fn eq(&self, other: &Self) -> bool {
        self.profile_name == other.profile_name
    }
}

impl Eq for ProfileHeader {}

impl fmt::Display for ProfileHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_header(line: &str, dialect: Dialect) {
        assert!(
            ProfileHeader::classify(line, dialect).is_none(),
            "{line:?} should not be a header"
        );
        assert!(!ProfileHeader::is_header(line));
    }

    fn named(line: &str, dialect: Dialect) -> ProfileHeader {
        let header = ProfileHeader::classify(line, dialect)
            .unwrap_or_else(|| panic!("{line:?} should be a header"));
        assert!(!header.is_default());
        header
    }

    #[test]
    fn test_bad_format_rejected() {
        not_header("myprofile", Dialect::Credentials);
        not_header("my profile", Dialect::Credentials);
        not_header("profile myprofile]", Dialect::Config);
        not_header("[profile myprofile", Dialect::Config);
        not_header("[[profile myprofile]]", Dialect::Config);
        not_header("[profile my profile]", Dialect::Config);
        not_header("[]", Dialect::Config);
    }

    #[test]
    fn test_bad_characters_rejected() {
        for c in ['@', '&', '#', '*', '?'] {
            not_header(&format!("[profile my{c}profile]"), Dialect::Config);
        }
    }

    #[test]
    fn test_good_names_accepted() {
        assert_eq!(
            named("[myprofile]", Dialect::Credentials).profile_name(),
            Some("myprofile")
        );
        assert_eq!(
            named("[profile myprofile]", Dialect::Config).profile_name(),
            Some("myprofile")
        );
        assert_eq!(
            named("[profile myprofile]", Dialect::Credentials).profile_name(),
            Some("myprofile")
        );
        assert_eq!(
            named("  [profile  myprofile]  ", Dialect::Credentials).profile_name(),
            Some("myprofile")
        );
        assert_eq!(
            named("[profile my-profile]", Dialect::Config).profile_name(),
            Some("my-profile")
        );
        assert_eq!(
            named("[profile my_profile]", Dialect::Config).profile_name(),
            Some("my_profile")
        );
        assert_eq!(
            named("[profile my.profile]", Dialect::Config).profile_name(),
            Some("my.profile")
        );
        assert_eq!(
            named("[Profile OldProfile]", Dialect::Config).profile_name(),
            Some("OldProfile")
        );
        assert_eq!(
            named("[ spaced ]", Dialect::Credentials).profile_name(),
            Some("spaced")
        );
    }

    #[test]
    fn test_default_header() {
        for line in ["[default]", " [default] ", "[DEFAULT]", "[ default ]"] {
            for dialect in [Dialect::Credentials, Dialect::Config] {
                let header = ProfileHeader::classify(line, dialect)
                    .unwrap_or_else(|| panic!("{line:?} should be a header"));
                assert!(header.is_default());
                assert_eq!(header.profile_name(), None);
                assert_eq!(header.key(), ProfileKey::Default);
            }
        }
    }

    #[test]
    fn test_canonical_text_per_dialect() {
        let creds = named("[profile  my.profile ]", Dialect::Credentials);
        assert_eq!(creds.to_canonical_text(), "[my.profile]");
        assert_eq!(creds.raw_text(), "[profile  my.profile ]");

        let config = named("[my.profile]", Dialect::Config);
        assert_eq!(config.to_canonical_text(), "[profile my.profile]");

        let default = ProfileHeader::default_header(Dialect::Config);
        assert_eq!(default.to_canonical_text(), "[default]");
    }

    #[test]
    fn test_rename_to_default_marker() {
        let header = ProfileHeader::for_name(Some("Default"), Dialect::Config);
        assert!(header.is_default());
        assert_eq!(header.to_string(), "[default]");

        let header = ProfileHeader::for_name(Some("prod"), Dialect::Config);
        assert_eq!(header.raw_text(), "[profile prod]");
    }

    #[test]
    fn test_profile_default_is_named() {
        for dialect in [Dialect::Credentials, Dialect::Config] {
            let header = named("[profile default]", dialect);
            assert_eq!(header.profile_name(), Some("default"));
            assert_eq!(header.key(), ProfileKey::Named("default".into()));
            assert_ne!(header.key(), ProfileKey::Default);
            assert_eq!(header.to_canonical_text(), "[profile default]");
            assert_ne!(header, ProfileHeader::default_header(dialect));

            let rebuilt = ProfileHeader::for_key(&header.key(), dialect);
            assert_eq!(rebuilt, header);
            assert!(!rebuilt.is_default());
        }
    }

    #[test]
    fn test_equality_ignores_dialect_and_spacing() {
        let a = named("[profile  prod]", Dialect::Config);
        let b = named("[prod]", Dialect::Credentials);
        assert_eq!(a, b);
        assert_ne!(a, named("[dev]", Dialect::Credentials));
        assert_ne!(a, ProfileHeader::default_header(Dialect::Config));
    }

    #[test]
    fn test_dialect_from_path_and_str() {
        assert_eq!(
            Dialect::from_path(Path::new("/home/u/.aws/config")),
            Dialect::Config
        );
        assert_eq!(
            Dialect::from_path(Path::new("/home/u/.aws/credentials")),
            Dialect::Credentials
        );
        assert_eq!("CONFIG".parse::<Dialect>(), Ok(Dialect::Config));
        assert!("ini".parse::<Dialect>().is_err());
    }
}
