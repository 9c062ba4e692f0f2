//! `.shortclean.toml` loading and document path selection.

use std::path::Path;

use crate::error::Error;
use crate::types::RegisteredNames;

/// File extensions treated as documents when the config names none.
const DEFAULT_EXTENSIONS: [&str; 5] = ["md", "markdown", "html", "htm", "txt"];

/// Project configuration loaded from `.shortclean.toml`.
/// Include/exclude patterns are path prefixes applied to document files.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Prefix for view locators, without a trailing slash.
    base_url: Option<String>,
    /// Path prefixes never scanned.
    exclude: Vec<String>,
    /// Document file extensions; empty means the defaults.
    extensions: Vec<String>,
    /// Path prefixes scanned; empty means everything.
    include: Vec<String>,
    /// Registered shortcode names.
    registered: Vec<String>,
}

/// Raw TOML structure for `.shortclean.toml`.
#[derive(serde::Deserialize)]
struct ShortcleanTomlConfig {
    /// `base_url = "https://example.com"`
    #[serde(default)]
    base_url: Option<String>,
    /// `exclude = ["drafts/"]`
    #[serde(default)]
    exclude: Vec<String>,
    /// `extensions = ["md"]`
    #[serde(default)]
    extensions: Vec<String>,
    /// `include = ["content/"]`
    #[serde(default)]
    include: Vec<String>,
    /// `registered = ["gallery"]`
    #[serde(default)]
    registered: Vec<String>,
}

impl Config {
    /// Load config from `.shortclean.toml` in the given root directory.
    /// Returns a default that scans everything if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config the
    /// user wrote is never silently replaced by defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".shortclean.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: ShortcleanTomlConfig = toml::from_str(content)?;
        return Ok(Self {
            base_url: raw.base_url.map(|url| return url.trim_end_matches('/').to_string()),
            exclude: raw.exclude,
            extensions: raw.extensions,
            include: raw.include,
            registered: raw.registered,
        });
    }

    /// Prefix for view locators, without a trailing slash.
    pub fn base_url(&self) -> Option<&str> {
        return self.base_url.as_deref();
    }

    /// Whether a file extension marks a document.
    pub fn is_document_extension(&self, ext: &str) -> bool {
        if self.extensions.is_empty() {
            return DEFAULT_EXTENSIONS.iter().any(|known| return known.eq_ignore_ascii_case(ext));
        }
        return self.extensions.iter().any(|known| return known.eq_ignore_ascii_case(ext));
    }

    /// Snapshot of the directive registry: configured names plus `extra`
    /// (from the command line).
    pub fn registered_names(&self, extra: &[String]) -> RegisteredNames {
        return self.registered.iter().chain(extra).map(|name| return name.trim()).filter(|name| return !name.is_empty()).collect();
    }

    /// Check whether a document path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_scans_everything() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.should_scan("anything/at/all.md"));
        assert!(config.is_document_extension("md"));
        assert!(config.is_document_extension("HTML"));
        assert!(!config.is_document_extension("rs"));
        assert!(config.registered_names(&[]).is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".shortclean.toml"), "registered = [").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }

    #[test]
    fn include_then_exclude() {
        let config = Config::parse(
            r#"
include = ["content/"]
exclude = ["content/archive/"]
"#,
        )
        .unwrap();
        assert!(config.should_scan("content/post.md"));
        assert!(!config.should_scan("content/archive/old.md"));
        assert!(!config.should_scan("drafts/post.md"));
    }

    #[test]
    fn registry_merges_command_line_names() {
        let config = Config::parse(r#"registered = ["gallery", " caption "]"#).unwrap();
        let names = config.registered_names(&["embed".to_string(), String::new()]);
        assert!(names.contains("gallery"));
        assert!(names.contains("caption"));
        assert!(names.contains("embed"));
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn custom_extensions_replace_defaults() {
        let config = Config::parse(r#"extensions = ["post"]"#).unwrap();
        assert!(config.is_document_extension("post"));
        assert!(!config.is_document_extension("md"));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let config = Config::parse(r#"base_url = "https://example.com/""#).unwrap();
        assert_eq!(config.base_url(), Some("https://example.com"));
    }
}
