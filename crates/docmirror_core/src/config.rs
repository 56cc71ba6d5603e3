use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://docs.claude.com";
pub const DEFAULT_DOCS_PREFIX: &str = "/en/docs/claude-code/";
pub const DEFAULT_NAV_PAGE: &str = "overview";
pub const DEFAULT_USER_AGENT: &str = "docmirror/0.1";
pub const DEFAULT_DOCS_DIR: &str = "docs";
pub const DEFAULT_INDEX_FILE: &str = "README.md";
pub const DEFAULT_INDEX_TITLE: &str = "Claude Code Mirror Docs";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct MirrorConfig {
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SiteSection {
    pub base_url: Option<String>,
    pub sitemap_url: Option<String>,
    pub nav_page_url: Option<String>,
    pub docs_prefix: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct OutputSection {
    pub docs_dir: Option<String>,
    pub index_file: Option<String>,
    pub title: Option<String>,
}

impl MirrorConfig {
    /// Resolve the site base URL: env `DOCMIRROR_BASE_URL` > config > default.
    pub fn base_url(&self) -> String {
        if let Some(value) = non_empty_env("DOCMIRROR_BASE_URL") {
            return trim_trailing_slash(&value);
        }
        self.site
            .base_url
            .as_deref()
            .map(trim_trailing_slash)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Absolute documentation path prefix on the site, always `/`-terminated.
    pub fn docs_prefix(&self) -> String {
        let prefix = self
            .site
            .docs_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_DOCS_PREFIX.to_string());
        if prefix.ends_with('/') {
            prefix
        } else {
            format!("{prefix}/")
        }
    }

    /// Sitemap URL: config > `<base_url>/sitemap.xml`.
    pub fn sitemap_url(&self) -> String {
        self.site
            .sitemap_url
            .clone()
            .unwrap_or_else(|| format!("{}/sitemap.xml", self.base_url()))
    }

    /// Navigation index page URL: config > `<base_url><docs_prefix>overview`.
    pub fn nav_page_url(&self) -> String {
        self.site.nav_page_url.clone().unwrap_or_else(|| {
            format!("{}{}{}", self.base_url(), self.docs_prefix(), DEFAULT_NAV_PAGE)
        })
    }

    /// Resolve user agent: env `DOCMIRROR_USER_AGENT` > config > default.
    pub fn user_agent(&self) -> String {
        if let Some(value) = non_empty_env("DOCMIRROR_USER_AGENT") {
            return value;
        }
        self.site
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    /// Output directory for mirrored pages: env `DOCMIRROR_DOCS_DIR` >
    /// config > default.
    pub fn docs_dir(&self) -> String {
        if let Some(value) = non_empty_env("DOCMIRROR_DOCS_DIR") {
            return value;
        }
        self.output
            .docs_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_DOCS_DIR.to_string())
    }

    pub fn index_file(&self) -> String {
        self.output
            .index_file
            .clone()
            .unwrap_or_else(|| DEFAULT_INDEX_FILE.to_string())
    }

    pub fn index_title(&self) -> String {
        self.output
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_INDEX_TITLE.to_string())
    }
}

/// Load a `MirrorConfig` from a TOML file. Returns the default config when
/// the file does not exist.
pub fn load_config(config_path: &Path) -> Result<MirrorConfig> {
    if !config_path.exists() {
        return Ok(MirrorConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: MirrorConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

fn non_empty_env(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn trim_trailing_slash(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_targets_claude_code_docs() {
        let config = MirrorConfig::default();
        assert_eq!(config.base_url(), "https://docs.claude.com");
        assert_eq!(config.docs_prefix(), "/en/docs/claude-code/");
        assert_eq!(config.sitemap_url(), "https://docs.claude.com/sitemap.xml");
        assert_eq!(
            config.nav_page_url(),
            "https://docs.claude.com/en/docs/claude-code/overview"
        );
        assert_eq!(config.docs_dir(), "docs");
        assert_eq!(config.index_file(), "README.md");
    }

    #[test]
    fn load_config_returns_default_for_missing_file() {
        let config = load_config(Path::new("/nonexistent/docmirror.toml")).expect("load config");
        assert_eq!(config, MirrorConfig::default());
    }

    #[test]
    fn load_config_parses_site_and_output_sections() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("docmirror.toml");
        fs::write(
            &config_path,
            r#"
[site]
base_url = "https://docs.example.org"
docs_prefix = "/handbook"
user_agent = "test-agent/1.0"

[output]
docs_dir = "mirror"
title = "Handbook Mirror"
"#,
        )
        .expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert_eq!(config.base_url(), "https://docs.example.org");
        // Prefix is normalized to be slash-terminated.
        assert_eq!(config.docs_prefix(), "/handbook/");
        assert_eq!(config.user_agent(), "test-agent/1.0");
        assert_eq!(config.docs_dir(), "mirror");
        assert_eq!(config.index_title(), "Handbook Mirror");
        assert_eq!(config.index_file(), "README.md");
        assert_eq!(
            config.nav_page_url(),
            "https://docs.example.org/handbook/overview"
        );
    }

    #[test]
    fn load_config_tolerates_partial_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("docmirror.toml");
        fs::write(&config_path, "[output]\ndocs_dir = \"pages\"\n").expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert_eq!(config.docs_dir(), "pages");
        assert_eq!(config.base_url(), "https://docs.claude.com");
    }

    #[test]
    fn load_config_returns_error_for_invalid_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("docmirror.toml");
        fs::write(&config_path, "[site\nbase_url = \"oops\"").expect("write config");
        let error = load_config(&config_path).expect_err("must fail");
        assert!(error.to_string().contains("failed to parse"));
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let config = MirrorConfig {
            site: SiteSection {
                base_url: Some("https://docs.example.org/".to_string()),
                ..SiteSection::default()
            },
            ..MirrorConfig::default()
        };
        assert_eq!(config.base_url(), "https://docs.example.org");
    }
}
