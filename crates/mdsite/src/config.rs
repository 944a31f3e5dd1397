//! Configuration file (mdsite.toml) and CLI override resolution.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use mdsite_server::PublisherConfig;
use mdsite_site::{BuildConfig, ExclusionSet};

/// Configuration file structure (mdsite.toml).
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub minify_css: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            exclude: default_exclude(),
            minify_css: false,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_exclude() -> Vec<String> {
    vec!["node_modules".to_string()]
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Flags of the `serve` command that take precedence over the file.
#[derive(Debug, Default)]
pub struct ServeOverrides {
    pub root_dir: Option<PathBuf>,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub open: bool,
}

impl ConfigFile {
    /// Build settings with an optional root directory override.
    pub fn build_config(&self, root_dir: Option<PathBuf>) -> BuildConfig {
        BuildConfig {
            root_dir: root_dir.unwrap_or_else(|| self.site.root_dir.clone()),
            exclude: ExclusionSet::new(self.site.exclude.iter().cloned()),
            minify_css: self.site.minify_css,
        }
    }

    /// Publisher settings with CLI overrides applied.
    pub fn publisher_config(&self, overrides: &ServeOverrides) -> PublisherConfig {
        PublisherConfig {
            host: overrides
                .host
                .clone()
                .unwrap_or_else(|| self.server.host.clone()),
            port: overrides.port.unwrap_or(self.server.port),
            open: overrides.open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();
        let config = load_config(&temp.path().join("mdsite.toml")).unwrap();

        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.site.root_dir, PathBuf::from("."));
        assert_eq!(config.site.exclude, vec!["node_modules".to_string()]);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn reads_all_sections() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mdsite.toml");
        fs::write(
            &path,
            r#"
[site]
root_dir = "docs"
exclude = ["node_modules", "target"]
minify_css = true

[server]
host = "0.0.0.0"
port = 9000
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.site.root_dir, PathBuf::from("docs"));
        assert_eq!(config.site.exclude, vec!["node_modules", "target"]);
        assert!(config.site.minify_css);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mdsite.toml");
        fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.site, SiteConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mdsite.toml");
        fs::write(&path, "[server]\nport = \"eighty\"\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mdsite.toml");
        fs::write(&path, "[site]\nroot = \"docs\"\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn cli_flags_override_file() {
        let config = ConfigFile {
            site: SiteConfig {
                root_dir: PathBuf::from("docs"),
                exclude: vec!["vendor".to_string()],
                minify_css: true,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 9000,
            },
        };

        let build = config.build_config(Some(PathBuf::from("other")));
        assert_eq!(build.root_dir, PathBuf::from("other"));
        assert_eq!(build.exclude, ExclusionSet::new(["vendor"]));
        assert!(build.minify_css);
        assert_eq!(config.build_config(None).root_dir, PathBuf::from("docs"));

        let publisher = config.publisher_config(&ServeOverrides {
            port: Some(1234),
            open: true,
            ..Default::default()
        });
        assert_eq!(publisher.host, "0.0.0.0");
        assert_eq!(publisher.port, 1234);
        assert!(publisher.open);
    }
}
