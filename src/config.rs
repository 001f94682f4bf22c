//! Loader configuration describing where stylesheets live and where the document sits.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::loader::{BaseUrlContext, FileFetcher, HttpFetcher, MemoryDocument, Transport};

const DEFAULT_CONFIG_FILES: [&str; 3] = [
  "css-loader.config.json",
  "css-loader.config.yaml",
  "css-loader.config.yml",
];

/// Discoverable loader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
  /// Base url module names are resolved against.
  pub base_url: String,
  /// Location path of the document receiving the styles.
  pub document_path: String,
  /// Directory the site root maps to when reading stylesheets from disk.
  pub root: PathBuf,
  /// Web origin to fetch stylesheets from instead of reading `root`.
  pub origin: Option<String>,
}

impl Default for LoaderConfig {
  fn default() -> Self {
    Self {
      base_url: "/".into(),
      document_path: "/index.html".into(),
      root: PathBuf::from("."),
      origin: None,
    }
  }
}

impl LoaderConfig {
  /// Look for a configuration file in `dir`.
  ///
  /// Missing files fall back to defaults. A file that exists but fails to parse is reported
  /// and also falls back to defaults, so callers can keep operating.
  pub fn discover(dir: &Path) -> Self {
    let Some(candidate) = DEFAULT_CONFIG_FILES
      .iter()
      .map(|name| dir.join(name))
      .find(|path| path.is_file())
    else {
      return Self::default();
    };

    match Self::from_path(&candidate) {
      Ok(config) => config,
      Err(err) => {
        tracing::warn!(path = %candidate.display(), error = %format!("{err:#}"), "ignoring loader config");
        Self::default()
      }
    }
  }

  /// Read configuration from a JSON or YAML file, chosen by extension.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path)
      .with_context(|| format!("failed to read config at {}", path.display()))?;

    let extension = path
      .extension()
      .and_then(|value| value.to_str())
      .unwrap_or_default();

    match extension {
      "json" => serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display())),
      "yaml" | "yml" => serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display())),
      other => Err(anyhow!(
        "unsupported config format `{other}` for {}",
        path.display()
      )),
    }
  }

  /// Host context resolving module names against the configured base url.
  pub fn context(&self) -> BaseUrlContext {
    BaseUrlContext::new(self.base_url.clone())
  }

  /// Transport reading from the origin when one is set, otherwise from `root`.
  pub fn transport(&self) -> Transport {
    match &self.origin {
      Some(origin) => Transport::Http(HttpFetcher::new(origin.clone())),
      None => Transport::File(FileFetcher::new(self.root.clone())),
    }
  }

  /// Empty document located at the configured path.
  pub fn document(&self) -> MemoryDocument {
    MemoryDocument::new(self.document_path.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn discover_defaults_without_file() {
    let dir = tempdir().unwrap();
    assert_eq!(LoaderConfig::discover(dir.path()), LoaderConfig::default());
  }

  #[test]
  fn reads_json_with_partial_fields() {
    let dir = tempdir().unwrap();
    fs::write(
      dir.path().join("css-loader.config.json"),
      r#"{"baseUrl": "/static/", "origin": "https://example.com"}"#,
    )
    .unwrap();

    let config = LoaderConfig::discover(dir.path());
    assert_eq!(config.base_url, "/static/");
    assert_eq!(config.origin.as_deref(), Some("https://example.com"));
    assert_eq!(config.document_path, "/index.html");
    assert!(matches!(config.transport(), Transport::Http(_)));
  }

  #[test]
  fn reads_yaml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("css-loader.config.yaml");
    fs::write(&path, "documentPath: /app/index.html\nroot: www\n").unwrap();

    let config = LoaderConfig::from_path(&path).unwrap();
    assert_eq!(config.document_path, "/app/index.html");
    assert_eq!(config.root, PathBuf::from("www"));
    assert!(matches!(config.transport(), Transport::File(_)));
  }

  #[test]
  fn invalid_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("css-loader.config.json"), "{not json").unwrap();

    assert_eq!(LoaderConfig::discover(dir.path()), LoaderConfig::default());
  }

  #[test]
  fn rejects_unknown_extensions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("loader.toml");
    fs::write(&path, "base_url = '/'").unwrap();

    let err = LoaderConfig::from_path(&path).unwrap_err();
    assert!(err.to_string().contains("unsupported config format"));
  }
}
