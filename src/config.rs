use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::http::mime::MimeRegistry;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "DOCPREVIEW_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the server binds to
    pub listen_addr: String,
    /// Directory of generated documentation to serve
    pub root: PathBuf,
    /// Files served in place of a directory, tried in order
    pub index_files: Vec<String>,
    /// Generate a listing for directories without an index file
    pub directory_listing: bool,
    /// Extra extension -> content-type entries, applied after `.wasm`
    pub mime_types: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
            root: PathBuf::from("www"),
            index_files: vec!["index.html".to_string(), "index.htm".to_string()],
            directory_listing: true,
            mime_types: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// Starts from the defaults (or the YAML file named by
    /// `DOCPREVIEW_CONFIG`), then applies `LISTEN` and `DOC_ROOT`.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.listen_addr = listen_addr;
        }
        if let Ok(root) = std::env::var("DOC_ROOT") {
            cfg.root = PathBuf::from(root);
        }

        Ok(cfg)
    }

    /// Reads a YAML config file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::from_yaml(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Builds the MIME registry: built-in defaults, the `.wasm` override,
    /// then the configured `mime_types`.
    pub fn mime_registry(&self) -> anyhow::Result<MimeRegistry> {
        let mut registry = MimeRegistry::preview();
        for (extension, content_type) in &self.mime_types {
            registry
                .register(extension, content_type.as_str())
                .with_context(|| format!("invalid mime_types entry for {}", extension))?;
        }
        Ok(registry)
    }
}
