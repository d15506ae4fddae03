//! Extension to content-type registry.
//!
//! Built-in defaults come from `mime_guess`. Entries registered on top of
//! them always win. The registry is assembled once at startup and then moved
//! into the file handler, where it is only ever read.

use std::collections::HashMap;
use std::path::Path;

/// Content-type returned for extensions nobody knows about.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Maps file extensions (with leading dot, e.g. `.wasm`) to content-types.
#[derive(Debug, Clone)]
pub struct MimeRegistry {
    overrides: HashMap<String, String>,
}

impl MimeRegistry {
    /// Registry holding only the built-in defaults.
    pub fn with_defaults() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }

    /// Registry used by the preview server: defaults plus `.wasm`.
    pub fn preview() -> Self {
        let mut registry = Self::with_defaults();
        registry.overrides.insert(".wasm".to_string(), "application/wasm".to_string());
        registry
    }

    /// Inserts or overwrites the content-type for `extension`.
    ///
    /// The leading dot is optional (`"wasm"` and `".wasm"` name the same
    /// entry). Empty extensions and empty content-types are rejected.
    pub fn register(
        &mut self,
        extension: impl AsRef<str>,
        content_type: impl Into<String>,
    ) -> anyhow::Result<()> {
        let extension = normalize_extension(extension.as_ref());
        let content_type = content_type.into();

        if extension.len() < 2 {
            anyhow::bail!("cannot register an empty extension");
        }
        if content_type.trim().is_empty() {
            anyhow::bail!("content-type for {} must not be empty", extension);
        }

        tracing::debug!(
            extension = %extension,
            content_type = %content_type,
            "Registered MIME type"
        );
        self.overrides.insert(extension, content_type);
        Ok(())
    }

    /// Resolves the content-type for `extension`.
    ///
    /// Order: exact registered entry, lowercased registered entry, built-in
    /// default, then [`FALLBACK_CONTENT_TYPE`].
    pub fn lookup(&self, extension: &str) -> &str {
        let extension = normalize_extension(extension);

        if let Some(content_type) = self.overrides.get(&extension) {
            return content_type;
        }

        let lowered = extension.to_ascii_lowercase();
        if let Some(content_type) = self.overrides.get(&lowered) {
            return content_type;
        }

        mime_guess::from_ext(lowered.trim_start_matches('.'))
            .first_raw()
            .unwrap_or(FALLBACK_CONTENT_TYPE)
    }

    /// Resolves the content-type for a file by its extension.
    pub fn lookup_path(&self, path: &Path) -> &str {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self.lookup(ext),
            None => FALLBACK_CONTENT_TYPE,
        }
    }

    /// Number of explicitly registered entries.
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl Default for MimeRegistry {
    fn default() -> Self {
        Self::preview()
    }
}

fn normalize_extension(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}
