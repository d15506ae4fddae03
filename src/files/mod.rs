//! Static file serving
//!
//! This module maps request targets onto the document root and builds the
//! response: the file itself, a directory's index file, a generated
//! directory listing, a trailing-slash redirect, or an error page.
//!
//! Nothing in here is mutated once the server is running. A single
//! [`StaticFiles`] value is shared by every connection task.

pub mod listing;
pub mod resolve;

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::Config;
use crate::http::mime::MimeRegistry;
use crate::http::request::Request;
use crate::http::response::Response;

pub use resolve::{RequestTarget, parse_target};

/// Per-request failures. Each one becomes an error response; none of them
/// affect other requests or the server.
#[derive(Debug)]
pub enum ServeError {
    /// The request target is neither origin-form nor absolute-form.
    BadTarget,
    /// Nothing exists at the resolved path.
    NotFound,
    /// The target resolves outside the document root.
    PathTraversal(String),
    /// The file exists but could not be read.
    ReadFailure(PathBuf, std::io::Error),
}

impl ServeError {
    /// Converts the error into the response sent to the client.
    ///
    /// Traversal attempts are answered with 404 so they reveal nothing about
    /// what exists outside the root.
    pub fn into_response(self) -> Response {
        match self {
            ServeError::BadTarget => Response::bad_request(),
            ServeError::NotFound => Response::not_found(),
            ServeError::PathTraversal(target) => {
                tracing::warn!(target = %target, "Path traversal attempt blocked");
                Response::not_found()
            }
            ServeError::ReadFailure(path, e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to read file");
                Response::internal_error()
            }
        }
    }
}

/// What a request target points at inside the document root.
#[derive(Debug, PartialEq, Eq)]
enum Resolved {
    File(PathBuf),
    Directory(PathBuf),
}

/// Serves files below a document root.
#[derive(Debug)]
pub struct StaticFiles {
    root: PathBuf,
    index_files: Vec<String>,
    directory_listing: bool,
    mime: MimeRegistry,
}

impl StaticFiles {
    /// Creates a handler for `root`.
    ///
    /// The root is canonicalized here and must be an existing directory.
    pub fn new(root: impl AsRef<Path>, mime: MimeRegistry) -> anyhow::Result<Self> {
        let root = root.as_ref();
        let canonical = std::fs::canonicalize(root)
            .with_context(|| format!("document root {} is not accessible", root.display()))?;

        if !canonical.is_dir() {
            anyhow::bail!("document root {} is not a directory", canonical.display());
        }

        Ok(Self {
            root: canonical,
            index_files: vec!["index.html".to_string(), "index.htm".to_string()],
            directory_listing: true,
            mime,
        })
    }

    /// Creates a handler from the loaded configuration.
    pub fn from_config(cfg: &Config, mime: MimeRegistry) -> anyhow::Result<Self> {
        Ok(Self::new(&cfg.root, mime)?
            .with_index_files(cfg.index_files.clone())
            .with_directory_listing(cfg.directory_listing))
    }

    pub fn with_index_files(mut self, index_files: Vec<String>) -> Self {
        self.index_files = index_files;
        self
    }

    /// Enables or disables generated listings for directories without an
    /// index file. Disabled directories answer 404.
    pub fn with_directory_listing(mut self, enable: bool) -> Self {
        self.directory_listing = enable;
        self
    }

    /// The canonical document root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mime(&self) -> &MimeRegistry {
        &self.mime
    }

    /// Produces the response for one request. Never fails: every error is
    /// turned into an error page.
    pub async fn handle(&self, req: &Request) -> Response {
        if !req.method.is_servable() {
            return Response::method_not_allowed();
        }

        match self.serve(&req.path).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    async fn serve(&self, raw_target: &str) -> Result<Response, ServeError> {
        let target = parse_target(raw_target)?;

        match self.resolve(&target).await? {
            Resolved::File(path) => self.serve_file(&path).await,
            Resolved::Directory(dir) => {
                if !target.has_trailing_slash() {
                    return Ok(Response::moved_permanently(&target.directory_location()));
                }
                self.serve_directory(&dir, &target).await
            }
        }
    }

    async fn resolve(&self, target: &RequestTarget) -> Result<Resolved, ServeError> {
        let mut path = self.root.clone();
        path.extend(&target.segments);

        let path = self.confine(&path, &target.raw_path).await?;
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|_| ServeError::NotFound)?;

        if meta.is_dir() {
            Ok(Resolved::Directory(path))
        } else {
            Ok(Resolved::File(path))
        }
    }

    /// Canonicalizes `path` and checks it is still below the root. Catches
    /// symlinks that point out of the document root.
    async fn confine(&self, path: &Path, raw_target: &str) -> Result<PathBuf, ServeError> {
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|_| ServeError::NotFound)?;

        if !canonical.starts_with(&self.root) {
            return Err(ServeError::PathTraversal(format!(
                "{} -> {}",
                raw_target,
                canonical.display()
            )));
        }

        Ok(canonical)
    }

    async fn serve_directory(
        &self,
        dir: &Path,
        target: &RequestTarget,
    ) -> Result<Response, ServeError> {
        for index in &self.index_files {
            let candidate = dir.join(index);
            let is_file = tokio::fs::metadata(&candidate)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);

            if is_file {
                let index_path = self.confine(&candidate, &target.raw_path).await?;
                return self.serve_file(&index_path).await;
            }
        }

        if !self.directory_listing {
            return Err(ServeError::NotFound);
        }

        let html = listing::render(dir, &target.display_path())
            .await
            .map_err(|e| ServeError::ReadFailure(dir.to_path_buf(), e))?;

        Ok(Response::ok("text/html; charset=utf-8", html))
    }

    async fn serve_file(&self, path: &Path) -> Result<Response, ServeError> {
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| ServeError::ReadFailure(path.to_path_buf(), e))?;

        let content_type = self.mime.lookup_path(path);
        tracing::debug!(
            path = %path.display(),
            content_type,
            bytes = content.len(),
            "Serving file"
        );

        let response = Response::ok(content_type, content);
        let modified = tokio::fs::metadata(path).await.and_then(|m| m.modified());
        match modified {
            Ok(time) => Ok(response.with_header("Last-Modified", httpdate::fmt_http_date(time))),
            Err(_) => Ok(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::{Method, RequestBuilder};
    use crate::http::response::StatusCode;

    fn get(path: &str) -> Request {
        RequestBuilder::new().method(Method::GET).path(path).build().unwrap()
    }

    fn fixture() -> (tempfile::TempDir, StaticFiles) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>docs</h1>").unwrap();
        std::fs::write(dir.path().join("module.wasm"), b"\0asm\x01\0\0\0").unwrap();
        std::fs::create_dir(dir.path().join("api")).unwrap();
        std::fs::write(dir.path().join("api").join("classes.html"), "classes").unwrap();

        let files = StaticFiles::new(dir.path(), MimeRegistry::preview()).unwrap();
        (dir, files)
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StaticFiles::new(dir.path().join("www"), MimeRegistry::preview()).unwrap_err();
        assert!(err.to_string().contains("www"));
    }

    #[tokio::test]
    async fn serves_wasm_with_registered_type() {
        let (_dir, files) = fixture();

        let response = files.handle(&get("/module.wasm")).await;

        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.header("Content-Type"), Some("application/wasm"));
        assert_eq!(response.body, b"\0asm\x01\0\0\0".to_vec());
    }

    #[tokio::test]
    async fn root_serves_index() {
        let (_dir, files) = fixture();

        let response = files.handle(&get("/")).await;

        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.body, b"<h1>docs</h1>".to_vec());
    }

    #[tokio::test]
    async fn directory_without_slash_redirects() {
        let (_dir, files) = fixture();

        let response = files.handle(&get("/api")).await;

        assert_eq!(response.status, StatusCode::MovedPermanently);
        assert_eq!(response.header("Location"), Some("/api/"));
    }

    #[tokio::test]
    async fn directory_without_index_is_listed_or_404() {
        let (dir, files) = fixture();

        let listed = files.handle(&get("/api/")).await;
        assert_eq!(listed.status, StatusCode::Ok);
        assert!(String::from_utf8_lossy(&listed.body).contains("classes.html"));

        let files = StaticFiles::new(dir.path(), MimeRegistry::preview())
            .unwrap()
            .with_directory_listing(false);
        let hidden = files.handle(&get("/api/")).await;
        assert_eq!(hidden.status, StatusCode::NotFound);
    }

    #[tokio::test]
    async fn non_get_methods_are_rejected() {
        let (_dir, files) = fixture();
        let req = RequestBuilder::new().method(Method::POST).path("/").build().unwrap();

        let response = files.handle(&req).await;

        assert_eq!(response.status, StatusCode::MethodNotAllowed);
        assert_eq!(response.header("Allow"), Some("GET, HEAD"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_file_is_500() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, files) = fixture();
        let locked = dir.path().join("locked.wasm");
        std::fs::write(&locked, b"\0asm").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::read(&locked).is_ok() {
            // Permission bits do not apply to root.
            return;
        }

        let response = files.handle(&get("/locked.wasm")).await;

        assert_eq!(response.status, StatusCode::InternalServerError);
        assert_eq!(response.body, b"500 Internal Server Error\n".to_vec());
    }

    #[tokio::test]
    async fn file_response_carries_last_modified() {
        let (_dir, files) = fixture();

        let response = files.handle(&get("/module.wasm")).await;

        let stamp = response.header("Last-Modified").unwrap();
        assert!(stamp.ends_with(" GMT"));
        assert!(httpdate::parse_http_date(stamp).is_ok());
    }

    #[tokio::test]
    async fn redirect_never_leaves_the_host() {
        let (dir, files) = fixture();
        std::fs::create_dir(dir.path().join("evil.example")).unwrap();

        for target in ["//evil.example", "///evil.example?x=1", "/%2Fevil.example"] {
            let response = files.handle(&get(target)).await;
            if response.status == StatusCode::MovedPermanently {
                let location = response.header("Location").unwrap();
                assert!(location.starts_with("/evil.example/"), "{} -> {}", target, location);
            }
        }

        let response = files.handle(&get("//evil.example")).await;
        assert_eq!(response.status, StatusCode::MovedPermanently);
        assert_eq!(response.header("Location"), Some("/evil.example/"));
    }

    #[tokio::test]
    async fn bad_target_is_400() {
        let (_dir, files) = fixture();

        let response = files.handle(&get("*")).await;

        assert_eq!(response.status, StatusCode::BadRequest);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_out_of_root_is_not_served() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        let (dir, files) = fixture();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            dir.path().join("leak.txt"),
        )
        .unwrap();

        let response = files.handle(&get("/leak.txt")).await;

        assert_eq!(response.status, StatusCode::NotFound);
        assert!(!String::from_utf8_lossy(&response.body).contains("secret"));
    }
}
