//! Request target parsing.
//!
//! Turns the raw target from the request line into decoded path segments.
//! Anything that tries to step outside the document root through the path
//! itself is rejected here; symlinks are caught later by canonicalization.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::files::ServeError;

/// Characters escaped when a decoded name goes back into a URL path.
pub(crate) const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\');

/// A request target split into the parts the file handler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// Decoded path segments, without empty and `.` segments.
    pub segments: Vec<String>,
    /// The still-encoded path, query and fragment removed.
    pub raw_path: String,
    /// Query string without the leading `?`.
    pub query: Option<String>,
}

impl RequestTarget {
    /// Whether the path ended in `/`, i.e. names a directory.
    pub fn has_trailing_slash(&self) -> bool {
        self.raw_path.ends_with('/')
    }

    /// Decoded path as shown to humans, always starting with `/`.
    pub fn display_path(&self) -> String {
        let mut path = format!("/{}", self.segments.join("/"));
        if !self.segments.is_empty() && self.has_trailing_slash() {
            path.push('/');
        }
        path
    }

    /// Location for the trailing-slash redirect of a directory.
    ///
    /// Rebuilt from the decoded segments so it always starts with a single
    /// `/`; a raw `//host` would be read by browsers as another host.
    pub fn directory_location(&self) -> String {
        let mut location = String::from("/");
        for segment in &self.segments {
            location.extend(utf8_percent_encode(segment, SEGMENT));
            location.push('/');
        }
        if let Some(query) = &self.query {
            location.push('?');
            location.push_str(query);
        }
        location
    }
}

/// Parses an origin-form (`/a/b?q`) or absolute-form (`http://host/a/b`)
/// request target.
pub fn parse_target(target: &str) -> Result<RequestTarget, ServeError> {
    let (raw_path, query) = if target.starts_with('/') {
        let without_fragment = target.split_once('#').map_or(target, |(path, _)| path);
        match without_fragment.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (without_fragment.to_string(), None),
        }
    } else if target.starts_with("http://") || target.starts_with("https://") {
        let url = url::Url::parse(target).map_err(|_| ServeError::BadTarget)?;
        (url.path().to_string(), url.query().map(str::to_string))
    } else {
        return Err(ServeError::BadTarget);
    };

    let mut segments = Vec::new();
    for raw in raw_path.split('/') {
        if raw.is_empty() {
            continue;
        }

        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| ServeError::NotFound)?;

        if decoded == "." {
            continue;
        }
        if decoded == ".." || decoded.contains(['/', '\\', '\0']) {
            return Err(ServeError::PathTraversal(target.to_string()));
        }

        segments.push(decoded.into_owned());
    }

    Ok(RequestTarget {
        segments,
        raw_path,
        query,
    })
}
