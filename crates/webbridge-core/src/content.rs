//! Web content descriptions and local file resolution.
//!
//! [`WebContent`] is what a session loads when its engine attaches.
//! [`ContentProvider`] turns `LoadHtmlFile` requests into HTML for engines
//! that can only load strings.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::request::Headers;

/// Inline HTML and the options engines may honour when loading it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlData {
    pub html: String,
    pub base_url: Option<String>,
    pub mime_type: Option<String>,
    pub encoding: Option<String>,
    pub history_url: Option<String>,
}

impl HtmlData {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            base_url: None,
            mime_type: Some("text/html".to_string()),
            encoding: Some("utf-8".to_string()),
            history_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Where a `LoadHtmlFile` path is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSource {
    /// Bundled asset, relative to the host's asset directory.
    Asset,
    /// A `file://` URL or filesystem path.
    Resource,
}

/// Initial content of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebContent {
    Url { url: String, headers: Headers },
    Data(HtmlData),
    File { path: String, source: FileSource },
    /// Content is driven entirely through the navigator.
    NavigatorOnly,
}

impl WebContent {
    pub fn url(url: impl Into<String>) -> Self {
        WebContent::Url {
            url: url.into(),
            headers: Headers::new(),
        }
    }

    /// Point at `url`, keeping headers when already a URL.
    pub fn with_url(self, url: impl Into<String>) -> Self {
        match self {
            WebContent::Url { headers, .. } => WebContent::Url {
                url: url.into(),
                headers,
            },
            _ => WebContent::url(url),
        }
    }
}

/// Path prefixes tried, in order, for [`FileSource::Asset`] lookups.
const ASSET_PREFIXES: &[&str] = &["assets/", "resources/files/", "resources/assets/"];

/// Serves local files from a base directory.
pub struct ContentProvider {
    /// Base directory for resolving asset paths.
    base_dir: PathBuf,
    /// In-memory overrides (for dynamically generated content).
    overrides: HashMap<String, (String, Vec<u8>)>, // path -> (mime, data)
}

impl ContentProvider {
    /// Create a new content provider rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            overrides: HashMap::new(),
        }
    }

    /// Register an in-memory asset override.
    pub fn add_override(
        &mut self,
        path: impl Into<String>,
        mime: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) {
        self.overrides
            .insert(path.into(), (mime.into(), data.into()));
    }

    /// Resolve a request path to content bytes and MIME type.
    pub fn resolve(&self, path: &str) -> Option<(Cow<'_, str>, Cow<'_, [u8]>)> {
        let clean = path.trim_start_matches('/');

        if let Some((mime, data)) = self.overrides.get(clean) {
            return Some((Cow::Borrowed(mime.as_str()), Cow::Borrowed(data.as_slice())));
        }

        let file_path = self.base_dir.join(clean);

        // Canonicalize both sides so `..` and symlinks cannot escape the base.
        let canonical_base = std::fs::canonicalize(&self.base_dir).ok()?;
        let canonical_file = std::fs::canonicalize(&file_path).ok()?;
        if !canonical_file.starts_with(&canonical_base) {
            return None;
        }

        let data = std::fs::read(&canonical_file).ok()?;
        let mime = mime_from_extension(&file_path);
        Some((Cow::Owned(mime.to_string()), Cow::Owned(data)))
    }

    /// Resolve an asset, trying the bare path and then each known prefix.
    pub fn resolve_asset(&self, path: &str) -> Option<(Cow<'_, str>, Cow<'_, [u8]>)> {
        let clean = path.trim_start_matches('/');
        let mut candidates = vec![clean.to_string()];
        candidates.extend(
            ASSET_PREFIXES
                .iter()
                .filter(|prefix| !clean.starts_with(*prefix))
                .map(|prefix| format!("{prefix}{clean}")),
        );
        candidates.iter().find_map(|candidate| self.resolve(candidate))
    }

    /// Load a file as HTML text.
    ///
    /// Never fails: when nothing resolves, an error page naming the file is
    /// returned so the engine still shows something.
    pub fn load_html_file(&self, path: &str, source: FileSource) -> String {
        let loaded = match source {
            FileSource::Asset => self
                .resolve_asset(path)
                .map(|(_, data)| String::from_utf8_lossy(&data).into_owned())
                .ok_or_else(|| format!("asset not found under {}", self.base_dir.display())),
            FileSource::Resource => {
                let fs_path = path.strip_prefix("file://").unwrap_or(path);
                std::fs::read_to_string(fs_path).map_err(|e| e.to_string())
            }
        };

        loaded.unwrap_or_else(|reason| {
            warn!(path = %path, ?source, reason = %reason, "loadHtmlFile failed");
            error_page(path, source, &reason)
        })
    }

    /// The base directory for assets.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

fn error_page(path: &str, source: FileSource, reason: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Error Loading File</title></head>\n<body>\n  \
         <h2>Error Loading File</h2>\n  <p>File: {} (source: {:?})</p>\n  <pre>{}</pre>\n\
         </body>\n</html>",
        escape_html(path),
        source,
        escape_html(reason)
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Guess MIME type from file extension.
fn mime_from_extension(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") | Some("mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("wasm") => "application/wasm",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain",
        Some("xml") => "application/xml",
        _ => "application/octet-stream",
    }
}
