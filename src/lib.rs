pub mod config;
pub mod error;
pub mod http;
pub mod output;
pub mod resolve;
pub mod summarize;
pub mod transcript;
pub mod validate;
pub mod web;
pub mod ytdlp;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use error::{Error, Result};
pub use resolve::Resolver;
pub use summarize::Summarizer;

const LONG_FORM_HOST: &str = "youtube.com";
const SHORT_LINK_HOST: &str = "youtu.be";

static WATCH_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/[^?#]*\?(?:[^#]*&)?v=([^&#]+)").expect("valid regex"));
static PATH_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/(?:shorts|embed|live)/([^/?&#]+)").expect("valid regex"));
static SHORT_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtu\.be/([^/?&#]+)").expect("valid regex"));

/// A piece of extracted text and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub text: String,
    pub source_url: String,
    pub title: Option<String>,
}

impl Document {
    pub fn new(text: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_url: source_url.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }
}

/// Non-empty, ordered text extracted from a single URL.
///
/// Only constructed through [`ExtractedContent::new`], which drops blank
/// documents and refuses to build an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractedContent {
    documents: Vec<Document>,
}

impl ExtractedContent {
    pub fn new(documents: Vec<Document>, source_url: &str) -> Result<Self> {
        let documents: Vec<Document> = documents
            .into_iter()
            .filter(|d| !d.text.trim().is_empty())
            .collect();
        if documents.is_empty() {
            return Err(Error::EmptyContent(source_url.to_string()));
        }
        Ok(Self { documents })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn title(&self) -> Option<&str> {
        self.documents.iter().find_map(|d| d.title.as_deref())
    }

    /// All document text in order, joined by `separator`
    pub fn joined(&self, separator: &str) -> String {
        self.documents
            .iter()
            .map(|d| d.text.trim())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Category of a URL, decided by host tokens alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlKind {
    Video,
    Web,
}

impl std::fmt::Display for UrlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlKind::Video => write!(f, "video"),
            UrlKind::Web => write!(f, "web"),
        }
    }
}

pub fn classify(url: &str) -> UrlKind {
    if url.contains(LONG_FORM_HOST) || url.contains(SHORT_LINK_HOST) {
        UrlKind::Video
    } else {
        UrlKind::Web
    }
}

/// Extract the video ID from a long-form or short-link YouTube URL
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();

    if url.contains(LONG_FORM_HOST) {
        // youtube.com/watch?v=ID
        if let Some(caps) = WATCH_PARAM_RE.captures(url) {
            return Some(caps[1].to_string());
        }

        // youtube.com/shorts/ID, /embed/ID, /live/ID
        if let Some(caps) = PATH_ID_RE.captures(url) {
            return Some(caps[1].to_string());
        }
    }

    // youtu.be/ID
    if url.contains(SHORT_LINK_HOST) {
        if let Some(caps) = SHORT_LINK_RE.captures(url) {
            return Some(caps[1].to_string());
        }
    }

    None
}
