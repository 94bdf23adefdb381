//! Generic web page fetching and readable-text extraction.
//!
//! Pages are fetched with certificate verification disabled and a browser
//! User-Agent, then reduced to the text of their primary content blocks.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{Error, Result};
use crate::http::check_status;
use crate::Document;

/// Containers that usually hold a page's main content, most specific first
const MAIN_SELECTORS: [&str; 5] = ["article", "main", "[role='main']", "#content", ".content"];

/// Block-level elements: text under the same nearest block forms one paragraph
const BLOCK_ELEMENTS: [&str; 33] = [
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "main",
    "nav", "ol", "p", "pre", "section", "summary", "td", "th", "ul",
];

/// Elements whose text is never shown to a reader
const HIDDEN_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "svg"];

/// A fetched page body and its declared content type
#[derive(Debug, Clone)]
pub struct Page {
    pub content_type: Option<String>,
    pub body: String,
}

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Page>;
}

/// Fetches pages over HTTP(S) with the insecure, browser-like client.
pub struct WebPageSource {
    client: Client,
}

impl WebPageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for WebPageSource {
    async fn fetch(&self, url: &str) -> Result<Page> {
        debug!("Fetching web page: {url}");
        let resp = check_status(self.client.get(url).send().await?)?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = resp.text().await?;
        debug!("Fetched {} bytes ({})", body.len(), content_type.as_deref().unwrap_or("no content type"));
        Ok(Page { content_type, body })
    }
}

/// Reduce a fetched page to documents tagged with `source_url`
pub fn extract_page(page: &Page, source_url: &str) -> Result<Vec<Document>> {
    let mime = page
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase());

    match mime.as_deref() {
        None | Some("text/html") | Some("application/xhtml+xml") => {
            let document = Html::parse_document(&page.body);
            let title = extract_title(&document)?;
            let text = extract_text(&document)?;
            Ok(vec![Document::new(text, source_url).with_title(title)])
        }
        Some(m) if m.starts_with("text/") => Ok(vec![Document::new(page.body.trim(), source_url)]),
        Some(m) => Err(Error::Fetch(format!("{source_url} returned non-text content ({m})"))),
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("invalid selector {css:?}: {e}")))
}

fn extract_title(document: &Html) -> Result<Option<String>> {
    let title = document
        .select(&selector("title")?)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty());
    Ok(title)
}

fn extract_text(document: &Html) -> Result<String> {
    for css in MAIN_SELECTORS {
        if let Some(root) = document.select(&selector(css)?).next() {
            let text = readable_text(root);
            if !text.is_empty() {
                debug!("Extracted text from <{css}>");
                return Ok(text);
            }
        }
    }

    Ok(document
        .select(&selector("body")?)
        .next()
        .map(readable_text)
        .unwrap_or_default())
}

/// All visible text under `root`, one paragraph per nearest block-level ancestor.
///
/// Text sitting directly in a `<div>` counts as much as text in a `<p>`, so
/// pages that lay out their article in plain containers keep it.
fn readable_text(root: ElementRef<'_>) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_block = None;

    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let mut block = None;
        let mut hidden = false;
        for ancestor in node.ancestors() {
            let Node::Element(el) = ancestor.value() else {
                continue;
            };
            if HIDDEN_ELEMENTS.contains(&el.name()) {
                hidden = true;
                break;
            }
            if block.is_none() && (ancestor.id() == root.id() || BLOCK_ELEMENTS.contains(&el.name())) {
                block = Some(ancestor.id());
            }
        }
        if hidden {
            continue;
        }

        if block != current_block {
            push_paragraph(&mut paragraphs, &current);
            current.clear();
            current_block = block;
        }
        current.push_str(text);
        current.push(' ');
    }
    push_paragraph(&mut paragraphs, &current);

    paragraphs.join("\n\n")
}

fn push_paragraph(paragraphs: &mut Vec<String>, raw: &str) {
    let text = collapse_whitespace(raw);
    if !text.is_empty() {
        paragraphs.push(text);
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
