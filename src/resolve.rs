//! Content resolution: classify a URL and extract its text.
//!
//! Video URLs run an ordered chain of transcript strategies, stopping at the
//! first one that produces text. Everything else is fetched as a web page.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::transcript::CaptionTranscript;
use crate::web::{PageSource, WebPageSource, extract_page};
use crate::ytdlp::YtDlpLoader;
use crate::{Document, ExtractedContent, UrlKind, classify, extract_video_id, http};

/// One way of turning a video ID into text
#[async_trait]
pub trait TranscriptStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, video_id: &str, source_url: &str) -> Result<Vec<Document>>;
}

/// Knobs for building the default resolver
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Caption language preference
    pub lang: String,
    /// Upper bound on each network call and on the yt-dlp subprocess
    pub timeout: Duration,
    /// Whether to try the yt-dlp loader when captions fail
    pub fallback: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            timeout: Duration::from_secs(30),
            fallback: true,
        }
    }
}

pub struct Resolver {
    strategies: Vec<Box<dyn TranscriptStrategy>>,
    pages: Box<dyn PageSource>,
}

impl Resolver {
    /// Captions first, then (optionally) the yt-dlp loader; web pages via the insecure client
    pub fn new(settings: &ResolverSettings) -> Result<Self> {
        let client = http::client(settings.timeout)?;
        let mut strategies: Vec<Box<dyn TranscriptStrategy>> =
            vec![Box::new(CaptionTranscript::new(client.clone(), &settings.lang))];
        if settings.fallback {
            strategies.push(Box::new(YtDlpLoader::new(client, &settings.lang, settings.timeout)));
        }
        let pages = Box::new(WebPageSource::new(http::insecure_client(settings.timeout)?));
        Ok(Self::with_parts(strategies, pages))
    }

    pub fn with_parts(strategies: Vec<Box<dyn TranscriptStrategy>>, pages: Box<dyn PageSource>) -> Self {
        Self { strategies, pages }
    }

    pub async fn resolve(&self, url: &str) -> Result<ExtractedContent> {
        let kind = classify(url);
        debug!("Resolving {url} as {kind}");
        match kind {
            UrlKind::Video => self.resolve_video(url).await,
            UrlKind::Web => self.resolve_web(url).await,
        }
    }

    async fn resolve_video(&self, url: &str) -> Result<ExtractedContent> {
        let video_id = extract_video_id(url).ok_or_else(|| Error::IdentifierExtraction(url.to_string()))?;
        debug!("Video ID: {video_id}");

        let mut last_err = None;
        for strategy in &self.strategies {
            let attempt = strategy
                .fetch(&video_id, url)
                .await
                .and_then(|docs| ExtractedContent::new(docs, url));
            match attempt {
                Ok(content) => {
                    info!("Extracted {video_id} via {}", strategy.name());
                    return Ok(content);
                }
                Err(e) => {
                    warn!("{} failed for {video_id}: {e}", strategy.name());
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::TranscriptUnavailable(format!("no transcript strategy for {video_id}"))))
    }

    async fn resolve_web(&self, url: &str) -> Result<ExtractedContent> {
        let page = self.pages.fetch(url).await?;
        let docs = extract_page(&page, url)?;
        ExtractedContent::new(docs, url)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::StatusCode;

    use super::*;
    use crate::web::Page;

    enum Outcome {
        Text(&'static str),
        Blank,
        Unavailable,
        Restricted,
    }

    struct FakeStrategy {
        name: &'static str,
        outcome: Outcome,
        calls: Arc<AtomicUsize>,
    }

    impl FakeStrategy {
        fn boxed(name: &'static str, outcome: Outcome) -> (Box<dyn TranscriptStrategy>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let strategy = FakeStrategy {
                name,
                outcome,
                calls: calls.clone(),
            };
            (Box::new(strategy), calls)
        }
    }

    #[async_trait]
    impl TranscriptStrategy for FakeStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, video_id: &str, source_url: &str) -> Result<Vec<Document>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::Text(text) => Ok(vec![Document::new(format!("{text} ({video_id})"), source_url)]),
                Outcome::Blank => Ok(vec![Document::new("  \n ", source_url)]),
                Outcome::Unavailable => Err(Error::TranscriptUnavailable("captions disabled".to_string())),
                Outcome::Restricted => Err(Error::Restricted("not available in your country".to_string())),
            }
        }
    }

    struct FakePages {
        page: Option<Page>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PageSource for FakePages {
        async fn fetch(&self, url: &str) -> Result<Page> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.page.clone().ok_or_else(|| Error::Http {
                status: StatusCode::FORBIDDEN,
                url: url.to_string(),
            })
        }
    }

    fn pages(page: Option<Page>) -> (Box<dyn PageSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Box::new(FakePages { page, calls: calls.clone() }), calls)
    }

    fn html_page(body: &str) -> Option<Page> {
        Some(Page {
            content_type: Some("text/html".to_string()),
            body: body.to_string(),
        })
    }

    #[test]
    fn test_default_settings() {
        let settings = ResolverSettings::default();
        assert_eq!(settings.lang, "en");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(settings.fallback);
    }

    #[test]
    fn test_default_resolver_chains_captions_then_loader() {
        let resolver = Resolver::new(&ResolverSettings::default()).unwrap();
        let names: Vec<_> = resolver.strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["captions", "yt-dlp"]);
    }

    #[test]
    fn test_no_fallback_keeps_only_captions() {
        let settings = ResolverSettings {
            fallback: false,
            ..ResolverSettings::default()
        };
        let resolver = Resolver::new(&settings).unwrap();
        let names: Vec<_> = resolver.strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["captions"]);
    }

    #[tokio::test]
    async fn test_primary_strategy_wins() {
        let (primary, primary_calls) = FakeStrategy::boxed("captions", Outcome::Text("hello world"));
        let (fallback, fallback_calls) = FakeStrategy::boxed("yt-dlp", Outcome::Text("unused"));
        let (pages, page_calls) = pages(None);
        let resolver = Resolver::with_parts(vec![primary, fallback], pages);

        let content = resolver.resolve("https://www.youtube.com/watch?v=abc123&t=5").await.unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content.documents()[0].text, "hello world (abc123)");
        assert_eq!(content.documents()[0].source_url, "https://www.youtube.com/watch?v=abc123&t=5");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
        assert_eq!(page_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_used_when_captions_disabled() {
        let (primary, _) = FakeStrategy::boxed("captions", Outcome::Unavailable);
        let (fallback, fallback_calls) = FakeStrategy::boxed("yt-dlp", Outcome::Text("from loader"));
        let (pages, _) = pages(None);
        let resolver = Resolver::with_parts(vec![primary, fallback], pages);

        let content = resolver.resolve("https://youtu.be/abc123").await.unwrap();
        assert_eq!(content.joined(" "), "from loader (abc123)");
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_fail_surfaces_fallback_error() {
        let (primary, _) = FakeStrategy::boxed("captions", Outcome::Unavailable);
        let (fallback, _) = FakeStrategy::boxed("yt-dlp", Outcome::Restricted);
        let (pages, _) = pages(None);
        let resolver = Resolver::with_parts(vec![primary, fallback], pages);

        let err = resolver.resolve("https://youtu.be/abc123").await.unwrap_err();
        assert!(err.is_restricted());
        assert!(err.hint().is_some());
    }

    #[tokio::test]
    async fn test_blank_transcript_falls_through() {
        let (primary, _) = FakeStrategy::boxed("captions", Outcome::Blank);
        let (fallback, fallback_calls) = FakeStrategy::boxed("yt-dlp", Outcome::Text("from loader"));
        let (pages, _) = pages(None);
        let resolver = Resolver::with_parts(vec![primary, fallback], pages);

        let content = resolver.resolve("https://youtu.be/abc123").await.unwrap();
        assert_eq!(content.joined(" "), "from loader (abc123)");
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_blank_is_empty_content() {
        let (primary, _) = FakeStrategy::boxed("captions", Outcome::Blank);
        let (pages, _) = pages(None);
        let resolver = Resolver::with_parts(vec![primary], pages);

        let err = resolver.resolve("https://youtu.be/abc123").await.unwrap_err();
        assert!(matches!(err, Error::EmptyContent(_)));
    }

    #[tokio::test]
    async fn test_unrecognized_video_shape_skips_network() {
        let (primary, primary_calls) = FakeStrategy::boxed("captions", Outcome::Text("unused"));
        let (pages, page_calls) = pages(None);
        let resolver = Resolver::with_parts(vec![primary], pages);

        let err = resolver.resolve("https://www.youtube.com/@channel").await.unwrap_err();
        assert!(matches!(err, Error::IdentifierExtraction(ref u) if u == "https://www.youtube.com/@channel"));
        assert_eq!(primary_calls.load(Ordering::SeqCst), 0);
        assert_eq!(page_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_web_page_resolves_to_text() {
        let (primary, primary_calls) = FakeStrategy::boxed("captions", Outcome::Text("unused"));
        let (pages, page_calls) = pages(html_page("<html><body><p>Some article text.</p></body></html>"));
        let resolver = Resolver::with_parts(vec![primary], pages);

        let content = resolver.resolve("https://example.com/article").await.unwrap();
        assert_eq!(content.joined("\n"), "Some article text.");
        assert_eq!(content.documents()[0].source_url, "https://example.com/article");
        assert_eq!(page_calls.load(Ordering::SeqCst), 1);
        assert_eq!(primary_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_web_page_empty_body_is_empty_content() {
        let (pages, _) = pages(html_page(""));
        let resolver = Resolver::with_parts(vec![], pages);

        let err = resolver.resolve("https://example.com/blank").await.unwrap_err();
        assert!(matches!(err, Error::EmptyContent(ref u) if u == "https://example.com/blank"));
    }

    #[tokio::test]
    async fn test_web_fetch_error_surfaced() {
        let (pages, _) = pages(None);
        let resolver = Resolver::with_parts(vec![], pages);

        let err = resolver.resolve("https://example.com/private").await.unwrap_err();
        assert!(matches!(err, Error::Http { status, .. } if status == StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_resolve_is_repeatable() {
        let (primary, _) = FakeStrategy::boxed("captions", Outcome::Text("same"));
        let (pages, _) = pages(None);
        let resolver = Resolver::with_parts(vec![primary], pages);

        let first = resolver.resolve("https://youtu.be/abc123").await.unwrap();
        let second = resolver.resolve("https://youtu.be/abc123").await.unwrap();
        assert_eq!(first, second);
    }
}
