use serde::Serialize;

use crate::{ExtractedContent, UrlKind};

/// Everything produced for one URL
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub url: String,
    pub kind: UrlKind,
    pub title: Option<String>,
    pub content: ExtractedContent,
    pub summary: Option<String>,
}

impl Report {
    pub fn new(url: impl Into<String>, kind: UrlKind, content: ExtractedContent, summary: Option<String>) -> Self {
        let title = content.title().map(|t| t.to_string());
        Self {
            url: url.into(),
            kind,
            title,
            content,
            summary,
        }
    }
}

/// Render as plain text: the summary when there is one, else the extracted text
pub fn render_text(report: &Report) -> String {
    match &report.summary {
        Some(summary) => summary.clone(),
        None => report.content.joined("\n\n"),
    }
}

pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Render every report: text blocks separated by blank lines, or one JSON
/// document (a single object, or an array when there are several reports)
pub fn render_all(reports: &[Report], json: bool) -> serde_json::Result<String> {
    if !json {
        return Ok(reports.iter().map(render_text).collect::<Vec<_>>().join("\n\n"));
    }
    match reports {
        [report] => render_json(report),
        _ => serde_json::to_string_pretty(reports),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    fn sample_content() -> ExtractedContent {
        ExtractedContent::new(
            vec![
                Document::new("Hello world", "https://youtu.be/abc123").with_title(Some("Test Video".to_string())),
                Document::new("This is a test", "https://youtu.be/abc123"),
            ],
            "https://youtu.be/abc123",
        )
        .unwrap()
    }

    #[test]
    fn test_render_text_prefers_summary() {
        let report = Report::new(
            "https://youtu.be/abc123",
            UrlKind::Video,
            sample_content(),
            Some("A short summary.".to_string()),
        );
        assert_eq!(render_text(&report), "A short summary.");
    }

    #[test]
    fn test_render_text_content_only() {
        let report = Report::new("https://youtu.be/abc123", UrlKind::Video, sample_content(), None);
        assert_eq!(render_text(&report), "Hello world\n\nThis is a test");
    }

    #[test]
    fn test_render_json() {
        let report = Report::new(
            "https://youtu.be/abc123",
            UrlKind::Video,
            sample_content(),
            Some("Summary".to_string()),
        );
        let json: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
        assert_eq!(json["url"], "https://youtu.be/abc123");
        assert_eq!(json["kind"], "video");
        assert_eq!(json["title"], "Test Video");
        assert_eq!(json["summary"], "Summary");
        assert_eq!(json["content"][1]["text"], "This is a test");
        assert_eq!(json["content"][0]["source_url"], "https://youtu.be/abc123");
    }

    #[test]
    fn test_render_all_json_array_for_several_reports() {
        let reports = vec![
            Report::new("https://youtu.be/abc123", UrlKind::Video, sample_content(), Some("One".to_string())),
            Report::new("https://youtu.be/abc123", UrlKind::Video, sample_content(), Some("Two".to_string())),
        ];
        let rendered = render_all(&reports, true).unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["summary"], "Two");
    }

    #[test]
    fn test_render_all_single_json_object() {
        let reports = vec![Report::new("https://youtu.be/abc123", UrlKind::Video, sample_content(), None)];
        let json: serde_json::Value = serde_json::from_str(&render_all(&reports, true).unwrap()).unwrap();
        assert_eq!(json["kind"], "video");
        assert!(json["summary"].is_null());
    }

    #[test]
    fn test_render_all_text() {
        let reports = vec![
            Report::new("https://youtu.be/abc123", UrlKind::Video, sample_content(), Some("One".to_string())),
            Report::new("https://youtu.be/abc123", UrlKind::Video, sample_content(), Some("Two".to_string())),
        ];
        assert_eq!(render_all(&reports, false).unwrap(), "One\n\nTwo");
    }
}
