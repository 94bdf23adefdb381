use std::sync::LazyLock;

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::http::check_status;
use crate::resolve::TranscriptStrategy;
use crate::Document;

const INNERTUBE_CLIENT_VERSION: &str = "2.20241126.01.00";

static API_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).expect("valid regex"));
static API_KEY_ALT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).expect("valid regex"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InnerTubePlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
}

/// A single timed caption fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Fetches YouTube's built-in captions via the InnerTube API.
pub struct CaptionTranscript {
    client: Client,
    lang: String,
}

impl CaptionTranscript {
    pub fn new(client: Client, lang: impl Into<String>) -> Self {
        Self {
            client,
            lang: lang.into(),
        }
    }

    async fn fetch_captions(&self, video_id: &str) -> Result<(Option<String>, Vec<Caption>)> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        debug!("Fetching watch page: {watch_url}");

        let page_html = check_status(self.client.get(&watch_url).send().await?)?
            .text()
            .await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": self.lang,
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": INNERTUBE_CLIENT_VERSION
                }
            },
            "videoId": video_id
        });

        let resp: InnerTubePlayerResponse = check_status(self.client.post(&player_url).json(&body).send().await?)?
            .json()
            .await?;

        check_playability(resp.playability_status.as_ref(), video_id)?;

        let title = resp.video_details.and_then(|vd| vd.title);

        let tracks = resp
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default();

        // Find the requested language track, or fall back to the first available
        let Some(track) = tracks
            .iter()
            .find(|t| t.language_code == self.lang)
            .or_else(|| tracks.first())
        else {
            return Err(Error::TranscriptUnavailable(format!(
                "no captions available for video {video_id}"
            )));
        };
        debug!("Using caption track: lang={}", track.language_code);

        // Step 3: Fetch the caption XML
        let caption_xml = check_status(self.client.get(&track.base_url).send().await?)?
            .text()
            .await?;

        let captions = parse_caption_xml(&caption_xml)?;
        Ok((title, captions))
    }
}

#[async_trait]
impl TranscriptStrategy for CaptionTranscript {
    fn name(&self) -> &'static str {
        "captions"
    }

    async fn fetch(&self, video_id: &str, source_url: &str) -> Result<Vec<Document>> {
        let (title, captions) = self.fetch_captions(video_id).await?;
        if captions.is_empty() {
            return Err(Error::TranscriptUnavailable(format!(
                "caption track for video {video_id} is empty"
            )));
        }
        Ok(vec![Document::new(join_captions(captions), source_url).with_title(title)])
    }
}

fn check_playability(status: Option<&PlayabilityStatus>, video_id: &str) -> Result<()> {
    let Some(status) = status else {
        return Ok(());
    };
    let reason = status
        .reason
        .clone()
        .unwrap_or_else(|| format!("video {video_id} is not playable"));
    match status.status.as_deref() {
        Some("LOGIN_REQUIRED" | "UNPLAYABLE" | "AGE_CHECK_REQUIRED" | "CONTENT_CHECK_REQUIRED") => {
            Err(Error::Restricted(reason))
        }
        Some("ERROR") => Err(Error::TranscriptUnavailable(reason)),
        _ => Ok(()),
    }
}

/// Space-join caption text in chronological order
pub fn join_captions(mut captions: Vec<Caption>) -> String {
    captions.sort_by(|a, b| a.start.total_cmp(&b.start));
    captions
        .iter()
        .map(|c| c.text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_api_key(html: &str) -> Result<String> {
    // Newer pages only carry the camel-case form
    [&API_KEY_RE, &API_KEY_ALT_RE]
        .into_iter()
        .find_map(|re| re.captures(html).map(|caps| caps[1].to_string()))
        .ok_or_else(|| Error::Parse("could not extract InnerTube API key from watch page".to_string()))
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Caption>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut captions = Vec::new();
    let mut current: Option<(f64, f64)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => {
                            start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        b"dur" => {
                            dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        _ => {}
                    }
                }
                current = start.map(|s| (s, dur.unwrap_or(0.0)));
            }
            Ok(Event::Text(ref e)) => {
                if let Some((start, duration)) = current.take() {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).trim().to_string();
                    if !text.is_empty() {
                        captions.push(Caption { text, start, duration });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("error parsing caption XML: {e}"))),
            _ => {}
        }
    }

    Ok(captions)
}
