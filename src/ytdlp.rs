use std::collections::HashMap;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::http::check_status;
use crate::resolve::TranscriptStrategy;
use crate::Document;

const YT_DLP: &str = "yt-dlp";

/// Caption formats we can read, most preferred first
const PREFERRED_FORMATS: [&str; 2] = ["json3", "vtt"];

/// stderr fragments yt-dlp prints for videos that exist but cannot be watched here
const RESTRICTION_MARKERS: [&str; 6] = [
    "not available in your country",
    "geo restriction",
    "sign in to confirm your age",
    "age-restricted",
    "private video",
    "members-only",
];

static VTT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

#[derive(Debug, Deserialize)]
struct VideoInfo {
    title: Option<String>,
    #[serde(default)]
    subtitles: HashMap<String, Vec<SubtitleFormat>>,
    #[serde(default)]
    automatic_captions: HashMap<String, Vec<SubtitleFormat>>,
}

#[derive(Debug, Clone, Deserialize)]
struct SubtitleFormat {
    ext: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Loads video metadata and caption tracks through yt-dlp, constrained to one
/// caption language.
pub struct YtDlpLoader {
    client: Client,
    lang: String,
    timeout: Duration,
}

impl YtDlpLoader {
    pub fn new(client: Client, lang: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            lang: lang.into(),
            timeout,
        }
    }

    async fn video_info(&self, video_id: &str) -> Result<VideoInfo> {
        let url = format!("https://www.youtube.com/watch?v={video_id}");
        debug!("Fetching video info via yt-dlp: {url}");

        let mut cmd = Command::new(YT_DLP);
        cmd.args([
            "--dump-single-json",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
            url.as_str(),
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ToolNotFound(YT_DLP));
            }
            Ok(Err(e)) => return Err(Error::Loader(format!("failed to run yt-dlp: {e}"))),
            Err(_) => {
                return Err(Error::Loader(format!(
                    "yt-dlp did not finish within {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr, output.status));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| Error::Parse(format!("yt-dlp metadata: {e}")))
    }
}

#[async_trait]
impl TranscriptStrategy for YtDlpLoader {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch(&self, video_id: &str, source_url: &str) -> Result<Vec<Document>> {
        let info = self.video_info(video_id).await?;

        let Some(track) = select_track(&info, &self.lang) else {
            return Err(Error::TranscriptUnavailable(format!(
                "no '{}' captions for video {video_id}",
                self.lang
            )));
        };
        debug!("Using {} caption track: {}", track.ext, track.url);

        let body = check_status(self.client.get(&track.url).send().await?)?
            .text()
            .await?;

        let text = match track.ext.as_str() {
            "json3" => json3_to_text(&body)?,
            _ => vtt_to_text(&body),
        };

        Ok(vec![Document::new(text, source_url).with_title(info.title)])
    }
}

fn classify_failure(stderr: &str, status: std::process::ExitStatus) -> Error {
    let lowered = stderr.to_lowercase();
    let last_line = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim()
        .to_string();

    if RESTRICTION_MARKERS.iter().any(|m| lowered.contains(m)) {
        return Error::Restricted(last_line);
    }
    if last_line.is_empty() {
        Error::Loader(format!("yt-dlp exited with status {status}"))
    } else {
        Error::Loader(last_line)
    }
}

/// Manual subtitles win over automatic captions; within each, an exact
/// language match wins over a regional variant (`en` vs `en-US`). A language
/// entry offering no readable format does not stop the search.
fn select_track<'a>(info: &'a VideoInfo, lang: &str) -> Option<&'a SubtitleFormat> {
    [&info.subtitles, &info.automatic_captions]
        .into_iter()
        .flat_map(|tracks| language_candidates(tracks, lang))
        .find_map(|formats| {
            PREFERRED_FORMATS
                .iter()
                .find_map(|ext| formats.iter().find(|f| f.ext == *ext))
        })
}

/// Track lists for `lang`: the exact key first, then regional variants in key order
fn language_candidates<'a>(tracks: &'a HashMap<String, Vec<SubtitleFormat>>, lang: &str) -> Vec<&'a Vec<SubtitleFormat>> {
    let prefix = format!("{lang}-");
    let mut regional: Vec<(&String, &Vec<SubtitleFormat>)> =
        tracks.iter().filter(|(k, _)| k.starts_with(&prefix)).collect();
    regional.sort_by(|a, b| a.0.cmp(b.0));

    tracks
        .get(lang)
        .into_iter()
        .chain(regional.into_iter().map(|(_, v)| v))
        .collect()
}

fn json3_to_text(body: &str) -> Result<String> {
    let parsed: Json3 = serde_json::from_str(body).map_err(|e| Error::Parse(format!("json3 captions: {e}")))?;
    Ok(parsed
        .events
        .iter()
        .map(|ev| ev.segs.iter().map(|s| s.utf8.as_str()).collect::<String>())
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" "))
}

fn vtt_to_text(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_note = false;

    for line in vtt.lines() {
        let l = line.trim();
        if l.is_empty() {
            in_note = false;
            continue;
        }
        if in_note || l.starts_with("WEBVTT") || l.starts_with("Kind:") || l.starts_with("Language:") {
            continue;
        }
        if l.starts_with("NOTE") || l.starts_with("STYLE") {
            in_note = true;
            continue;
        }
        // timing line or numeric cue id
        if l.contains("-->") || l.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let stripped = VTT_TAG_RE.replace_all(l, "");
        let decoded = html_escape::decode_html_entities(&stripped);
        let cleaned = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
        // auto-generated captions repeat the previous line as the next cue rolls in
        if cleaned.is_empty() || lines.last() == Some(&cleaned) {
            continue;
        }
        lines.push(cleaned);
    }

    lines.join(" ")
}
