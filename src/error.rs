use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Input errors, raised before any network activity
    #[error("{0}")]
    Validation(String),

    #[error("could not extract video ID from: {0}")]
    IdentifierExtraction(String),

    // Extraction errors
    #[error("transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Http { status: StatusCode, url: String },

    #[error("video is restricted: {0}")]
    Restricted(String),

    #[error("could not fetch content: {0}")]
    Fetch(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0} not found")]
    ToolNotFound(&'static str),

    #[error("caption loader failed: {0}")]
    Loader(String),

    #[error("Could not extract content from the provided URL: {0}")]
    EmptyContent(String),

    // Hosted model errors
    #[error("summarization failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Summarization { status: Option<StatusCode>, message: String },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Error::Parse(err.to_string());
        }
        match (err.status(), err.url()) {
            (Some(status), Some(url)) => Error::Http {
                status,
                url: url.to_string(),
            },
            _ => Error::Network(err),
        }
    }
}

impl Error {
    /// A short suggestion for the user, shown under the error message.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::IdentifierExtraction(_) => Some(
                "supported video URL shapes:\n  https://www.youtube.com/watch?v=ID\n  https://youtu.be/ID\n  https://www.youtube.com/shorts/ID\n  https://www.youtube.com/embed/ID",
            ),
            Error::Restricted(_) => Some("the video may be region-locked, age-restricted, private or require sign-in"),
            Error::Http { status, .. } => match status.as_u16() {
                401 | 403 => Some("the site refused the request; it may be blocking automated clients"),
                404 | 410 => Some("the page does not exist; check the URL"),
                429 => Some("the site is rate limiting requests; try again later"),
                _ => None,
            },
            Error::Network(_) => Some("check your network connection or raise --timeout"),
            Error::TranscriptUnavailable(_) => Some("the video has no captions in the requested language; try --lang"),
            Error::ToolNotFound(_) => Some("install yt-dlp to enable the caption loader fallback:\n  pip install yt-dlp\n  or: brew install yt-dlp"),
            Error::Fetch(_) => Some("only HTML and plain-text pages can be summarized"),
            Error::EmptyContent(_) => Some("the page may render its content with JavaScript or require a login"),
            Error::Summarization { status, .. } => match status.map(|s| s.as_u16()) {
                Some(401) | Some(403) => Some("check your Groq API key"),
                Some(429) => Some("the Groq quota or rate limit was exceeded; try again later"),
                Some(404) => Some("the model may not exist; check --model"),
                _ => None,
            },
            Error::Validation(_) | Error::Parse(_) | Error::Loader(_) => None,
        }
    }

    /// True for errors that mean the platform restricts access to the content.
    pub fn is_restricted(&self) -> bool {
        matches!(self, Error::Restricted(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
