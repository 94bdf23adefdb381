use url::{Host, Url};

use crate::error::{Error, Result};

const MISSING_INPUT: &str = "Please enter a Groq API key and a URL.";

/// The credential must be present and non-blank
pub fn api_key(key: Option<&str>) -> Result<String> {
    match key.map(str::trim) {
        Some(k) if !k.is_empty() => Ok(k.to_string()),
        _ => Err(Error::Validation(MISSING_INPUT.to_string())),
    }
}

/// An absolute http(s) URL whose host is an IP address, `localhost`, or a dotted domain
pub fn url(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::Validation(MISSING_INPUT.to_string()));
    }

    let invalid = |why: &str| Error::Validation(format!("Please enter a valid URL: {input} ({why})"));

    let parsed = Url::parse(input).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    match parsed.host() {
        Some(Host::Ipv4(_) | Host::Ipv6(_)) => {}
        Some(Host::Domain(domain)) => {
            let labels: Vec<&str> = domain.trim_end_matches('.').split('.').collect();
            let dotted = labels.len() >= 2 && labels.iter().all(|l| !l.is_empty());
            if !dotted && domain != "localhost" {
                return Err(invalid("host is not a domain name"));
            }
        }
        None => return Err(invalid("missing host")),
    }

    Ok(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key() {
        assert_eq!(api_key(Some(" gsk_abc ")).unwrap(), "gsk_abc");
        assert!(matches!(api_key(Some("   ")), Err(Error::Validation(_))));
        assert!(matches!(api_key(None), Err(Error::Validation(_))));
    }

    #[test]
    fn test_valid_urls() {
        assert_eq!(url(" https://youtu.be/abc123 ").unwrap(), "https://youtu.be/abc123");
        assert!(url("https://www.youtube.com/watch?v=abc123&t=5").is_ok());
        assert!(url("http://example.com/path?q=1").is_ok());
        assert!(url("http://127.0.0.1:8080/").is_ok());
        assert!(url("http://localhost:3000/page").is_ok());
    }

    #[test]
    fn test_blank_url() {
        let err = url("  ").unwrap_err();
        assert_eq!(err.to_string(), "Please enter a Groq API key and a URL.");
    }

    #[test]
    fn test_malformed_urls() {
        for bad in [
            "not a url",
            "example.com",
            "ftp://example.com/file",
            "https://",
            "https://intranet/page",
            "mailto:someone@example.com",
            "https://exa mple.com",
        ] {
            let err = url(bad).unwrap_err();
            assert!(
                matches!(err, Error::Validation(ref m) if m.starts_with("Please enter a valid URL")),
                "{bad} should be rejected"
            );
        }
    }
}
