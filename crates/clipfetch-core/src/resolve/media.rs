//! Media response matching.

use crate::config::BrowserSettings;

/// A network response seen by a browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedResponse {
    pub url: String,
    /// MIME type reported for the response (e.g. `video/mp4`).
    pub content_type: String,
}

/// Decides which observed responses and DOM sources count as the clip's media.
#[derive(Debug, Clone)]
pub struct MediaMatcher {
    content_types: Vec<String>,
    extensions: Vec<String>,
}

impl MediaMatcher {
    pub fn new(content_types: Vec<String>, extensions: Vec<String>) -> Self {
        Self {
            content_types: content_types.into_iter().map(|s| s.to_ascii_lowercase()).collect(),
            extensions: extensions.into_iter().map(|s| s.to_ascii_lowercase()).collect(),
        }
    }

    pub fn from_settings(settings: &BrowserSettings) -> Self {
        Self::new(
            settings.media_content_types.clone(),
            settings.media_extensions.clone(),
        )
    }

    /// True if the response is a media stream whose URL path looks like a media file.
    pub fn matches_response(&self, resp: &ObservedResponse) -> bool {
        let ct = resp.content_type.trim().to_ascii_lowercase();
        if !self.content_types.iter().any(|p| ct.starts_with(p.as_str())) {
            return false;
        }
        self.path_matches(&resp.url)
    }

    fn path_matches(&self, raw: &str) -> bool {
        let Ok(parsed) = url::Url::parse(raw) else {
            return false;
        };
        let path = parsed.path().to_ascii_lowercase();
        self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    /// First matching response in observation order.
    pub fn first_match(&self, responses: &[ObservedResponse]) -> Option<String> {
        responses
            .iter()
            .find(|r| self.matches_response(r))
            .map(|r| r.url.clone())
    }

    /// Accepts a `<video>` source read from the DOM if it is a fetchable
    /// http(s) URL. `blob:` (MSE) and `data:` sources are rejected.
    pub fn accept_dom_source(&self, src: &str) -> Option<String> {
        let src = src.trim();
        let parsed = url::Url::parse(src).ok()?;
        match parsed.scheme() {
            "http" | "https" => Some(src.to_string()),
            _ => None,
        }
    }
}

impl Default for MediaMatcher {
    fn default() -> Self {
        Self::from_settings(&BrowserSettings::default())
    }
}
