//! Clip id derivation from playback URLs.

/// Derives a clip id from the last path segment of a playback URL.
///
/// Works for both `https://clips.twitch.tv/<slug>` and
/// `https://www.twitch.tv/<channel>/clip/<slug>`. Returns `None` if the URL
/// cannot be parsed or has an empty path.
pub fn clip_id_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    let id = sanitize_clip_id(segment);
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Restricts an id to characters that are safe inside a file name.
///
/// Twitch slugs are ASCII letters, digits, `-` and `_`; anything else is
/// replaced with `_` so ids always round-trip through artifact names.
pub fn sanitize_clip_id(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clips_subdomain() {
        assert_eq!(
            clip_id_from_url("https://clips.twitch.tv/AwkwardSalamander-x1Y2").as_deref(),
            Some("AwkwardSalamander-x1Y2")
        );
    }

    #[test]
    fn channel_clip_path_with_query() {
        assert_eq!(
            clip_id_from_url("https://www.twitch.tv/chan/clip/Slug_9?filter=clips").as_deref(),
            Some("Slug_9")
        );
    }

    #[test]
    fn root_or_garbage() {
        assert_eq!(clip_id_from_url("https://clips.twitch.tv/"), None);
        assert_eq!(clip_id_from_url("not a url"), None);
    }

    #[test]
    fn sanitize_replaces_unsafe_chars() {
        assert_eq!(sanitize_clip_id("a/b.c"), "a_b_c");
        assert_eq!(sanitize_clip_id("..x.."), "x");
    }
}
