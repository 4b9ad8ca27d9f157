//! Video link helpers for lesson and reading videos.
//!
//! Admins paste whatever link their video host gives them. Players need the
//! embed form, so links are normalized here.

use url::Url;

/// Convert a YouTube or Vimeo link to its embeddable form.
///
/// Unknown hosts and unparseable input are returned unchanged.
pub fn embed_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    if let Some(id) = youtube_id(raw) {
        return format!("https://www.youtube.com/embed/{}", id);
    }

    if let Some(id) = vimeo_id(raw) {
        return format!("https://player.vimeo.com/video/{}", id);
    }

    raw.to_string()
}

/// Extract the video id from a YouTube watch, short, or embed link.
pub fn youtube_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let id = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                Some("embed") | Some("shorts") => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    is_video_id(&id).then_some(id)
}

fn vimeo_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?.trim_start_matches("www.");
    if host != "vimeo.com" && host != "player.vimeo.com" {
        return None;
    }
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .find(|s| s.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

fn is_video_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_links() {
        assert_eq!(
            embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
        assert_eq!(
            embed_url("https://youtu.be/dQw4w9WgXcQ?si=abc"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
        assert_eq!(
            embed_url("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_vimeo_links() {
        assert_eq!(embed_url("https://vimeo.com/123456789"), "https://player.vimeo.com/video/123456789");
        assert_eq!(
            embed_url("https://player.vimeo.com/video/123456789?h=ab"),
            "https://player.vimeo.com/video/123456789"
        );
    }

    #[test]
    fn test_other_links_unchanged() {
        assert_eq!(embed_url(""), "");
        assert_eq!(embed_url("https://example.com/video.mp4"), "https://example.com/video.mp4");
        assert_eq!(embed_url("not a url"), "not a url");
        assert_eq!(youtube_id("https://www.youtube.com/channel/xyz"), None);
    }
}
