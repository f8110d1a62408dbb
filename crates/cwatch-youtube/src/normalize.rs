//! Translation from Data API payloads to the normalized platform types.
//!
//! Malformed fields are recovered locally: a duration or counter that does
//! not parse becomes 0 with a warning. A single bad field never aborts a
//! crawl run.

use cwatch_platform::{ContentItem, ContentStats, CreatorProfile};

use crate::types::{Channel, PlaylistItem, VideoResource};

pub(crate) fn channel_to_profile(external_id: &str, channel: &Channel) -> CreatorProfile {
    let title = channel.snippet.title.clone();
    CreatorProfile {
        external_id: external_id.to_owned(),
        handle: channel.snippet.custom_url.clone().or_else(|| title.clone()),
        display_name: title,
    }
}

pub(crate) fn playlist_item_to_content(item: PlaylistItem) -> ContentItem {
    ContentItem {
        external_id: item.content_details.video_id,
        title: item.snippet.title,
        published_at: item.content_details.video_published_at,
    }
}

pub(crate) fn video_to_stats(video: VideoResource) -> ContentStats {
    let duration_secs = video
        .content_details
        .as_ref()
        .and_then(|cd| cd.duration.as_deref())
        .map_or(0, |raw| duration_secs_or_zero(&video.id, raw));

    ContentStats {
        duration_secs,
        title: video.snippet.title,
        description: video.snippet.description,
        published_at: video.snippet.published_at,
        views: parse_count(video.statistics.view_count.as_deref()),
        likes: parse_count(video.statistics.like_count.as_deref()),
        comments: parse_count(video.statistics.comment_count.as_deref()),
        // The Data API does not expose share counts.
        shares: 0,
        external_id: video.id,
    }
}

fn duration_secs_or_zero(video_id: &str, raw: &str) -> i32 {
    match parse_iso8601_duration(raw) {
        Some(secs) => i32::try_from(secs).unwrap_or(i32::MAX),
        None => {
            tracing::warn!(video_id, raw, "unparseable video duration, defaulting to 0");
            0
        }
    }
}

/// Statistics counters are decimal strings; absent counters (e.g. likes
/// hidden by the creator) count as 0.
fn parse_count(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.parse::<i64>().ok()).unwrap_or(0)
}

/// Parses an ISO-8601 duration of the form the Data API emits
/// (`PT#H#M#S`, optionally with a day component like `P1DT2H`).
///
/// Returns `None` for anything that does not fit that shape. Year/month
/// designators are not supported — YouTube never emits them.
fn parse_iso8601_duration(raw: &str) -> Option<i64> {
    let rest = raw.strip_prefix('P')?;
    let mut secs: i64 = 0;
    let mut in_time = false;
    let mut digits = String::new();

    for ch in rest.chars() {
        match ch {
            'T' => {
                if in_time || !digits.is_empty() {
                    return None;
                }
                in_time = true;
            }
            '0'..='9' => digits.push(ch),
            designator => {
                let value: i64 = digits.parse().ok()?;
                digits.clear();
                let factor = match (designator, in_time) {
                    ('D', false) => 86_400,
                    ('H', true) => 3_600,
                    ('M', true) => 60,
                    ('S', true) => 1,
                    _ => return None,
                };
                secs = secs.checked_add(value.checked_mul(factor)?)?;
            }
        }
    }

    // Trailing digits without a designator, or a bare "P"/"PT" with no
    // components at all, are malformed.
    if !digits.is_empty() || rest.is_empty() || rest == "T" {
        return None;
    }
    Some(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_durations() {
        assert_eq!(parse_iso8601_duration("PT4M13S"), Some(253));
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3_723));
        assert_eq!(parse_iso8601_duration("PT58S"), Some(58));
        assert_eq!(parse_iso8601_duration("PT0S"), Some(0));
        assert_eq!(parse_iso8601_duration("P1DT2H"), Some(93_600));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(parse_iso8601_duration(""), None);
        assert_eq!(parse_iso8601_duration("P"), None);
        assert_eq!(parse_iso8601_duration("PT"), None);
        assert_eq!(parse_iso8601_duration("4M13S"), None);
        assert_eq!(parse_iso8601_duration("PT4X"), None);
        assert_eq!(parse_iso8601_duration("PT12"), None);
        // Minutes outside the time section are months; unsupported.
        assert_eq!(parse_iso8601_duration("P3M"), None);
    }

    #[test]
    fn counts_default_to_zero() {
        assert_eq!(parse_count(None), 0);
        assert_eq!(parse_count(Some("not-a-number")), 0);
        assert_eq!(parse_count(Some("12345")), 12_345);
    }

    #[test]
    fn malformed_duration_defaults_to_zero() {
        assert_eq!(duration_secs_or_zero("vid-1", "banana"), 0);
        assert_eq!(duration_secs_or_zero("vid-1", "PT2M"), 120);
    }
}
