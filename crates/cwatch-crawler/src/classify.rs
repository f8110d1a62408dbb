//! Content classification heuristic.
//!
//! Best-effort, not authoritative: platforms do not label short-form content
//! in the APIs we consume, so we look for the community convention (a
//! `#shorts` marker in the title) and fall back to duration.

/// Coarse content class stored on each video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    ShortForm,
    LongForm,
}

impl ContentKind {
    /// The value stored in `videos.content_kind`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::ShortForm => "short",
            ContentKind::LongForm => "video",
        }
    }
}

/// Classifies a content item from its title and duration.
///
/// A `#shorts` / `#short` marker in the title (case-insensitive) wins;
/// otherwise anything at most 60 seconds long counts as short-form. A zero
/// duration means "unknown" (possibly a defaulted parse failure) and never
/// classifies as short on its own.
#[must_use]
pub fn classify(title: &str, duration_secs: i32) -> ContentKind {
    if title.to_lowercase().contains("#short") {
        return ContentKind::ShortForm;
    }
    if duration_secs > 0 && duration_secs <= 60 {
        return ContentKind::ShortForm;
    }
    ContentKind::LongForm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorts_marker_is_case_insensitive() {
        assert_eq!(classify("my clip #shorts", 0), ContentKind::ShortForm);
        assert_eq!(classify("MY CLIP #SHORTS", 0), ContentKind::ShortForm);
        assert_eq!(classify("teaser #Short", 0), ContentKind::ShortForm);
    }

    #[test]
    fn unmarked_title_is_long_form() {
        assert_eq!(classify("A documentary", 0), ContentKind::LongForm);
        assert_eq!(classify("A short film retrospective", 3600), ContentKind::LongForm);
    }

    #[test]
    fn sub_minute_duration_counts_as_short() {
        assert_eq!(classify("clip", 45), ContentKind::ShortForm);
        assert_eq!(classify("clip", 60), ContentKind::ShortForm);
        assert_eq!(classify("clip", 61), ContentKind::LongForm);
    }

    #[test]
    fn unknown_duration_does_not_imply_short() {
        assert_eq!(classify("clip", 0), ContentKind::LongForm);
    }

    #[test]
    fn stored_values_match_schema() {
        assert_eq!(ContentKind::ShortForm.as_str(), "short");
        assert_eq!(ContentKind::LongForm.as_str(), "video");
    }
}
