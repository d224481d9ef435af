/// Track types
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-specific content identifier
///
/// Stable and unique per piece of content on the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A playable piece of long-form audio
///
/// Sourced from search results or persisted history. Never mutated after
/// construction; the builder methods consume and return a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Content identifier on the hosting platform
    pub id: TrackId,

    /// Display title
    pub title: String,

    /// Author / channel label
    #[serde(default)]
    pub author: String,

    /// Thumbnail URL (used as lock-screen artwork)
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Duration in seconds, if known before the embed reports it
    #[serde(default)]
    pub duration: Option<f64>,
}

impl Track {
    /// Create a track with only an id and title
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: String::new(),
            thumbnail: None,
            duration: None,
        }
    }

    /// Set the author / channel label
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the thumbnail URL
    #[must_use]
    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    /// Set the duration in seconds (non-positive or non-finite values mean unknown)
    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = (seconds.is_finite() && seconds > 0.0).then_some(seconds);
        self
    }

    /// Duration in seconds, or 0 when unknown
    pub fn duration_or_zero(&self) -> f64 {
        self.duration.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let track = Track::new("abc123", "Podcast Episode 12")
            .with_author("Some Channel")
            .with_thumbnail("https://img.example/abc123.jpg")
            .with_duration(3600.0);

        assert_eq!(track.id, TrackId::new("abc123"));
        assert_eq!(track.author, "Some Channel");
        assert_eq!(track.thumbnail.as_deref(), Some("https://img.example/abc123.jpg"));
        assert_eq!(track.duration, Some(3600.0));
    }

    #[test]
    fn unknown_duration_is_none() {
        assert_eq!(Track::new("a", "A").with_duration(0.0).duration, None);
        assert_eq!(Track::new("a", "A").with_duration(f64::NAN).duration, None);
        assert_eq!(Track::new("a", "A").duration_or_zero(), 0.0);
    }

    #[test]
    fn serializes_camel_case_and_tolerates_missing_fields() {
        let json = serde_json::json!({ "id": "xyz", "title": "Lecture" });
        let track: Track = serde_json::from_value(json).unwrap();
        assert_eq!(track.id.as_str(), "xyz");
        assert!(track.thumbnail.is_none());

        let back = serde_json::to_value(&track).unwrap();
        assert_eq!(back["id"], "xyz");
        assert!(back.get("thumbnail").is_some());
    }
}
