/// Repeat mode
use serde::{Deserialize, Serialize};

/// Repeat mode for the queue
///
/// Serialized as `"none"`, `"one"`, `"all"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop (or auto-advance) at the end of a track
    #[default]
    #[serde(rename = "none")]
    Off,

    /// Loop the current track
    One,

    /// Loop the whole queue
    All,
}

impl RepeatMode {
    /// Next mode in the strict cycle `none -> one -> all -> none`
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::One,
            Self::One => Self::All,
            Self::All => Self::Off,
        }
    }

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "none",
            Self::One => "one",
            Self::All => "all",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" | "off" => Some(Self::Off),
            "one" => Some(Self::One),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_visits_three_states() {
        let mut mode = RepeatMode::default();
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(mode);
            mode = mode.cycle();
        }
        assert_eq!(
            seen,
            vec![
                RepeatMode::Off,
                RepeatMode::One,
                RepeatMode::All,
                RepeatMode::Off,
                RepeatMode::One,
                RepeatMode::All,
            ]
        );
    }

    #[test]
    fn string_round_trip() {
        for mode in [RepeatMode::Off, RepeatMode::One, RepeatMode::All] {
            assert_eq!(RepeatMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(RepeatMode::from_str("sometimes"), None);
        assert_eq!(
            serde_json::to_value(RepeatMode::Off).unwrap(),
            serde_json::json!("none")
        );
    }
}
