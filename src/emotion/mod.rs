pub mod genre;
pub mod vote;

pub use genre::*;
pub use vote::*;

use std::fmt;

/// The emotions the classifier can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprised,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprised,
        Emotion::Neutral,
    ];

    // parse a classifier label, case-insensitive
    pub fn from_label(label: &str) -> Option<Emotion> {
        match normalize_label(label).as_str() {
            "angry" => Some(Emotion::Angry),
            "disgust" => Some(Emotion::Disgust),
            "fear" => Some(Emotion::Fear),
            "happy" => Some(Emotion::Happy),
            "sad" => Some(Emotion::Sad),
            // deepface says "surprise"
            "surprise" | "surprised" => Some(Emotion::Surprised),
            "neutral" => Some(Emotion::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprised => "surprised",
            Emotion::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-cases and trims a raw label so samples compare consistently.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
