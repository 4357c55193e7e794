use serde::{Deserialize, Serialize};
use std::fmt;

use crate::emotion::Emotion;

/// Movie genres used as listing-page targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Drama,
    Musical,
    Family,
    Thriller,
    Sport,
    FilmNoir,
}

impl Genre {
    /// Path segment of the listing page for this genre.
    pub fn slug(&self) -> &'static str {
        match self {
            Genre::Drama => "drama",
            Genre::Musical => "musical",
            Genre::Family => "family",
            Genre::Thriller => "thriller",
            Genre::Sport => "sport",
            Genre::FilmNoir => "film_noir",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Genre::Drama => "Drama",
            Genre::Musical => "Musical",
            Genre::Family => "Family",
            Genre::Thriller => "Thriller",
            Genre::Sport => "Sport",
            Genre::FilmNoir => "Film Noir",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl From<Emotion> for Genre {
    fn from(emotion: Emotion) -> Self {
        match emotion {
            Emotion::Sad => Genre::Drama,
            Emotion::Disgust => Genre::Musical,
            Emotion::Angry => Genre::Family,
            Emotion::Neutral => Genre::Thriller,
            Emotion::Fear => Genre::Sport,
            Emotion::Happy => Genre::Thriller,
            Emotion::Surprised => Genre::FilmNoir,
        }
    }
}

/// Genre to browse for a classifier label; `None` for labels outside the
/// emotion vocabulary.
pub fn genre_for_emotion(label: &str) -> Option<Genre> {
    Emotion::from_label(label).map(Genre::from)
}
