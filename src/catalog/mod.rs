pub mod listing_parser;
pub mod movie;
pub mod rotten_tomatoes;

pub use listing_parser::MovieListingParser;
pub use movie::*;
pub use rotten_tomatoes::RottenTomatoesCatalog;

use tracing::info;

use crate::emotion::{genre_for_emotion, Genre};
use crate::error::Result;

/// Source of movie listings per genre.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn movies_for_genre(&self, genre: Genre) -> Result<Vec<Movie>>;
}

/// Movies themed for an emotion label. Labels without a genre yield an
/// empty list without touching the network.
pub async fn recommend_movies(catalog: &dyn MovieCatalog, emotion: &str) -> Result<Vec<Movie>> {
    match genre_for_emotion(emotion) {
        Some(genre) => {
            info!("Fetching movies for emotion: {}, genre: {}", emotion, genre);
            catalog.movies_for_genre(genre).await
        }
        None => {
            info!("No genre mapped for emotion '{}'", emotion);
            Ok(Vec::new())
        }
    }
}
