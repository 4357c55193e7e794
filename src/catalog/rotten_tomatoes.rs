use reqwest::Client;
use tracing::{debug, info};

use crate::catalog::{MovieCatalog, MovieListingParser, Movie};
use crate::config::CatalogConfig;
use crate::emotion::Genre;
use crate::error::{MoodreelError, Result};

/// Scrapes the "movies in theaters" browse page for a genre.
pub struct RottenTomatoesCatalog {
    client: Client,
    base_url: String,
    parser: MovieListingParser,
}

impl RottenTomatoesCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| MoodreelError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            parser: MovieListingParser::new(config.max_results)?,
        })
    }

    pub fn listing_url(&self, genre: Genre) -> String {
        format!("{}{}", self.base_url, genre.slug())
    }
}

#[async_trait::async_trait]
impl MovieCatalog for RottenTomatoesCatalog {
    async fn movies_for_genre(&self, genre: Genre) -> Result<Vec<Movie>> {
        let url = self.listing_url(genre);
        info!("Fetching movie listing: {}", url);

        let response = self.client.get(&url).send().await.map_err(MoodreelError::from)?;
        info!("HTTP Response Code: {}", response.status().as_u16());

        // error pages are parsed too, they just list nothing
        let body = response.text().await.map_err(MoodreelError::from)?;
        let movies = self.parser.parse_listing(&body);
        debug!("Found {} movies for genre {}", movies.len(), genre);

        Ok(movies)
    }
}
