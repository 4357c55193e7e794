use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::catalog::{Movie, NO_IMAGE, NO_RATING};
use crate::config::MAX_MOVIE_RESULTS;
use crate::error::MoodreelError;

/// html parser for genre listing pages
pub struct MovieListingParser {
    title_selector: Selector,
    link_selector: Selector,
    rating_selector: Selector,
    image_selector: Selector,
    max_results: usize,
}

// a movie whose rating may still be further down the page
struct PendingMovie {
    title: String,
    rating: Option<String>,
    image_url: String,
}

impl MovieListingParser {
    // set up a parser with css selectors ready
    pub fn new(max_results: usize) -> Result<Self, MoodreelError> {
        Ok(Self {
            title_selector: Selector::parse("div.article_movie_title")
                .map_err(|e| MoodreelError::ParseError(format!("Invalid title selector: {}", e)))?,
            link_selector: Selector::parse("a")
                .map_err(|e| MoodreelError::ParseError(format!("Invalid link selector: {}", e)))?,
            rating_selector: Selector::parse("span.tMeterScore")
                .map_err(|e| MoodreelError::ParseError(format!("Invalid rating selector: {}", e)))?,
            image_selector: Selector::parse("img")
                .map_err(|e| MoodreelError::ParseError(format!("Invalid image selector: {}", e)))?,
            max_results: max_results.clamp(1, MAX_MOVIE_RESULTS),
        })
    }

    /// Extracts at most `max_results` movies, in page order.
    ///
    /// A movie's rating is the first `span.tMeterScore` after its title block
    /// in document order, so the score may sit outside the block itself.
    pub fn parse_listing(&self, html: &str) -> Vec<Movie> {
        let document = Html::parse_document(html);
        let mut pending: Vec<PendingMovie> = Vec::new();

        for node in document.root_element().descendants() {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };

            if self.rating_selector.matches(&element) {
                let rating = trimmed_text(&element);
                for movie in pending.iter_mut().filter(|m| m.rating.is_none()) {
                    movie.rating = Some(rating.clone());
                }
            }

            if pending.len() < self.max_results && self.title_selector.matches(&element) {
                pending.push(self.start_movie(&element));
            }

            if pending.len() == self.max_results && pending.iter().all(|m| m.rating.is_some()) {
                break;
            }
        }

        debug!("Parsed {} movies from listing", pending.len());
        pending
            .into_iter()
            .map(|m| Movie {
                title: m.title,
                rating: m.rating.filter(|r| !r.is_empty()).unwrap_or_else(|| NO_RATING.to_string()),
                image_url: m.image_url,
            })
            .collect()
    }

    // title and poster live inside the title block
    fn start_movie(&self, element: &ElementRef) -> PendingMovie {
        let title = element
            .select(&self.link_selector)
            .next()
            .map(|link| trimmed_text(&link))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| trimmed_text(element));

        let image_url = element
            .select(&self.image_selector)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| src.trim().to_string())
            .filter(|src| !src.is_empty())
            .unwrap_or_else(|| NO_IMAGE.to_string());

        PendingMovie {
            title,
            rating: None,
            image_url,
        }
    }
}

impl Default for MovieListingParser {
    fn default() -> Self {
        Self::new(MAX_MOVIE_RESULTS).expect("Failed to create default MovieListingParser")
    }
}

// element text with surrounding whitespace removed
fn trimmed_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
