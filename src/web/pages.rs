use std::fmt::Write;

use crate::analysis::AnalysisOutcome;
use crate::catalog::Movie;

const PAGE_STYLE: &str = r#"
    body { font-family: sans-serif; background: #14161a; color: #eee; margin: 0 auto; max-width: 960px; padding: 2rem; }
    h1 span { color: #fa320a; text-transform: capitalize; }
    .counts li { display: inline-block; margin-right: 1rem; color: #aaa; }
    .movies { display: grid; grid-template-columns: repeat(auto-fill, minmax(160px, 1fr)); gap: 1rem; }
    .movie { background: #1f2228; border-radius: 6px; padding: 0.6rem; }
    .movie img, .movie .poster { width: 100%; height: 220px; object-fit: cover; border-radius: 4px; }
    .movie .poster { display: flex; align-items: center; justify-content: center; background: #2b2f37; color: #777; }
    .movie h3 { font-size: 1rem; margin: 0.5rem 0 0.2rem; }
    .movie .rating { color: #fa320a; }
    a { color: #fa320a; }
"#;

// escape text for html bodies and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  <title>{}</title>\n  <style>{}</style>\n</head>\n<body>\n{}\n  <p><a href=\"/\">Try again</a></p>\n</body>\n</html>\n",
        escape_html(title),
        PAGE_STYLE,
        body
    )
}

/// Result page: the dominant emotion, per-label counts and the movie cards.
pub fn render_result(outcome: &AnalysisOutcome) -> String {
    let mut body = String::new();

    let Some(emotion) = &outcome.dominant_emotion else {
        body.push_str("  <h1>No face detected</h1>\n");
        body.push_str("  <p>We could not read an emotion. Make sure your face is visible and well lit.</p>\n");
        return layout("Moodreel - no face detected", &body);
    };

    let _ = writeln!(body, "  <h1>You look <span>{}</span></h1>", escape_html(emotion));

    body.push_str("  <ul class=\"counts\">\n");
    for (label, count) in outcome.tally.entries() {
        let _ = writeln!(body, "    <li>{}: {}</li>", escape_html(label), count);
    }
    body.push_str("  </ul>\n");

    match outcome.genre {
        Some(genre) => {
            let _ = writeln!(body, "  <h2>{} movies for your mood</h2>", genre.display_name());
        }
        None => body.push_str("  <h2>No genre matches this mood</h2>\n"),
    }

    if outcome.movies.is_empty() {
        body.push_str("  <p>No movies found right now.</p>\n");
    } else {
        body.push_str("  <div class=\"movies\">\n");
        for movie in &outcome.movies {
            body.push_str(&render_movie(movie));
        }
        body.push_str("  </div>\n");
    }

    layout(&format!("Moodreel - {}", emotion), &body)
}

fn render_movie(movie: &Movie) -> String {
    let poster = if movie.has_image() {
        format!(
            "<img src=\"{}\" alt=\"{}\">",
            escape_html(&movie.image_url),
            escape_html(&movie.title)
        )
    } else {
        format!("<div class=\"poster\">{}</div>", escape_html(&movie.image_url))
    };

    format!(
        "    <div class=\"movie\">\n      {}\n      <h3>{}</h3>\n      <div class=\"rating\">{}</div>\n    </div>\n",
        poster,
        escape_html(&movie.title),
        escape_html(&movie.rating)
    )
}

/// Generic failure page.
pub fn render_error() -> String {
    layout(
        "Moodreel - error",
        "  <h1>Something went wrong</h1>\n  <p>The emotion analysis could not be completed.</p>\n",
    )
}
