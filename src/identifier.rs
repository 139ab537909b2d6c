//! Identifier (page URL) normalization
//!
//! Library identifiers are game page URLs of the form
//! `https://<creator>.itch.io/<slug>`. Anything the user pastes goes
//! through [`clean_identifier`] first so that the same page always maps to
//! the same key.

use regex_lite::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

fn game_page() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https://([^/]+)\.itch\.io/([^/]+)$").expect("static regex"))
}

fn page_in_text() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:https://)?([A-Za-z0-9-]+)\.itch\.io/([A-Za-z0-9-]+)").expect("static regex")
    })
}

/// Force the `https://` scheme and drop any query string.
pub fn clean_identifier(raw: &str) -> String {
    let raw = raw.trim();
    let url = if raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    match url.split_once('?') {
        Some((page, _)) => page.to_string(),
        None => url,
    }
}

/// True for `https://<creator>.itch.io/<slug>` with nothing after the slug
pub fn is_game_page(identifier: &str) -> bool {
    game_page().is_match(identifier)
}

/// Every game page mentioned in `text`, normalized and deduplicated.
///
/// Used for bulk imports from pasted text or a file of links.
pub fn extract_identifiers(text: &str) -> BTreeSet<String> {
    page_in_text()
        .find_iter(text)
        .map(|m| clean_identifier(m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_adds_scheme_and_strips_query() {
        assert_eq!(clean_identifier("dev.itch.io/game"), "https://dev.itch.io/game");
        assert_eq!(
            clean_identifier(" https://dev.itch.io/game?secret=abc "),
            "https://dev.itch.io/game"
        );
    }

    #[test]
    fn game_page_shape() {
        assert!(is_game_page("https://dev.itch.io/game"));
        assert!(!is_game_page("https://dev.itch.io/game/devlog/1"));
        assert!(!is_game_page("https://itch.io/games"));
        assert!(!is_game_page("http://dev.itch.io/game"));
    }

    #[test]
    fn extract_from_free_text() {
        let text = "try https://a-dev.itch.io/cool-game and b.itch.io/other\n\
                    again: https://a-dev.itch.io/cool-game?ref=x, plus https://itch.io/jams";
        let found: Vec<_> = extract_identifiers(text).into_iter().collect();
        assert_eq!(
            found,
            vec![
                "https://a-dev.itch.io/cool-game".to_string(),
                "https://b.itch.io/other".to_string(),
            ]
        );
    }

    #[test]
    fn extract_nothing() {
        assert!(extract_identifiers("no links here").is_empty());
    }
}
