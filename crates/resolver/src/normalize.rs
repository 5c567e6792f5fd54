//! Input normalization for region queries.

/// Messages forwarded from a shared location carry the address followed by a
/// Google Maps link on its own line. Only the address part is searchable.
const MAPS_LINK_MARKER: &str = "\nhttps://maps.google.com/maps?q=";

/// Drop a trailing geolocation link so the contained address is searched.
#[must_use]
pub fn strip_location_link(text: &str) -> &str {
    match text.find(MAPS_LINK_MARKER) {
        Some(pos) => &text[..pos],
        None => text,
    }
}

/// Strip `,.!?` punctuation and split on whitespace.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.replace([',', '.', '!', '?'], "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Heuristic guard against treating chatty replies as region queries: a very
/// short first token in a message of more than three tokens is almost never
/// a place name.
#[must_use]
pub fn is_conversational_noise(tokens: &[String]) -> bool {
    match tokens.first() {
        Some(first) => first.chars().count() < 4 && tokens.len() > 3,
        None => true,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_maps_link() {
        let text = "Hauptstraße 1, Hannover\nhttps://maps.google.com/maps?q=52.37,9.73";
        assert_eq!(strip_location_link(text), "Hauptstraße 1, Hannover");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(strip_location_link("Hannover"), "Hannover");
    }

    #[test]
    fn tokenize_removes_punctuation() {
        assert_eq!(
            tokenize("Wie ist die Lage in Köln?!"),
            vec!["Wie", "ist", "die", "Lage", "in", "Köln"]
        );
    }

    #[test]
    fn noise_guard_matches_short_first_token_in_long_message() {
        let tokens = tokenize("ja das ist wirklich gut");
        assert!(is_conversational_noise(&tokens));
    }

    #[test]
    fn noise_guard_lets_place_names_through() {
        // Long first token.
        assert!(!is_conversational_noise(&tokenize("Hannover")));
        // Short first token but short message.
        assert!(!is_conversational_noise(&tokenize("Bad Segeberg")));
    }

    #[test]
    fn empty_input_counts_as_noise() {
        assert!(is_conversational_noise(&[]));
    }
}
