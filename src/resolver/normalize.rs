use regex::Regex;
use std::sync::LazyLock;

/// Marks both ends of a token so n-grams can tell prefixes from infixes
pub const BOUNDARY: char = '#';
pub const MIN_GRAM: usize = 3;
pub const MAX_GRAM: usize = 5;

const STOP_WORDS: [&str; 18] = [
    "корт", "корты", "клуб", "court", "courts", "club", "улица", "ул", "street", "st",
    "теннисный", "теннисная", "tennis", "спортивный", "комплекс", "центр", "академия", "в",
];

const ALIAS_RULES: [(&str, &str); 8] = [
    // platform names leak into user messages copied from booking links
    (r"\b(?:reservi|yclients|vivacrm|moyklass|findsport)\b", " "),
    (r"\bpadel\b", "падел"),
    (r"\btennis\b", "теннис"),
    (r"\bтк\b", "теннисный клуб"),
    (r"\bск\b", "спортивный комплекс"),
    (r"\bтц\b", "теннисный центр"),
    (r"\bим\b\.?", "имени"),
    (r"\bм\.\s*", "метро "),
];

static ALIASES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    ALIAS_RULES
        .iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), *replacement))
        .collect()
});

/// Canonical word list of a free-text venue name
pub fn tokens(text: &str) -> Vec<String> {
    let mut text = text.to_lowercase().replace('ё', "е");
    for (regex, replacement) in ALIASES.iter() {
        text = regex.replace_all(&text, *replacement).into_owned();
    }
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Normalized text as a single space-joined string
pub fn normalize(text: &str) -> String {
    tokens(text).join(" ")
}

/// Every 3-, 4- and 5-character gram of the boundary-padded tokens
pub fn char_ngrams(text: &str) -> Vec<String> {
    let mut grams = Vec::new();
    for token in tokens(text) {
        let padded: Vec<char> = std::iter::once(BOUNDARY)
            .chain(token.chars())
            .chain(std::iter::once(BOUNDARY))
            .collect();
        for n in MIN_GRAM..=MAX_GRAM {
            grams.extend(padded.windows(n).map(|window| window.iter().collect::<String>()));
        }
    }
    grams
}
