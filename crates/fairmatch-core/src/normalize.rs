use once_cell::sync::Lazy;
use regex::Regex;

/// Separators and punctuation that carry no identity in an exhibition name:
/// whitespace, dashes, underscores, slashes, pipes, brackets, braces, dots,
/// commas, `!?:;`, straight/curly quotes, backticks and the middle dot.
static PUNCT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\s\-_/|()\[\]{}.,!?:;'"‘’“”`·]+"#).expect("valid punctuation regex")
});

/// Lowercase, fold punctuation runs into single spaces, trim.
///
/// Total: empty input gives an empty string.
pub fn normalize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let lowered = s.to_lowercase();
    PUNCT_RE.replace_all(&lowered, " ").trim().to_string()
}
