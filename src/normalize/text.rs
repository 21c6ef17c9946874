/// Shortest run of one letter at the end of a token treated as an artifact.
const TRAILING_RUN: usize = 3;

/// Name/place cleanup without dictionary help.
///
/// Keeps letters, apostrophes and hyphens; drops other symbols; trims
/// punctuation at token edges; collapses a trailing run of one repeated
/// letter; uppercases; joins tokens with single spaces.
pub fn clean_name(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_alphabetic() || c == '\'' || c == '-' {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    kept.split_whitespace()
        .map(|token| token.trim_matches(|c| c == '\'' || c == '-'))
        .filter(|token| !token.is_empty())
        .map(|token| collapse_trailing_run(&token.to_uppercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapse_trailing_run(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let Some(&last) = chars.last() else {
        return String::new();
    };
    let run = chars.iter().rev().take_while(|&&c| c == last).count();
    if run >= TRAILING_RUN && last.is_alphabetic() {
        chars[..chars.len() - run + 1].iter().collect()
    } else {
        token.to_string()
    }
}

/// Free-text branch: whitespace collapsing and control-character removal.
pub fn normalize_free_text(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() {
                None
            } else {
                Some(c)
            }
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
