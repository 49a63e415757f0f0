//! Small text helpers shared by the analysis passes.

/// Lower-case word tokens (alphanumeric runs, apostrophes kept inside words).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// The slice of `text` spanning `radius` characters either side of the byte range
/// `[start, end)`, snapped outward to char boundaries.
pub fn window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let mut lo = start.min(text.len());
    for _ in 0..radius {
        match text[..lo].char_indices().next_back() {
            Some((idx, _)) => lo = idx,
            None => break,
        }
    }
    let mut hi = end.min(text.len());
    for _ in 0..radius {
        match text[hi..].chars().next() {
            Some(c) => hi += c.len_utf8(),
            None => break,
        }
    }
    &text[lo..hi]
}

/// Case-insensitive substring test.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("The mind's eye -- isn't it?"),
            vec!["the", "mind's", "eye", "isn't", "it"]
        );
    }

    #[test]
    fn test_window_respects_char_boundaries() {
        let text = "ééé target ééé";
        let start = text.find("target").unwrap();
        let w = window(text, start, start + 6, 2);
        assert_eq!(w, "é target é");
        assert_eq!(window("abc", 0, 3, 50), "abc");
    }

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_eq!(mean(Vec::<f64>::new()), 0.0);
        assert_eq!(mean([1.0, 0.0]), 0.5);
    }
}
