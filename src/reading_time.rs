// ⏱️ Reading Time - how long a post takes to read
// Word count of the text with HTML tags removed, at an average reading speed.

use regex::Regex;
use std::sync::LazyLock;

/// Average reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Posts shorter than this show no reading time
pub const MIN_WORD_COUNT: usize = 200;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid HTML tag regex pattern"));

/// Words in `text` after removing HTML tags
pub fn word_count(text: &str) -> usize {
    HTML_TAG.replace_all(text, "").split_whitespace().count()
}

/// Estimated minutes to read `text`, or 0 when it is too short to bother
pub fn calculate_reading_time(text: &str) -> u32 {
    if text.trim().is_empty() {
        return 0;
    }

    minutes_for_words(word_count(text))
}

/// Minutes for a word count; saturates at `u32::MAX`
pub fn minutes_for_words(words: usize) -> u32 {
    if words < MIN_WORD_COUNT {
        return 0;
    }

    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// "5 min read"; empty for 0
pub fn format_reading_time(minutes: u32) -> String {
    if minutes == 0 {
        return String::new();
    }
    format!("{} min read", minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(calculate_reading_time(""), 0);
        assert_eq!(calculate_reading_time("   \n\t"), 0);
    }

    #[test]
    fn test_short_content_has_no_reading_time() {
        assert_eq!(
            calculate_reading_time("<p>This is a short post with minimal content.</p>"),
            0
        );
        assert_eq!(calculate_reading_time(&words(199)), 0);
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(calculate_reading_time(&words(200)), 1);
        assert_eq!(calculate_reading_time(&words(201)), 2);
        assert_eq!(calculate_reading_time(&words(400)), 2);
        assert_eq!(calculate_reading_time(&words(401)), 3);
    }

    #[test]
    fn test_html_is_stripped() {
        let html = format!("<h1>Title</h1>\n<p>{}</p>\n<ul><li>one</li></ul>", words(197));
        assert_eq!(word_count(&html), 197 + 2);
        assert_eq!(calculate_reading_time(&html), 0);

        let attrs = format!("<p class=\"lead\" data-x=\"a b c\">{}</p>", words(250));
        assert_eq!(word_count(&attrs), 250);
        assert_eq!(calculate_reading_time(&attrs), 2);
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let text = format!("  {}  \n\n  {}  ", words(150), words(150));
        assert_eq!(word_count(&text), 300);
        assert_eq!(calculate_reading_time(&text), 2);
    }

    #[test]
    fn test_minutes_for_words_saturates() {
        assert_eq!(minutes_for_words(199), 0);
        assert_eq!(minutes_for_words(200), 1);
        assert_eq!(minutes_for_words(1_000), 5);
        assert_eq!(minutes_for_words(usize::MAX), u32::MAX);
    }

    #[test]
    fn test_format_reading_time() {
        assert_eq!(format_reading_time(0), "");
        assert_eq!(format_reading_time(1), "1 min read");
        assert_eq!(format_reading_time(5), "5 min read");
    }
}
