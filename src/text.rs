//! Text normalization and id extraction shared by resolvers and the merge engine.
//!
//! Normalized titles are lowercase, punctuation-free and dash-joined, which is the
//! token form [`token_score`](crate::similarity::token_score) expects:
//!
//! ```rust
//! use anicine::text::clean_title;
//!
//! assert_eq!(clean_title("Frieren: Beyond Journey's End"), "frieren-beyond-journey-s-end");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::similarity::edit_score;
use crate::types::{COUNTRIES, LANGUAGES, Language};

/// Invisible and layout characters providers leak into text.
const INVISIBLE: [char; 12] = [
    '\u{200b}', '\u{200d}', '\u{200e}', '\u{200f}', '\u{00ad}', '\u{200c}', '\u{180e}',
    '\u{202a}', '\u{202b}', '\u{202d}', '\u{202e}', '\u{00a0}',
];

/// Characters replaced by a word break in titles.
const PUNCTUATION: [char; 40] = [
    '\\', '"', '\t', '\n', '\x0c', '\r', '\x07', '\x0b', '\x08', '>', '<', '~', '.', ',', '`',
    '\'', ':', ';', '|', '}', '{', '_', '*', ']', '[', '(', ')', '-', '+', '/', '「', '」', '!',
    '?', '@', '#', '$', '%', '^', '&',
];

/// Tag texts that describe the tag database rather than the anime.
const META_TAGS: [&str; 10] = [
    "maintenance",
    "to episode",
    "moved to",
    "tag",
    "element",
    "setting",
    "themes",
    "deleted",
    "content",
    "-- ",
];

static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[.*?\]|\(.*?\)|<.*?>").expect("valid annotation regex"));
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("valid number regex"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").expect("valid year regex"));
static AID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)aid=(\d+)").expect("valid aid regex"));
static ANIME_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"anime/([^/]+)/").expect("valid anime path regex"));

/// Replaces invisible characters with spaces and collapses whitespace.
pub fn clean_unicode(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let replaced: String = input
        .chars()
        .map(|c| if INVISIBLE.contains(&c) { ' ' } else { c })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase, punctuation-free, dash-joined form of a title.
pub fn clean_title(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let lowered = clean_unicode(input).to_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| if PUNCTUATION.contains(&c) { ' ' } else { c })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Search-form query: dashes become `+`.
pub fn clean_query(input: &str) -> String {
    input.replace('-', "+")
}

/// Strips bracketed, parenthesized and tag annotations, drops empty lines.
pub fn clean_overview(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    input
        .replace("\\n", "\n")
        .lines()
        .map(|line| clean_unicode(&ANNOTATION.replace_all(line, "")))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalizes each string and keeps the first occurrence of each.
pub fn clean_strings<'a>(input: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for item in input {
        let item = clean_unicode(item);
        if !item.is_empty() && !result.contains(&item) {
            result.push(item);
        }
    }
    result
}

/// Returns `""` for meta tags, the normalized lowercase tag otherwise.
pub fn clean_tag(input: &str) -> String {
    let lowered = input.to_lowercase();
    if META_TAGS.iter().any(|marker| lowered.contains(marker)) {
        return String::new();
    }
    clean_unicode(&lowered)
}

/// ISO 3166-1 code of a free-text country, `""` when unrecognized.
///
/// Matches the country catalog with [`edit_score`] at threshold 90 against the
/// code, the name and the short name.
pub fn clean_country(input: &str) -> String {
    let input = clean_title(input);
    if input.is_empty() {
        return input;
    }

    COUNTRIES
        .iter()
        .find(|(name, short_name, iso)| {
            edit_score(&input, iso) >= 90.0
                || edit_score(&input, name) >= 90.0
                || edit_score(&input, short_name) >= 90.0
        })
        .map(|(_, _, iso)| iso.to_string())
        .unwrap_or_default()
}

/// Catalog language named by `input`, default when unknown.
pub fn clean_language(input: &str) -> Language {
    let input = clean_title(input);
    LANGUAGES
        .iter()
        .find(|(name, _)| *name == input)
        .map(|entry| Language::from_catalog(*entry))
        .unwrap_or_default()
}

/// First run of digits, `0` when there is none.
pub fn extract_num(input: &str) -> u64 {
    NUMBER
        .captures(input)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// First four-digit run.
pub fn extract_year(input: &str) -> Option<i32> {
    YEAR.captures(input)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// AniDB style `aid=123` parameter.
pub fn extract_aid(input: &str) -> Option<u32> {
    AID.captures(input)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Segment after `anime/` in a link, `""` when absent.
///
/// The link must continue past the segment, callers append a `/`.
pub fn extract_anime_path(input: &str) -> String {
    ANIME_PATH
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_unicode_strips_invisible_characters() {
        assert_eq!(clean_unicode("Shingeki\u{200b} no\u{00a0}\u{00a0}Kyojin "), "Shingeki no Kyojin");
    }

    #[test]
    fn test_clean_title_joins_words() {
        assert_eq!(clean_title("  Re:Zero -Starting Life-  "), "re-zero-starting-life");
        assert_eq!(clean_title("Fate/stay night [UBW]"), "fate-stay-night-ubw");
        assert_eq!(clean_title(""), "");
    }

    #[test]
    fn test_clean_overview_drops_annotations() {
        let raw = "A quiet elf mage. (Source: Crunchyroll)\n\n[Written by MAL Rewrite]\n<br>";
        assert_eq!(clean_overview(raw), "A quiet elf mage.");
    }

    #[test]
    fn test_clean_tag_rejects_meta_tags() {
        assert_eq!(clean_tag("Tag Maintenance"), "");
        assert_eq!(clean_tag("Time  Travel"), "time travel");
    }

    #[test]
    fn test_clean_country() {
        assert_eq!(clean_country("Japan"), "jp");
        assert_eq!(clean_country("South Korea"), "kr");
        assert_eq!(clean_country("JPN"), "jp");
        assert_eq!(clean_country("Atlantis"), "");
    }

    #[test]
    fn test_clean_query_and_language() {
        assert_eq!(clean_query("sousou-no-frieren"), "sousou+no+frieren");
        assert_eq!(clean_language("Mandarin Chinese").iso639_1, "zh");
        assert_eq!(clean_language("Klingon"), Language::default());
    }

    #[test]
    fn test_extractors() {
        assert_eq!(extract_num("/anime/12345-frieren"), 12345);
        assert_eq!(extract_num("none"), 0);
        assert_eq!(extract_year("Fall 2023"), Some(2023));
        assert_eq!(extract_aid("https://anidb.net/perl-bin/animedb.pl?show=anime&aid=17617"), Some(17617));
        assert_eq!(extract_anime_path("https://myanimelist.net/anime/52991/"), "52991");
    }
}
