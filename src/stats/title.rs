// Title normalization for metadata lookups
// Scraped titles carry subtitles, edition tags and years that the metadata API does not match

use regex::Regex;
use std::sync::LazyLock;

/// Edition phrases stripped from the end of a title (matched case-insensitively)
pub const EDITION_SUFFIXES: &[&str] = &[
    "special edition",
    "director's cut",
    "directors cut",
    "extended edition",
    "extended cut",
    "theatrical cut",
    "unrated",
    "remastered",
    "anniversary edition",
    "collector's edition",
    "imax",
];

static RE_EDITION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = EDITION_SUFFIXES
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)[\s\-(\[]*\b(?:{})[\s)\]]*$", alternatives)).unwrap()
});
static RE_TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d{4}\)\s*$").unwrap());
static RE_SPACE_COLLAPSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a scraped title into the canonical form used for metadata lookups.
///
/// Order matters: the subtitle is dropped first (suffixes can follow a subtitle),
/// then edition suffixes, then a trailing `(YYYY)`, then whitespace is collapsed.
///
/// "The Matrix: Reloaded (1999 Special Edition)" -> "The Matrix"
/// "Blade Runner (Director's Cut) (1982)" -> "Blade Runner"
pub fn normalize_title(raw: &str) -> String {
    let mut title = raw.split(':').next().unwrap_or(raw).trim().to_string();

    // Suffixes and years can be stacked in either order
    loop {
        let without_suffix = RE_EDITION_SUFFIX.replace(&title, "").to_string();
        let without_year = RE_TRAILING_YEAR.replace(&without_suffix, "").to_string();
        let next = without_year.trim().to_string();
        if next == title || next.is_empty() {
            break;
        }
        title = next;
    }

    RE_SPACE_COLLAPSE.replace_all(&title, " ").trim().to_string()
}

/// File stem for a poster image saved for this title.
/// "Men in Black: International" -> "Men_in_Black_International"
pub fn poster_file_stem(title: &str) -> String {
    title
        .replace([' ', '/'], "_")
        .replace([':', '?'], "")
}
