//! Heuristic bibliographic metadata extraction from the plain text of a paper.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// The amount of paper text handed to the citation model.
pub const CITATION_TEXT_LIMIT: usize = 2000;

/// Lines containing any of these are treated as front-matter noise, never as a title.
const METADATA_KEYWORDS: &[&str] = &[
    "page",
    "copyright",
    "©",
    "doi:",
    "isbn",
    "issn",
    "url:",
    "http",
];

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19[4-9]\d|20[0-2]\d|2030)\b").expect("valid year regex"));

static AUTHOR_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?:(?i:by)\s+|(?i:authors?):\s*)([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)")
            .expect("valid byline regex"),
        Regex::new(r"([A-Z][a-z]+,\s[A-Z]\.(?:\s[A-Z]\.)?)").expect("valid surname regex"),
    ]
});

/// What could be recovered from a paper's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl PaperMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.year.is_none()
    }

    /// Fills missing fields from `other`, keeping the ones already present.
    pub fn or(self, other: PaperMetadata) -> PaperMetadata {
        PaperMetadata {
            title: self.title.or(other.title),
            author: self.author.or(other.author),
            year: self.year.or(other.year),
        }
    }
}

fn is_metadata_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    METADATA_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Guesses title, author and year from extracted paper text.
pub fn extract_metadata(text: &str) -> PaperMetadata {
    let title = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(5)
        .find(|line| {
            let len = line.chars().count();
            len > 10 && len < 200 && !is_metadata_line(line)
        })
        .map(str::to_string);

    let year = YEAR_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    let author = AUTHOR_RES.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    });

    PaperMetadata {
        title,
        author,
        year,
    }
}

/// Truncates text to the first `CITATION_TEXT_LIMIT` characters.
pub fn truncate_for_citation(text: &str) -> &str {
    match text.char_indices().nth(CITATION_TEXT_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
