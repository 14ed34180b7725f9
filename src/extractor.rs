//! Turns the analysis narrative produced by the language model into project records.
//!
//! The model is asked for a fixed `**Label:** value` layout but does not
//! always comply, so parsing is layered:
//!
//! 1. The text is split into a main and an emerging section.
//! 2. A section that says its analysis is deferred yields nothing.
//! 3. Each section is cut into blocks by the first splitting strategy that
//!    applies (name markers, then headings, then runs of field lines).
//! 4. Every block is parsed on its own; a block that cannot be parsed is
//!    logged and skipped.
//!
//! Numbers the narrative does not provide are filled with random values from
//! fixed ranges so charts never collapse to zero. Those values are tagged
//! [`ValueSource::Placeholder`] and must not be presented as measurements.

use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Literal marker the system prompt asks the model to open every project with.
pub const NAME_MARKER: &str = "**Framework Name:**";

const EMERGING_HEADERS: [&str; 2] = [
    "## EMERGING FRAMEWORKS DISCOVERED",
    "## Emerging Frameworks Discovered",
];

const PENDING_PHRASES: &[&str] = &[
    "pending analysis",
    "analysis pending",
    "still pending",
    "still in progress",
    "analysis in progress",
    "will be completed later",
];

const SECTION_TITLE_WORDS: &[&str] = &[
    "frameworks",
    "implementations",
    "servers",
    "analysis",
    "overview",
    "summary",
    "discovered",
];

const NAME_LABELS: &[&str] = &["framework name", "project name", "name"];
const CATEGORY_LABELS: &[&str] = &["category"];
const DESCRIPTION_LABELS: &[&str] = &["description"];
const STARS_LABELS: &[&str] = &["github stars", "stars"];
const GROWTH_LABELS: &[&str] = &["recent growth", "growth"];
const SENTIMENT_LABELS: &[&str] = &["community sentiment", "sentiment"];
const ACTIVITY_LABELS: &[&str] = &["recent activity", "activity"];

/// Every label recognised as a field line, whether or not it is parsed.
const KNOWN_LABELS: &[&str] = &[
    "framework name",
    "project name",
    "name",
    "category",
    "description",
    "github stars",
    "stars",
    "recent growth",
    "growth",
    "community sentiment",
    "sentiment",
    "recent activity",
    "activity",
    "key strengths",
    "use cases",
];

const QUALIFIER_WORDS: &[&str] = &[
    "approximately",
    "approx.",
    "approx",
    "estimated",
    "estimate",
    "around",
    "about",
    "roughly",
    "nearly",
    "over",
    "more than",
    "usd",
];

pub const DEFAULT_CATEGORY: &str = "AI Framework";
pub const DEFAULT_DESCRIPTION: &str = "No description available";

/// Placeholder range for star counts missing from the narrative.
pub const STARS_PLACEHOLDER: RangeInclusive<u64> = 1_000..=6_000;
/// Placeholder range, in percent, for missing growth figures.
pub const GROWTH_PLACEHOLDER: RangeInclusive<u32> = 5..=50;
/// Placeholder range for missing monthly commit counts.
pub const COMMITS_PLACEHOLDER: RangeInclusive<u64> = 20..=220;
pub const POPULARITY_RANGE: RangeInclusive<u32> = 10..=100;
const POPULARITY_JITTER: RangeInclusive<u32> = 0..=10;
/// Counts above this are treated as unparseable rather than trusted.
pub const MAX_PARSED_COUNT: u64 = 1_000_000_000_000;

lazy_static::lazy_static! {
    static ref HEADING_RE: Regex = Regex::new(r"(?m)^[ \t]{0,3}#{1,4}[ \t]+(.+?)[ \t#]*$").expect("valid heading regex");
    static ref NUMBERING_RE: Regex = Regex::new(r"^(?:\d+[.)]|[-*+])\s+").expect("valid numbering regex");
    static ref COUNT_RE: Regex = Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([km])?\b").expect("valid count regex");
    static ref PERCENT_RE: Regex = Regex::new(r"([+-]?)\s*(\d+(?:\.\d+)?)\s*%").expect("valid percent regex");
}

/// Where a number in an [`ExtractedRecord`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Read from the narrative text.
    Parsed,
    /// Randomly generated because the narrative had no usable value.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Estimate<T> {
    pub fn parsed(value: T) -> Self {
        Self {
            value,
            source: ValueSource::Parsed,
        }
    }

    pub fn placeholder(value: T) -> Self {
        Self {
            value,
            source: ValueSource::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == ValueSource::Placeholder
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sentiment {
    #[serde(rename = "Very Positive")]
    VeryPositive,
    Positive,
    Neutral,
    Mixed,
    Negative,
}

impl Sentiment {
    /// Map free text to the closest label; anything unrecognised is neutral.
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("very positive") {
            Sentiment::VeryPositive
        } else if lower.contains("negative") {
            Sentiment::Negative
        } else if lower.contains("mixed") {
            Sentiment::Mixed
        } else if lower.contains("positive") {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::VeryPositive => "Very Positive",
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Mixed => "Mixed",
            Sentiment::Negative => "Negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project described in the narrative. All metrics are estimates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedRecord {
    pub name: String,
    pub category: String,
    pub description: String,
    pub stars: Estimate<u64>,
    /// A tenth of `stars`, sharing its source.
    pub forks: Estimate<u64>,
    pub growth: Estimate<String>,
    pub sentiment: Sentiment,
    pub recent_commits: Estimate<u64>,
    pub popularity: u32,
}

impl ExtractedRecord {
    /// Growth as a signed number of percent, e.g. `+30%` → `30.0`.
    pub fn growth_percent(&self) -> Option<f64> {
        self.growth
            .value
            .trim()
            .trim_end_matches('%')
            .trim_start_matches('+')
            .parse()
            .ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub main: Vec<ExtractedRecord>,
    pub emerging: Vec<ExtractedRecord>,
}

impl Extraction {
    pub fn all(&self) -> impl Iterator<Item = &ExtractedRecord> {
        self.main.iter().chain(self.emerging.iter())
    }

    pub fn names(&self) -> Vec<String> {
        self.all().map(|r| r.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.emerging.is_empty()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BlockError {
    #[error("block is empty")]
    Empty,
    #[error("block has no usable name")]
    MissingName,
    #[error("block name {0:?} is a field label")]
    LabelAsName(String),
}

type SplitStrategy = fn(&str) -> Option<Vec<String>>;

/// Block splitting strategies in priority order; the first that applies wins.
const SPLIT_STRATEGIES: &[(&str, SplitStrategy)] = &[
    ("name marker", split_on_name_marker),
    ("headings", split_on_headings),
    ("field lines", split_on_field_lines),
];

/// Parser over narrative text. `R` supplies placeholder values.
pub struct NarrativeExtractor<R> {
    rng: R,
}

impl NarrativeExtractor<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> NarrativeExtractor<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn extract(&mut self, text: &str) -> Extraction {
        let (main, emerging) = split_sections(text);
        Extraction {
            main: self.extract_segment(main, "main"),
            emerging: emerging
                .map(|segment| self.extract_segment(segment, "emerging"))
                .unwrap_or_default(),
        }
    }

    fn extract_segment(&mut self, segment: &str, section: &str) -> Vec<ExtractedRecord> {
        if let Some(phrase) = pending_phrase(segment) {
            debug!(section, phrase, "Section analysis is deferred; skipping");
            return Vec::new();
        }

        let blocks = split_blocks(segment);
        let mut records = Vec::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            match self.parse_block(block) {
                Ok(record) => records.push(record),
                Err(e) => warn!(section, block = index, "Skipping narrative block: {}", e),
            }
        }
        debug!(section, count = records.len(), "Extracted records");
        records
    }

    /// Parse a single project block.
    pub fn parse_block(&mut self, block: &str) -> Result<ExtractedRecord, BlockError> {
        if block.trim().is_empty() {
            return Err(BlockError::Empty);
        }
        let name = extract_name(block)?;

        let category = find_field(block, CATEGORY_LABELS)
            .map(|v| clean_inline(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let description = find_field(block, DESCRIPTION_LABELS)
            .map(|v| clean_inline(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        let sentiment = find_field(block, SENTIMENT_LABELS)
            .map(|v| Sentiment::from_text(&v))
            .unwrap_or(Sentiment::Neutral);

        let stars = match find_field(block, STARS_LABELS).and_then(|v| parse_count(&v)) {
            Some(stars) => Estimate::parsed(stars),
            None => Estimate::placeholder(self.rng.random_range(STARS_PLACEHOLDER)),
        };
        let growth = match find_field(block, GROWTH_LABELS).and_then(|v| parse_growth(&v)) {
            Some(growth) => Estimate::parsed(growth),
            None => Estimate::placeholder(format!(
                "+{}%",
                self.rng.random_range(GROWTH_PLACEHOLDER)
            )),
        };
        let recent_commits = match find_field(block, ACTIVITY_LABELS).and_then(|v| parse_count(&v))
        {
            Some(commits) => Estimate::parsed(commits),
            None => Estimate::placeholder(self.rng.random_range(COMMITS_PLACEHOLDER)),
        };

        let forks = Estimate {
            value: stars.value / 10,
            source: stars.source,
        };
        let popularity = self.popularity(stars.value);

        Ok(ExtractedRecord {
            name,
            category,
            description,
            stars,
            forks,
            growth,
            sentiment,
            recent_commits,
            popularity,
        })
    }

    fn popularity(&mut self, stars: u64) -> u32 {
        let base = (stars / 1_000).min(u64::from(*POPULARITY_RANGE.end())) as u32;
        let jitter = self.rng.random_range(POPULARITY_JITTER);
        (base + jitter).clamp(*POPULARITY_RANGE.start(), *POPULARITY_RANGE.end())
    }
}

/// Extract with a fresh OS-seeded random source.
pub fn extract(text: &str) -> Extraction {
    NarrativeExtractor::from_entropy().extract(text)
}

/// Split into the main section and, when a header is present, the emerging one.
pub fn split_sections(text: &str) -> (&str, Option<&str>) {
    for header in EMERGING_HEADERS {
        if let Some(pos) = text.find(header) {
            return (&text[..pos], Some(&text[pos + header.len()..]));
        }
    }
    (text, None)
}

fn pending_phrase(segment: &str) -> Option<&'static str> {
    let lower = segment.to_lowercase();
    PENDING_PHRASES
        .iter()
        .copied()
        .find(|phrase| lower.contains(phrase))
}

/// Cut a section into candidate blocks with the first strategy that applies.
pub fn split_blocks(segment: &str) -> Vec<String> {
    for (label, strategy) in SPLIT_STRATEGIES {
        if let Some(blocks) = strategy(segment) {
            debug!(strategy = label, count = blocks.len(), "Split narrative section");
            return blocks;
        }
    }
    Vec::new()
}

fn split_on_name_marker(segment: &str) -> Option<Vec<String>> {
    if !segment.contains(NAME_MARKER) {
        return None;
    }
    Some(
        segment
            .split(NAME_MARKER)
            .skip(1)
            .map(|chunk| format!("{}{}", NAME_MARKER, chunk))
            .collect(),
    )
}

fn split_on_headings(segment: &str) -> Option<Vec<String>> {
    let starts: Vec<usize> = HEADING_RE
        .captures_iter(segment)
        .filter(|caps| !is_section_title(&caps[1]))
        .filter_map(|caps| caps.get(0).map(|m| m.start()))
        .collect();
    if starts.is_empty() {
        return None;
    }
    let mut blocks = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(segment.len());
        blocks.push(segment[start..end].to_string());
    }
    Some(blocks)
}

fn is_section_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    SECTION_TITLE_WORDS.iter().any(|word| lower.contains(word))
}

/// Blocks begin where a category or description line opens a run of field
/// lines; the title (or name field) line just above the run is kept as the
/// block's head.
fn split_on_field_lines(segment: &str) -> Option<Vec<String>> {
    let lines: Vec<&str> = segment.lines().collect();
    let mut starts: Vec<usize> = Vec::new();
    let mut seen: HashSet<&'static str> = HashSet::new();
    let mut in_run = false;
    let mut title: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match field_label(trimmed) {
            Some("framework name" | "project name" | "name") => {
                in_run = false;
                title = Some(i);
            }
            Some(label @ ("category" | "description")) => {
                if !in_run || seen.contains(label) {
                    let start = match (title, starts.last()) {
                        (Some(t), Some(&last)) if t > last => t,
                        (Some(t), None) => t,
                        _ => i,
                    };
                    starts.push(start);
                    seen.clear();
                    in_run = true;
                }
                seen.insert(label);
            }
            Some(label) => {
                if in_run {
                    seen.insert(label);
                }
            }
            None => {
                in_run = false;
                title = Some(i);
            }
        }
    }

    if starts.is_empty() {
        return None;
    }
    let mut blocks = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(lines.len());
        blocks.push(lines[start..end].join("\n"));
    }
    Some(blocks)
}

/// Split `**Label:** value`, `**Label**: value` or `Label: value`, with an
/// optional list bullet, into a lower-cased label and the raw value.
fn split_field_line(line: &str) -> Option<(String, &str)> {
    let trimmed = line.trim();
    let body = match NUMBERING_RE.find(trimmed) {
        Some(m) => &trimmed[m.end()..],
        None => trimmed,
    };
    let body = body.trim_start_matches(['*', '_']);
    let colon = body.find(':')?;
    let label = body[..colon]
        .trim()
        .trim_end_matches(['*', '_'])
        .trim()
        .to_ascii_lowercase();
    if label.is_empty() || label.len() > 40 {
        return None;
    }
    let value = body[colon + 1..].trim_start_matches(['*', '_']).trim();
    Some((label, value))
}

fn field_label(line: &str) -> Option<&'static str> {
    let (label, _) = split_field_line(line)?;
    KNOWN_LABELS
        .iter()
        .copied()
        .find(|known| label_matches(&label, known))
}

/// `known` as the whole label or its first word(s): `stars` matches
/// `stars (approx)` but not `starship`.
fn label_matches(label: &str, known: &str) -> bool {
    label
        .strip_prefix(known)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// First non-empty value for any of `labels`, tried in order across all lines.
fn find_field(block: &str, labels: &[&str]) -> Option<String> {
    labels.iter().find_map(|label| {
        block.lines().find_map(|line| {
            let (found, value) = split_field_line(line)?;
            (label_matches(&found, label) && !value.is_empty()).then(|| value.to_string())
        })
    })
}

fn extract_name(block: &str) -> Result<String, BlockError> {
    let name = match find_field(block, NAME_LABELS) {
        Some(value) => clean_inline(&value),
        None => {
            let first = block
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .ok_or(BlockError::MissingName)?;
            clean_inline(first.trim_start_matches('#'))
        }
    };

    if name.is_empty() {
        return Err(BlockError::MissingName);
    }
    if is_label_text(&name) {
        return Err(BlockError::LabelAsName(name));
    }
    Ok(name)
}

fn is_label_text(name: &str) -> bool {
    let lower = name.to_lowercase();
    let bare = lower.trim_end_matches(':').trim();
    name.contains("**")
        || NAME_LABELS.contains(&bare)
        || KNOWN_LABELS
            .iter()
            .any(|label| lower.contains(&format!("{}:", label)))
}

/// Strip list numbering, emphasis, brackets and trailing colons.
fn clean_inline(value: &str) -> String {
    let trimmed = value.trim();
    let without_numbering = match NUMBERING_RE.find(trimmed) {
        Some(m) => &trimmed[m.end()..],
        None => trimmed,
    };
    without_numbering
        .trim()
        .trim_matches(['*', '_', '`', '[', ']', '#'])
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_string()
}

/// Parse a count such as `~2,500`, `approximately 89.5k` or `45 commits`.
/// Zero, values above [`MAX_PARSED_COUNT`] and unparseable text yield `None`.
pub fn parse_count(text: &str) -> Option<u64> {
    let cleaned = strip_qualifiers(text);
    let caps = COUNT_RE.captures(&cleaned)?;
    let number: f64 = caps[1].replace(',', "").parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("k") => 1_000.0,
        Some("m") => 1_000_000.0,
        _ => 1.0,
    };
    let value = (number * multiplier).round();
    (1.0..=MAX_PARSED_COUNT as f64)
        .contains(&value)
        .then_some(value as u64)
}

/// Normalise a growth figure to a signed percentage such as `+30%`.
pub fn parse_growth(text: &str) -> Option<String> {
    let (negative, digits) = match PERCENT_RE.captures(text) {
        Some(caps) => (&caps[1] == "-", caps[2].to_string()),
        None => {
            let cleaned = strip_qualifiers(text);
            let caps = COUNT_RE.captures(&cleaned)?;
            (false, caps[1].replace(',', ""))
        }
    };
    let number: f64 = digits.parse().ok()?;
    if number == 0.0 {
        return None;
    }
    let sign = if negative { "-" } else { "+" };
    Some(format!("{}{}%", sign, digits))
}

fn strip_qualifiers(text: &str) -> String {
    let mut cleaned = text.to_lowercase();
    for word in QUALIFIER_WORDS {
        cleaned = cleaned.replace(word, " ");
    }
    cleaned
        .chars()
        .filter(|c| !matches!(c, '~' | '$' | '+' | '≈' | '(' | ')'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "**Framework Name:** Foo\n**Category:** AI Framework\n**GitHub Stars:** 2,500\n**Recent Growth:** +30%\n**Community Sentiment:** Positive\n**Recent Activity:** 45 commits";

    #[test]
    fn test_well_formed_block() {
        let mut extractor = NarrativeExtractor::seeded(7);
        let extraction = extractor.extract(WELL_FORMED);
        assert_eq!(extraction.main.len(), 1);
        assert!(extraction.emerging.is_empty());

        let record = &extraction.main[0];
        assert_eq!(record.name, "Foo");
        assert_eq!(record.category, "AI Framework");
        assert_eq!(record.stars, Estimate::parsed(2500));
        assert_eq!(record.growth, Estimate::parsed("+30%".to_string()));
        assert_eq!(record.sentiment, Sentiment::Positive);
        assert_eq!(record.recent_commits, Estimate::parsed(45));
        assert_eq!(record.forks, Estimate::parsed(250));
        assert_eq!(record.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_split_sections() {
        let (main, emerging) = split_sections("intro\n## EMERGING FRAMEWORKS DISCOVERED\nrest");
        assert_eq!(main, "intro\n");
        assert_eq!(emerging, Some("\nrest"));

        let (_, emerging) = split_sections("a\n## Emerging Frameworks Discovered\nb");
        assert_eq!(emerging, Some("\nb"));

        // Header match is case-sensitive.
        let (main, emerging) = split_sections("a\n## emerging frameworks discovered\nb");
        assert!(emerging.is_none());
        assert!(main.contains("emerging"));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("2,500"), Some(2500));
        assert_eq!(parse_count("~89.5k (estimate)"), Some(89_500));
        assert_eq!(parse_count("approximately 1.2M stars"), Some(1_200_000));
        assert_eq!(parse_count("45 commits in the last month"), Some(45));
        assert_eq!(parse_count("Over 200+ commits"), Some(200));
        assert_eq!(parse_count("0"), None);
        assert_eq!(parse_count("unknown"), None);
    }

    #[test]
    fn test_parse_count_rejects_absurd_values() {
        assert_eq!(parse_count("99999999999999999999"), None);
        assert_eq!(parse_count("5000000m"), None);
        assert_eq!(parse_count("1,000,000,000,000"), Some(MAX_PARSED_COUNT));
    }

    #[test]
    fn test_labels_match_whole_words() {
        assert_eq!(field_label("Namespace: agents"), None);
        assert_eq!(field_label("Starship: yes"), None);
        assert_eq!(field_label("**Name:** Foo"), Some("name"));
        assert_eq!(field_label("GitHub Stars (approx): 10k"), Some("github stars"));

        let block = "### Foo\nNamespace: bar\n**GitHub Stars:** 10";
        assert_eq!(find_field(block, NAME_LABELS), None);
        assert_eq!(extract_name(block), Ok("Foo".to_string()));
    }

    #[test]
    fn test_parse_growth() {
        assert_eq!(parse_growth("+30% over the past 6 months"), Some("+30%".to_string()));
        assert_eq!(parse_growth("25%"), Some("+25%".to_string()));
        assert_eq!(parse_growth("-4.5%"), Some("-4.5%".to_string()));
        assert_eq!(parse_growth("about 12 percent"), Some("+12%".to_string()));
        assert_eq!(parse_growth("0%"), None);
        assert_eq!(parse_growth("steady"), None);
    }

    #[test]
    fn test_split_field_line_forms() {
        assert_eq!(
            split_field_line("**GitHub Stars:** 2,500"),
            Some(("github stars".to_string(), "2,500"))
        );
        assert_eq!(
            split_field_line("- **Category**: MCP Server"),
            Some(("category".to_string(), "MCP Server"))
        );
        assert_eq!(
            split_field_line("Recent Growth: +10%"),
            Some(("recent growth".to_string(), "+10%"))
        );
        assert_eq!(split_field_line("No colon here"), None);
    }

    #[test]
    fn test_sentiment_from_text() {
        assert_eq!(Sentiment::from_text("Very Positive"), Sentiment::VeryPositive);
        assert_eq!(Sentiment::from_text("positive overall"), Sentiment::Positive);
        assert_eq!(Sentiment::from_text("Mixed to positive"), Sentiment::Mixed);
        assert_eq!(Sentiment::from_text("Negative"), Sentiment::Negative);
        assert_eq!(Sentiment::from_text("[Positive/Neutral]"), Sentiment::Positive);
        assert_eq!(Sentiment::from_text("meh"), Sentiment::Neutral);
    }

    #[test]
    fn test_label_only_name_is_rejected() {
        let mut extractor = NarrativeExtractor::seeded(1);
        assert!(matches!(
            extractor.parse_block("**Category:** AI Framework\n**GitHub Stars:** 10"),
            Err(BlockError::LabelAsName(_))
        ));
        assert_eq!(
            extractor.parse_block("Framework Name:\n**Category:** AI Framework"),
            Err(BlockError::LabelAsName("Framework Name".to_string()))
        );
        assert_eq!(extractor.parse_block("   \n  "), Err(BlockError::Empty));
    }

    #[test]
    fn test_popularity_stays_in_range() {
        let mut extractor = NarrativeExtractor::seeded(3);
        for stars in [0, 500, 20_000, 165_000, u64::MAX] {
            let p = extractor.popularity(stars);
            assert!(POPULARITY_RANGE.contains(&p), "popularity {} out of range", p);
        }
    }

    #[test]
    fn test_growth_percent() {
        let mut extractor = NarrativeExtractor::seeded(3);
        let record = extractor
            .parse_block("**Framework Name:** Bar\n**Recent Growth:** -12%")
            .unwrap();
        assert_eq!(record.growth_percent(), Some(-12.0));
    }
}
