use crate::normalize::normalize_text;
use cinerank_model::RawRecord;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;

static CONTAINER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.ipc-metadata-list-summary-item").expect("valid selector"));
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3.ipc-title__text").expect("valid selector"));
static METADATA_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.cli-title-metadata-item").expect("valid selector"));
static RATING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.ipc-rating-star--rating").expect("valid selector"));

// "12. Title". ASCII digits only; `\d` also matches digits that integer
// parsing rejects.
static RANKED_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.\s+(.*)").expect("valid regex"));
// "8.5 (2.3M)"
static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]\.[0-9])\s*\((.*)\)").expect("valid regex"));

/// Year token used when a container carries no metadata spans.
pub const MISSING_YEAR: &str = "N/A";

/// Why a container produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no title element")]
    MissingTitle,

    #[error("rank out of range: {0:?}")]
    MalformedRank(String),

    #[error("unparsable rating: {0:?}")]
    MalformedRating(String),

    #[error("unparsable vote count: {0:?}")]
    MalformedVotes(String),
}

/// Result of extracting a single container.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Extracted(RawRecord),
    Skipped(SkipReason),
}

/// Per-run tally of container outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub containers: usize,
    pub extracted: usize,
    pub missing_title: usize,
    pub malformed_rank: usize,
    pub malformed_rating: usize,
    pub malformed_votes: usize,
}

impl ExtractionReport {
    pub fn skipped(&self) -> usize {
        self.containers - self.extracted
    }

    fn record(&mut self, outcome: &RecordOutcome) {
        self.containers += 1;
        match outcome {
            RecordOutcome::Extracted(_) => self.extracted += 1,
            RecordOutcome::Skipped(SkipReason::MissingTitle) => self.missing_title += 1,
            RecordOutcome::Skipped(SkipReason::MalformedRank(_)) => self.malformed_rank += 1,
            RecordOutcome::Skipped(SkipReason::MalformedRating(_)) => self.malformed_rating += 1,
            RecordOutcome::Skipped(SkipReason::MalformedVotes(_)) => self.malformed_votes += 1,
        }
    }
}

/// Records extracted from one listing page, in page order.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub records: Vec<RawRecord>,
    pub report: ExtractionReport,
}

/// Parse a listing page and extract one record per well-formed container.
///
/// Each container is handled in isolation: a malformed entry is skipped and
/// counted, and never stops the rest of the page from being read.
pub fn extract_listing(html: &str) -> Extraction {
    let document = Html::parse_document(html);
    let mut records = Vec::new();
    let mut report = ExtractionReport::default();

    for (index, container) in document.select(&CONTAINER_SEL).enumerate() {
        let outcome = extract_container(container);
        report.record(&outcome);
        match outcome {
            RecordOutcome::Extracted(record) => records.push(record),
            RecordOutcome::Skipped(reason) => {
                tracing::debug!(container = index, %reason, "Skipping container");
            }
        }
    }

    Extraction { records, report }
}

/// Extract a record from a single listing container.
pub fn extract_container(container: ElementRef<'_>) -> RecordOutcome {
    match try_extract(container) {
        Ok(record) => RecordOutcome::Extracted(record),
        Err(reason) => RecordOutcome::Skipped(reason),
    }
}

fn try_extract(container: ElementRef<'_>) -> Result<RawRecord, SkipReason> {
    let title_el = container
        .select(&TITLE_SEL)
        .next()
        .ok_or(SkipReason::MissingTitle)?;
    let (rank, title) = split_rank(&element_text(title_el))?;

    let year_text = container
        .select(&METADATA_SEL)
        .next()
        .map(element_text)
        .unwrap_or_else(|| MISSING_YEAR.to_string());

    let (rating, votes) = match container.select(&RATING_SEL).next() {
        Some(el) => match parse_rating(&element_text(el))? {
            Some((rating, votes)) => (Some(rating), Some(votes)),
            None => (None, None),
        },
        None => (None, None),
    };

    Ok(RawRecord {
        rank,
        title,
        year_text,
        rating,
        votes,
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<String>())
}

/// Split "12. Title" into rank and title. Text without the ordinal prefix
/// becomes the title as-is with no rank.
pub fn split_rank(full_title: &str) -> Result<(Option<u32>, String), SkipReason> {
    let Some(caps) = RANKED_TITLE_RE.captures(full_title) else {
        return Ok((None, full_title.to_string()));
    };
    let rank = caps[1]
        .parse::<u32>()
        .map_err(|_| SkipReason::MalformedRank(caps[1].to_string()))?;
    Ok((Some(rank), caps[2].to_string()))
}

/// Parse "8.5 (2.3M)" into (rating, votes).
///
/// Text that does not have that shape yields `Ok(None)`: the entry keeps no
/// rating and no votes. A vote number that matches the shape but does not
/// parse rejects the whole container.
pub fn parse_rating(text: &str) -> Result<Option<(f64, f64)>, SkipReason> {
    let Some(caps) = RATING_RE.captures(text) else {
        return Ok(None);
    };
    let rating = caps[1]
        .parse::<f64>()
        .map_err(|_| SkipReason::MalformedRating(caps[1].to_string()))?;
    let votes =
        parse_votes(&caps[2]).ok_or_else(|| SkipReason::MalformedVotes(caps[2].to_string()))?;
    Ok(Some((rating, votes)))
}

/// Reconstruct a vote count from "2.1M", "950K" or "12,345".
///
/// "M" wins over "K" when both appear. Thousands separators are ignored.
pub fn parse_votes(text: &str) -> Option<f64> {
    let (digits, scale) = if text.contains('M') {
        (text.replace('M', ""), 1_000_000.0)
    } else if text.contains('K') {
        (text.replace('K', ""), 1_000.0)
    } else {
        (text.to_string(), 1.0)
    };
    let value = digits.replace(',', "").trim().parse::<f64>().ok()?;
    Some(value * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(items: &[&str]) -> String {
        format!(
            r#"<html><body><ul class="ipc-metadata-list">{}</ul></body></html>"#,
            items.join("\n")
        )
    }

    fn item(title: Option<&str>, year: Option<&str>, rating: Option<&str>) -> String {
        let title = title
            .map(|t| format!(r#"<a href="/title/tt1/"><h3 class="ipc-title__text">{t}</h3></a>"#))
            .unwrap_or_default();
        let year = year
            .map(|y| {
                format!(
                    r#"<div class="cli-title-metadata"><span class="cli-title-metadata-item">{y}</span><span class="cli-title-metadata-item">2h 22m</span></div>"#
                )
            })
            .unwrap_or_default();
        let rating = rating
            .map(|r| format!(r#"<span class="ipc-rating-star--rating">{r}</span>"#))
            .unwrap_or_default();
        format!(r#"<li class="ipc-metadata-list-summary-item">{title}{year}{rating}</li>"#)
    }

    #[test]
    fn test_three_container_scenario() {
        let html = listing(&[
            &item(Some("1. Foo"), Some("1994"), Some("8.5 (2.3M)")),
            &item(None, Some("1972"), Some("9.2 (2M)")),
            &item(Some("3. Bar"), Some("2001"), None),
        ]);

        let extraction = extract_listing(&html);

        assert_eq!(extraction.records.len(), 2);
        assert_eq!(
            extraction.records[0],
            RawRecord {
                rank: Some(1),
                title: "Foo".into(),
                year_text: "1994".into(),
                rating: Some(8.5),
                votes: Some(2_300_000.0),
            }
        );
        assert_eq!(extraction.records[1].rank, Some(3));
        assert_eq!(extraction.records[1].title, "Bar");
        assert_eq!(extraction.records[1].rating, None);
        assert_eq!(extraction.records[1].votes, None);

        assert_eq!(extraction.report.containers, 3);
        assert_eq!(extraction.report.extracted, 2);
        assert_eq!(extraction.report.missing_title, 1);
        assert_eq!(extraction.report.skipped(), 1);
    }

    #[test]
    fn test_missing_title_is_skip_outcome() {
        let html = listing(&[&item(None, Some("1994"), Some("8.5 (2.3M)"))]);
        let document = Html::parse_document(&html);
        let container = document.select(&CONTAINER_SEL).next().unwrap();
        assert_eq!(
            extract_container(container),
            RecordOutcome::Skipped(SkipReason::MissingTitle)
        );
    }

    #[test]
    fn test_title_without_ordinal() {
        let html = listing(&[&item(Some("Foo: The Sequel"), None, None)]);
        let extraction = extract_listing(&html);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].rank, None);
        assert_eq!(extraction.records[0].title, "Foo: The Sequel");
        assert_eq!(extraction.records[0].year_text, MISSING_YEAR);
    }

    #[test]
    fn test_first_metadata_span_is_year() {
        let html = listing(&[&item(Some("12. Heat"), Some("1995"), Some("8.3 (750K)"))]);
        let extraction = extract_listing(&html);
        assert_eq!(extraction.records[0].year_text, "1995");
        assert_eq!(extraction.records[0].votes, Some(750_000.0));
    }

    #[test]
    fn test_unmatched_rating_keeps_record() {
        // A bare rating without the vote group does not match the pattern
        let html = listing(&[&item(Some("4. Baz"), Some("1960"), Some("8.1"))]);
        let extraction = extract_listing(&html);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].rating, None);
        assert_eq!(extraction.records[0].votes, None);
    }

    #[test]
    fn test_malformed_votes_skips_container() {
        let html = listing(&[
            &item(Some("1. Good"), Some("1999"), Some("8.0 (10K)")),
            &item(Some("2. Broken"), Some("1999"), Some("8.0 (lots)")),
        ]);
        let extraction = extract_listing(&html);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].title, "Good");
        assert_eq!(extraction.report.malformed_votes, 1);
    }

    #[test]
    fn test_oversized_rank_skips_container() {
        assert_eq!(
            split_rank("99999999999. Too Long"),
            Err(SkipReason::MalformedRank("99999999999".into()))
        );
    }

    #[test]
    fn test_non_ascii_digits_do_not_match() {
        // Arabic-Indic digits read as plain title text, not a malformed rank
        assert_eq!(
            split_rank("\u{0661}\u{0662}. Foo"),
            Ok((None, "\u{0661}\u{0662}. Foo".to_string()))
        );
        // and as an unrecognised rating, which keeps the record
        assert_eq!(parse_rating("\u{0668}.\u{0665} (2M)"), Ok(None));

        let html = listing(&[&item(
            Some("\u{0661}\u{0662}. Foo"),
            Some("1994"),
            Some("\u{0668}.\u{0665} (2M)"),
        )]);
        let extraction = extract_listing(&html);
        assert_eq!(extraction.report.extracted, 1);
        assert_eq!(extraction.records[0].rank, None);
        assert_eq!(extraction.records[0].rating, None);
    }

    #[test]
    fn test_split_rank_requires_space_after_dot() {
        assert_eq!(split_rank("2001. A Space Odyssey").unwrap(), (Some(2001), "A Space Odyssey".into()));
        assert_eq!(split_rank("2001.Odyssey").unwrap(), (None, "2001.Odyssey".into()));
    }

    #[test]
    fn test_parse_votes_magnitudes() {
        assert_eq!(parse_votes("2.1M"), Some(2_100_000.0));
        assert_eq!(parse_votes("950K"), Some(950_000.0));
        assert_eq!(parse_votes("12,345"), Some(12_345.0));
        assert_eq!(parse_votes("1,250K"), Some(1_250_000.0));
        assert_eq!(parse_votes(" 3.1M "), Some(3_100_000.0));
        assert_eq!(parse_votes(""), None);
        assert_eq!(parse_votes("many"), None);
    }

    #[test]
    fn test_parse_rating_whitespace_before_votes() {
        assert_eq!(parse_rating("9.3 (2.9M)").unwrap(), Some((9.3, 2_900_000.0)));
        assert_eq!(parse_rating("9.3(2.9M)").unwrap(), Some((9.3, 2_900_000.0)));
        assert_eq!(parse_rating("9.3").unwrap(), None);
        assert_eq!(parse_rating("10 (5)").unwrap(), None);
    }

    #[test]
    fn test_duplicates_pass_through() {
        let entry = item(Some("1. Foo"), Some("1994"), Some("8.5 (2.3M)"));
        let html = listing(&[&entry, &entry]);
        let extraction = extract_listing(&html);
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[0], extraction.records[1]);
    }

    #[test]
    fn test_empty_page() {
        let extraction = extract_listing("<html><body><p>Nothing here</p></body></html>");
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.report, ExtractionReport::default());
    }
}
