use cinerank_model::{decade_of, CleanedRecord, RawRecord};

/// How many rows went in, how many survived, and which fields were missing.
///
/// A row lacking several fields counts once under each of them, so the
/// per-field counts can add up to more than [`CleanReport::dropped`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub input: usize,
    pub kept: usize,
    pub missing_rank: usize,
    pub missing_year: usize,
    pub missing_rating: usize,
    pub missing_votes: usize,
}

impl CleanReport {
    pub fn dropped(&self) -> usize {
        self.input - self.kept
    }
}

/// Turn the raw table into the cleaned table.
///
/// The year token keeps only its ASCII digits and must then parse. Rows
/// missing a rank, year, rating or vote count are dropped; nothing is
/// defaulted. Votes are truncated toward zero. Surviving rows keep their
/// input order.
pub fn normalize(raw: &[RawRecord]) -> (Vec<CleanedRecord>, CleanReport) {
    let mut report = CleanReport {
        input: raw.len(),
        ..CleanReport::default()
    };

    let cleaned: Vec<CleanedRecord> = raw
        .iter()
        .filter_map(|record| {
            let rank = record.rank;
            let year = parse_year(&record.year_text);
            let rating = record.rating.filter(|r| !r.is_nan());
            let votes = record.votes.and_then(truncate_votes);

            report.missing_rank += usize::from(rank.is_none());
            report.missing_year += usize::from(year.is_none());
            report.missing_rating += usize::from(rating.is_none());
            report.missing_votes += usize::from(votes.is_none());

            let (rank, year, rating, votes) = (rank?, year?, rating?, votes?);
            Some(CleanedRecord {
                rank,
                title: record.title.clone(),
                year,
                rating,
                votes,
                decade: decade_of(year),
            })
        })
        .collect();

    report.kept = cleaned.len();
    (cleaned, report)
}

/// Strip everything but ASCII digits from a year token and parse the rest.
///
/// "(1994)" -> 1994, "N/A" -> None, "" -> None.
pub fn parse_year(year_text: &str) -> Option<i32> {
    let digits: String = year_text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Truncate a reconstructed vote count. Counts that are not finite or are
/// negative cannot be a number of votes and are treated as missing.
fn truncate_votes(votes: f64) -> Option<u64> {
    if !votes.is_finite() || votes < 0.0 {
        return None;
    }
    Some(votes.trunc() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        rank: Option<u32>,
        title: &str,
        year: &str,
        rating: Option<f64>,
        votes: Option<f64>,
    ) -> RawRecord {
        RawRecord {
            rank,
            title: title.to_string(),
            year_text: year.to_string(),
            rating,
            votes,
        }
    }

    #[test]
    fn test_complete_row_is_cleaned() {
        let (cleaned, report) = normalize(&[raw(Some(1), "Foo", "1994", Some(8.5), Some(2_300_000.0))]);
        assert_eq!(
            cleaned,
            vec![CleanedRecord {
                rank: 1,
                title: "Foo".into(),
                year: 1994,
                rating: 8.5,
                votes: 2_300_000,
                decade: 1990,
            }]
        );
        assert_eq!(report.kept, 1);
        assert_eq!(report.dropped(), 0);
    }

    #[test]
    fn test_incomplete_rows_dropped() {
        let rows = vec![
            raw(Some(1), "Keep", "2010", Some(8.0), Some(10.0)),
            raw(None, "No rank", "2010", Some(8.0), Some(10.0)),
            raw(Some(3), "No year", "N/A", Some(8.0), Some(10.0)),
            raw(Some(4), "No rating", "2010", None, Some(10.0)),
            raw(Some(5), "No votes", "2010", Some(8.0), None),
            raw(Some(6), "Nothing", "", None, None),
        ];

        let (cleaned, report) = normalize(&rows);

        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].title, "Keep");
        assert_eq!(report.input, 6);
        assert_eq!(report.dropped(), 5);
        assert_eq!(report.missing_rank, 1);
        assert_eq!(report.missing_year, 2);
        assert_eq!(report.missing_rating, 2);
        assert_eq!(report.missing_votes, 2);
    }

    #[test]
    fn test_rating_without_votes_and_votes_without_rating() {
        // Either half of the rating/votes pair missing drops the row
        let rows = vec![
            raw(Some(1), "Rating only", "2001", Some(7.7), None),
            raw(Some(2), "Votes only", "2001", None, Some(5_000.0)),
        ];
        let (cleaned, _) = normalize(&rows);
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_year_digits_extracted() {
        assert_eq!(parse_year("1994"), Some(1994));
        assert_eq!(parse_year("(1994)"), Some(1994));
        assert_eq!(parse_year(" 2001 "), Some(2001));
        assert_eq!(parse_year("N/A"), None);
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("99999999999999"), None);
    }

    #[test]
    fn test_votes_truncated() {
        let (cleaned, _) = normalize(&[raw(Some(9), "Frac", "1960", Some(8.1), Some(1_234.9))]);
        assert_eq!(cleaned[0].votes, 1_234);
    }

    #[test]
    fn test_non_finite_or_negative_votes_dropped() {
        let rows = vec![
            raw(Some(1), "NaN", "1960", Some(8.1), Some(f64::NAN)),
            raw(Some(2), "Inf", "1960", Some(8.1), Some(f64::INFINITY)),
            raw(Some(3), "Neg", "1960", Some(8.1), Some(-5.0)),
        ];
        let (cleaned, report) = normalize(&rows);
        assert!(cleaned.is_empty());
        assert_eq!(report.missing_votes, 3);
    }

    #[test]
    fn test_decade_invariant() {
        let rows: Vec<RawRecord> = [1921, 1950, 1959, 1994, 2000, 2024]
            .iter()
            .enumerate()
            .map(|(i, y)| raw(Some(i as u32 + 1), "T", &y.to_string(), Some(8.0), Some(1.0)))
            .collect();
        let (cleaned, _) = normalize(&rows);
        assert_eq!(cleaned.len(), rows.len());
        for record in &cleaned {
            assert_eq!(record.decade, 10 * (record.year / 10));
            assert_eq!(record.decade % 10, 0);
        }
    }

    #[test]
    fn test_order_preserved() {
        let rows = vec![
            raw(Some(3), "C", "2003", Some(8.0), Some(1.0)),
            raw(None, "skip", "2003", Some(8.0), Some(1.0)),
            raw(Some(1), "A", "2001", Some(8.0), Some(1.0)),
            raw(Some(2), "B", "2002", Some(8.0), Some(1.0)),
        ];
        let (cleaned, _) = normalize(&rows);
        let titles: Vec<&str> = cleaned.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["C", "A", "B"]);
    }

    #[test]
    fn test_idempotent_on_cleaned_table() {
        let rows = vec![
            raw(Some(1), "Foo", "(1994)", Some(8.5), Some(2_300_000.4)),
            raw(Some(2), "Bar", "1972", Some(9.2), Some(2_000_000.0)),
            raw(None, "Dropped", "1972", Some(9.2), Some(2_000_000.0)),
        ];
        let (first, _) = normalize(&rows);

        let again: Vec<RawRecord> = first.iter().map(RawRecord::from).collect();
        let (second, report) = normalize(&again);

        assert_eq!(second, first);
        assert_eq!(report.dropped(), 0);
    }
}
