use serde::{Deserialize, Deserializer, Serialize};

/// One listing entry as extracted from the page, before any cleaning.
///
/// Every field except the title may be missing. The year is kept as the raw
/// token from the page (e.g. "1994", "(1994)", "N/A"); the Normalizer decides
/// whether it parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Ordinal parsed from a leading "N." in the title text.
    #[serde(rename = "Rank", deserialize_with = "lenient_count")]
    pub rank: Option<u32>,
    /// Title with the ordinal prefix removed.
    #[serde(rename = "Title")]
    pub title: String,
    /// Free-form year token, "N/A" when the entry had no metadata.
    #[serde(rename = "Year")]
    pub year_text: String,
    #[serde(rename = "IMDb_Rating")]
    pub rating: Option<f64>,
    /// Vote count reconstructed from "2.1M" / "950K" / "12,345".
    /// Fractional values are possible until the Normalizer truncates them.
    #[serde(rename = "Votes")]
    pub votes: Option<f64>,
}

/// A fully populated record. Rows missing any field never become one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    #[serde(rename = "Rank")]
    pub rank: u32,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "IMDb_Rating")]
    pub rating: f64,
    #[serde(rename = "Votes")]
    pub votes: u64,
    #[serde(rename = "Decade")]
    pub decade: i32,
}

/// Mean rating of the records released in one decade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecadeAggregate {
    pub decade: i32,
    pub mean_rating: f64,
    pub count: usize,
}

/// Round a year down to the start of its decade (1994 -> 1990).
pub fn decade_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

impl From<&CleanedRecord> for RawRecord {
    fn from(record: &CleanedRecord) -> Self {
        RawRecord {
            rank: Some(record.rank),
            title: record.title.clone(),
            year_text: record.year.to_string(),
            rating: Some(record.rating),
            votes: Some(record.votes as f64),
        }
    }
}

/// Accept "", "12" and "12.0" for a nullable count column.
///
/// Tables written by pandas store a nullable integer column as floats, so a
/// raw checkpoint from the older tooling has ranks like "1.0".
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let Some(text) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if let Ok(n) = text.parse::<u32>() {
        return Ok(Some(n));
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_nan() => Ok(None),
        Ok(f) if f.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&f) => Ok(Some(f as u32)),
        _ => Err(D::Error::custom(format!("invalid count: {text:?}"))),
    }
}
