use cinerank_model::{CleanedRecord, DecadeAggregate};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;

/// Mean rating and movie count per decade, ascending by decade.
pub fn decade_means(records: &[CleanedRecord]) -> Vec<DecadeAggregate> {
    let mut sums: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = sums.entry(record.decade).or_insert((0.0, 0));
        entry.0 += record.rating;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(decade, (sum, count))| DecadeAggregate {
            decade,
            mean_rating: sum / count as f64,
            count,
        })
        .collect()
}

/// Half-open histogram bin `[lo, hi)`; the last bin also holds `hi`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

impl Bin {
    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}

/// Equal-width bins spanning the observed range.
///
/// A single repeated value is widened to `value +/- 0.5` so the bins keep a
/// non-zero width. No values, or zero bins, yields no bins.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let Some((mut lo, mut hi)) = range(values) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lo: lo + width * i as f64,
            hi: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for &value in values {
        let index = (((value - lo) / width) as usize).min(bins - 1);
        out[index].count += 1;
    }
    out
}

/// Gaussian kernel density estimate, sampled at `points` evenly spaced
/// positions across the data range.
///
/// Bandwidth follows Scott's rule: `n^(-1/5)` times the sample standard
/// deviation. Returns `None` when fewer than two distinct values exist,
/// since the bandwidth would be zero.
pub fn density_curve(values: &[f64], points: usize) -> Option<Vec<(f64, f64)>> {
    let (lo, hi) = range(values)?;
    let std = sample_std(values)?;
    if lo == hi || std == 0.0 || points < 2 {
        return None;
    }

    let n = values.len() as f64;
    let bandwidth = n.powf(-0.2) * std;
    let norm = 1.0 / (n * bandwidth * (2.0 * PI).sqrt());
    let step = (hi - lo) / (points - 1) as f64;

    let curve = (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let sum: f64 = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum();
            (x, sum * norm)
        })
        .collect();
    Some(curve)
}

fn range(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with one degree of freedom removed.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let below = pos.floor() as usize;
    let above = pos.ceil() as usize;
    sorted[below] + (pos - below as f64) * (sorted[above] - sorted[below])
}

/// Count, mean, spread and quartiles of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// `None` for a single observation.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Option<Summary> {
        let mean = mean(values)?;
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(Summary {
            count: sorted.len(),
            mean,
            std: sample_std(&sorted),
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Summaries of the rating, votes and year columns of the cleaned table.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub rating: Summary,
    pub votes: Summary,
    pub year: Summary,
}

pub fn describe(records: &[CleanedRecord]) -> Option<Description> {
    let rating: Vec<f64> = records.iter().map(|r| r.rating).collect();
    let votes: Vec<f64> = records.iter().map(|r| r.votes as f64).collect();
    let year: Vec<f64> = records.iter().map(|r| f64::from(r.year)).collect();

    Some(Description {
        rating: Summary::of(&rating)?,
        votes: Summary::of(&votes)?,
        year: Summary::of(&year)?,
    })
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = [
            ("IMDb_Rating", &self.rating),
            ("Votes", &self.votes),
            ("Year", &self.year),
        ];

        write!(f, "{:<6}", "")?;
        for (name, _) in &columns {
            write!(f, "{name:>16}")?;
        }
        writeln!(f)?;

        let rows: [(&str, fn(&Summary) -> Option<f64>); 8] = [
            ("count", |s| Some(s.count as f64)),
            ("mean", |s| Some(s.mean)),
            ("std", |s| s.std),
            ("min", |s| Some(s.min)),
            ("25%", |s| Some(s.q25)),
            ("50%", |s| Some(s.median)),
            ("75%", |s| Some(s.q75)),
            ("max", |s| Some(s.max)),
        ];
        for (label, pick) in rows {
            write!(f, "{label:<6}")?;
            for (_, summary) in &columns {
                match pick(summary) {
                    Some(value) => write!(f, "{value:>16.3}")?,
                    None => write!(f, "{:>16}", "NaN")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rank: u32, year: i32, rating: f64, votes: u64) -> CleanedRecord {
        CleanedRecord {
            rank,
            title: format!("Movie {rank}"),
            year,
            rating,
            votes,
            decade: cinerank_model::decade_of(year),
        }
    }

    #[test]
    fn test_decade_means_sorted_and_averaged() {
        let records = vec![
            record(1, 2001, 8.0, 10),
            record(2, 1994, 9.0, 10),
            record(3, 2008, 9.0, 10),
            record(4, 1957, 8.2, 10),
        ];

        let means = decade_means(&records);

        let decades: Vec<i32> = means.iter().map(|d| d.decade).collect();
        assert_eq!(decades, [1950, 1990, 2000]);
        assert_eq!(means[2].count, 2);
        assert!((means[2].mean_rating - 8.5).abs() < 1e-9);
        assert!((means[1].mean_rating - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_decade_means_empty() {
        assert!(decade_means(&[]).is_empty());
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [8.0, 8.1, 8.1, 8.3, 8.5, 8.6, 8.9, 9.0, 9.3];
        let bins = histogram(&values, 10);

        assert_eq!(bins.len(), 10);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].lo, 8.0);
        assert_eq!(bins[9].hi, 9.3);
        // Maximum lands in the closed last bin
        assert!(bins[9].count >= 1);
    }

    #[test]
    fn test_histogram_single_value_widened() {
        let bins = histogram(&[8.0, 8.0], 10);
        assert_eq!(bins.first().map(|b| b.lo), Some(7.5));
        assert_eq!(bins.last().map(|b| b.hi), Some(8.5));
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!(bins.iter().all(|b| b.width() > 0.0));
    }

    #[test]
    fn test_histogram_empty() {
        assert!(histogram(&[], 10).is_empty());
    }

    #[test]
    fn test_density_integrates_near_one() {
        let values = [8.0, 8.2, 8.3, 8.5, 8.5, 8.7, 9.0, 9.2];
        let curve = density_curve(&values, 400).unwrap();

        assert_eq!(curve.len(), 400);
        assert!(curve.iter().all(|(_, d)| *d > 0.0));
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        // Clipped to the data range, so somewhat less than one
        assert!(area > 0.5 && area < 1.05, "area {area}");
    }

    #[test]
    fn test_density_needs_spread() {
        assert!(density_curve(&[8.0], 100).is_none());
        assert!(density_curve(&[8.0, 8.0, 8.0], 100).is_none());
        assert!(density_curve(&[], 100).is_none());
    }

    #[test]
    fn test_summary_quartiles() {
        let summary = Summary::of(&[4.0, 1.0, 3.0, 2.0]).unwrap();

        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, 2.5);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 4.0);
        assert_eq!(summary.q25, 1.75);
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.q75, 3.25);
        let std = summary.std.unwrap();
        assert!((std - 1.290_994_448_7).abs() < 1e-9);
    }

    #[test]
    fn test_summary_single_value_has_no_std() {
        let summary = Summary::of(&[7.0]).unwrap();
        assert_eq!(summary.std, None);
        assert_eq!(summary.median, 7.0);
        assert!(Summary::of(&[]).is_none());
    }

    #[test]
    fn test_describe_table() {
        let records = vec![record(1, 1994, 9.3, 2_900_000), record(2, 1972, 9.2, 2_000_000)];
        let description = describe(&records).unwrap();

        assert_eq!(description.year.min, 1972.0);
        assert_eq!(description.votes.max, 2_900_000.0);

        let table = description.to_string();
        assert!(table.contains("IMDb_Rating"));
        assert!(table.lines().any(|l| l.starts_with("count")));
        assert_eq!(table.lines().count(), 9);
        assert!(describe(&[]).is_none());
    }
}
