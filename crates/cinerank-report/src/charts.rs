use crate::config::{Figure, RenderConfig};
use crate::stats::{decade_means, density_curve, histogram};
use cinerank_model::CleanedRecord;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::NamedTempFile;
use thiserror::Error;

const FONT: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const DENSITY_POINTS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    Distribution,
    DecadeTrend,
    Scatter,
}

impl Chart {
    pub const ALL: [Chart; 3] = [Chart::Distribution, Chart::DecadeTrend, Chart::Scatter];

    pub fn figure<'a>(&self, config: &'a RenderConfig) -> &'a Figure {
        match self {
            Chart::Distribution => &config.distribution,
            Chart::DecadeTrend => &config.decade_trend,
            Chart::Scatter => &config.scatter,
        }
    }

    /// Caption drawn above the plot.
    pub fn title(&self) -> &'static str {
        match self {
            Chart::Distribution => "Distribution of IMDb Ratings for Top Movies",
            Chart::DecadeTrend => "Average IMDb Rating Trend by Decade (Top Movies)",
            Chart::Scatter => "IMDb Rating vs. Total Votes (Log Scale)",
        }
    }
}

impl fmt::Display for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Chart::Distribution => "rating distribution",
            Chart::DecadeTrend => "rating by decade",
            Chart::Scatter => "rating vs votes",
        })
    }
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no data to plot")]
    Empty,

    #[error("font unavailable: {0}")]
    Font(String),

    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("could not write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Draw(e.to_string())
    }
}

/// Render one chart into its configured file.
pub fn render(chart: Chart, records: &[CleanedRecord], config: &RenderConfig) -> Result<PathBuf, ChartError> {
    match chart {
        Chart::Distribution => render_distribution(records, config),
        Chart::DecadeTrend => render_decade_trend(records, config),
        Chart::Scatter => render_scatter(records, config),
    }
}

/// Histogram of ratings with a density curve scaled to counts.
pub fn render_distribution(records: &[CleanedRecord], config: &RenderConfig) -> Result<PathBuf, ChartError> {
    let ratings: Vec<f64> = records.iter().map(|r| r.rating).collect();
    let bins = histogram(&ratings, config.histogram_bins);
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Err(ChartError::Empty);
    };
    let (x_lo, x_hi) = (first.lo, last.hi);

    // Density is per unit rating; multiply by n * bin width to share the count axis
    let scale = ratings.len() as f64 * first.width();
    let curve: Option<Vec<(f64, f64)>> = density_curve(&ratings, DENSITY_POINTS)
        .map(|c| c.into_iter().map(|(x, d)| (x, d * scale)).collect());

    let tallest_bin = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let tallest_curve = curve
        .iter()
        .flatten()
        .map(|(_, y)| *y)
        .fold(0.0, f64::max);
    let y_hi = tallest_bin.max(tallest_curve).max(1.0) * 1.1;

    let figure = &config.distribution;
    let path = config.path_of(figure);
    let tmp = temp_png(&path)?;
    {
        let root = open_canvas(tmp.path(), figure, config)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                Chart::Distribution.title(),
                (FONT, config.title_font_size).into_font(),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(config.grid_color.stroke_width(1))
            .light_line_style(config.background.stroke_width(0))
            .x_desc("IMDb Rating")
            .y_desc("Number of Movies")
            .label_style((FONT, config.label_font_size))
            .axis_desc_style((FONT, config.label_font_size))
            .x_label_formatter(&|x| format!("{x:.1}"))
            .y_label_formatter(&|y| format!("{y:.0}"))
            .draw()?;

        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.lo, 0.0), (b.hi, b.count as f64)], config.histogram_fill.filled())
        }))?;
        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.lo, 0.0), (b.hi, b.count as f64)], BLACK.mix(0.6).stroke_width(1))
        }))?;

        if let Some(curve) = curve {
            chart.draw_series(LineSeries::new(curve, config.density_color.stroke_width(2)))?;
        }

        root.present()?;
    }
    persist(tmp, &path)?;
    Ok(path)
}

/// Mean rating per decade as a line with a labelled marker at each decade.
pub fn render_decade_trend(records: &[CleanedRecord], config: &RenderConfig) -> Result<PathBuf, ChartError> {
    let means = decade_means(records);
    let (Some(first), Some(last)) = (means.first(), means.last()) else {
        return Err(ChartError::Empty);
    };
    let x_lo = f64::from(first.decade) - 5.0;
    let x_hi = f64::from(last.decade) + 5.0;
    let (y_lo, y_hi) = means.iter().fold((f64::MAX, f64::MIN), |(lo, hi), d| {
        (lo.min(d.mean_rating), hi.max(d.mean_rating))
    });
    // Headroom for the value labels above each marker
    let (y_lo, y_hi) = (y_lo - 0.1, y_hi + 0.15);

    let figure = &config.decade_trend;
    let path = config.path_of(figure);
    let tmp = temp_png(&path)?;
    {
        let root = open_canvas(tmp.path(), figure, config)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                Chart::DecadeTrend.title(),
                (FONT, config.title_font_size).into_font(),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .bold_line_style(config.grid_color.stroke_width(1))
            .light_line_style(config.background.stroke_width(0))
            .x_labels(means.len() + 2)
            .x_desc("Decade")
            .y_desc("Average IMDb Rating")
            .label_style((FONT, config.label_font_size))
            .axis_desc_style((FONT, config.label_font_size))
            .x_label_formatter(&|x| format!("{x:.0}"))
            .y_label_formatter(&|y| format!("{y:.2}"))
            .draw()?;

        let points: Vec<(f64, f64)> = means
            .iter()
            .map(|d| (f64::from(d.decade), d.mean_rating))
            .collect();

        chart.draw_series(LineSeries::new(
            points.iter().copied(),
            config.trend_color.stroke_width(config.trend_line_width),
        ))?;

        let label_font = (FONT, config.annotation_font_size).into_font();
        chart.draw_series(points.iter().map(|&(x, y)| {
            EmptyElement::at((x, y))
                + Circle::new((0, 0), config.trend_marker_size, config.trend_color.filled())
                + Text::new(format!("{y:.2}"), (-14, -24), label_font.clone())
        }))?;

        root.present()?;
    }
    persist(tmp, &path)?;
    Ok(path)
}

/// Rating against log-scaled vote count, one colour per decade.
///
/// Log axes cannot show zero, so movies with no votes are left out.
pub fn render_scatter(records: &[CleanedRecord], config: &RenderConfig) -> Result<PathBuf, ChartError> {
    let points: Vec<&CleanedRecord> = records.iter().filter(|r| r.votes > 0).collect();
    if points.is_empty() {
        return Err(ChartError::Empty);
    }

    let (mut x_lo, mut x_hi) = points.iter().fold((f64::MAX, f64::MIN), |(lo, hi), r| {
        (lo.min(r.rating), hi.max(r.rating))
    });
    if x_lo == x_hi {
        x_lo -= 0.5;
        x_hi += 0.5;
    }
    let (x_lo, x_hi) = (x_lo - 0.1, x_hi + 0.1);

    let (v_lo, v_hi) = points.iter().fold((u64::MAX, 0), |(lo, hi), r| {
        (lo.min(r.votes), hi.max(r.votes))
    });
    let (y_lo, y_hi) = (v_lo as f64 * 0.8, v_hi as f64 * 1.25);

    let decades: BTreeSet<i32> = points.iter().map(|r| r.decade).collect();
    let (d_lo, d_hi) = match (decades.first(), decades.last()) {
        (Some(&lo), Some(&hi)) => (f64::from(lo), f64::from(hi)),
        _ => return Err(ChartError::Empty),
    };

    let figure = &config.scatter;
    let path = config.path_of(figure);
    let tmp = temp_png(&path)?;
    {
        let root = open_canvas(tmp.path(), figure, config)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                Chart::Scatter.title(),
                (FONT, config.title_font_size).into_font(),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(x_lo..x_hi, (y_lo..y_hi).log_scale())?;

        chart
            .configure_mesh()
            .bold_line_style(config.grid_color.stroke_width(1))
            .light_line_style(config.background.stroke_width(0))
            .x_desc("IMDb Rating")
            .y_desc("Number of Votes (Log Scale)")
            .label_style((FONT, config.label_font_size))
            .axis_desc_style((FONT, config.label_font_size))
            .x_label_formatter(&|x| format!("{x:.1}"))
            .y_label_formatter(&|y| format_votes(*y))
            .draw()?;

        for &decade in &decades {
            let color = decade_color(f64::from(decade), d_lo, d_hi);
            chart
                .draw_series(points.iter().filter(|r| r.decade == decade).map(|r| {
                    Circle::new(
                        (r.rating, r.votes as f64),
                        config.point_size,
                        color.mix(config.point_alpha).filled(),
                    )
                }))?
                .label(decade.to_string())
                .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(config.background.mix(0.85))
            .border_style(BLACK.mix(0.4))
            .label_font((FONT, config.annotation_font_size))
            .draw()?;

        root.present()?;
    }
    persist(tmp, &path)?;
    Ok(path)
}

/// Position on the viridis ramp proportional to where the decade falls
/// between the earliest and latest plotted decades.
fn decade_color(decade: f64, lo: f64, hi: f64) -> RGBColor {
    let t = if hi > lo { (decade - lo) / (hi - lo) } else { 0.5 };
    ViridisRGB.get_color(t as f32)
}

fn format_votes(votes: f64) -> String {
    if votes >= 1_000_000.0 {
        format!("{:.1}M", votes / 1_000_000.0)
    } else if votes >= 1_000.0 {
        format!("{:.0}K", votes / 1_000.0)
    } else {
        format!("{votes:.0}")
    }
}

/// The bundled font is registered once per process under the family name
/// every chart asks for, so rendering never depends on system fonts.
fn ensure_font() -> Result<(), ChartError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            register_font(FONT, FontStyle::Normal, FONT_BYTES)
                .map_err(|_| "bundled DejaVuSans.ttf could not be parsed".to_string())
        })
        .clone()
        .map_err(ChartError::Font)
}

fn open_canvas<'a>(
    file: &'a Path,
    figure: &Figure,
    config: &RenderConfig,
) -> Result<DrawingArea<BitMapBackend<'a>, Shift>, ChartError> {
    ensure_font()?;
    let root = BitMapBackend::new(file, figure.size).into_drawing_area();
    root.fill(&config.background)?;
    Ok(root)
}

/// A temporary `.png` beside the destination, so a finished chart replaces
/// the old file in one rename.
fn temp_png(path: &Path) -> Result<NamedTempFile, ChartError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let tmp = tempfile::Builder::new()
        .prefix(".cinerank-chart")
        .suffix(".png")
        .tempfile_in(dir)?;
    Ok(tmp)
}

fn persist(tmp: NamedTempFile, path: &Path) -> Result<(), ChartError> {
    tmp.persist(path).map_err(|source| ChartError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Chart written");
    Ok(())
}
