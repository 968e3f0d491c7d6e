use plotters::style::RGBColor;
use std::path::{Path, PathBuf};

/// One output image: file name and pixel size.
#[derive(Debug, Clone)]
pub struct Figure {
    pub file_name: String,
    pub size: (u32, u32),
}

impl Figure {
    fn new(file_name: &str, size: (u32, u32)) -> Self {
        Figure {
            file_name: file_name.to_string(),
            size,
        }
    }
}

/// Everything the chart renderers need to know about styling and output.
///
/// Passed explicitly to each renderer; nothing is read from global plot state.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub output_dir: PathBuf,
    pub distribution: Figure,
    pub decade_trend: Figure,
    pub scatter: Figure,

    pub title_font_size: u32,
    pub label_font_size: u32,
    pub annotation_font_size: u32,

    pub background: RGBColor,
    pub grid_color: RGBColor,

    pub histogram_bins: usize,
    pub histogram_fill: RGBColor,
    pub density_color: RGBColor,

    pub trend_color: RGBColor,
    pub trend_line_width: u32,
    pub trend_marker_size: u32,

    pub point_size: u32,
    pub point_alpha: f64,
}

impl RenderConfig {
    pub fn in_dir(output_dir: impl AsRef<Path>) -> Self {
        RenderConfig {
            output_dir: output_dir.as_ref().to_path_buf(),
            ..RenderConfig::default()
        }
    }

    pub fn path_of(&self, figure: &Figure) -> PathBuf {
        self.output_dir.join(&figure.file_name)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            output_dir: PathBuf::from("."),
            distribution: Figure::new("rating_distribution.png", (1000, 600)),
            decade_trend: Figure::new("rating_by_decade.png", (1200, 700)),
            scatter: Figure::new("rating_vs_votes.png", (1000, 600)),

            title_font_size: 28,
            label_font_size: 18,
            annotation_font_size: 14,

            background: RGBColor(255, 255, 255),
            grid_color: RGBColor(221, 221, 221),

            histogram_bins: 10,
            histogram_fill: RGBColor(135, 206, 235), // skyblue
            density_color: RGBColor(70, 130, 180),   // steelblue

            trend_color: RGBColor(255, 140, 0), // darkorange
            trend_line_width: 3,
            trend_marker_size: 6,

            point_size: 7,
            point_alpha: 0.6,
        }
    }
}
