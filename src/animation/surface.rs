//! Plot surface holding the E and H line series.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};

use crate::frame::Frame;
use crate::schema::PlotConfig;

/// Rasterization failure.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Raster buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("Plot drawing failed: {0}")]
    Draw(String),
    #[error("Cannot load font {path}: {source}")]
    Font {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Family name plotters looks up for labels and legends.
const FONT_FAMILY: &str = "sans-serif";

static FONT_LOADED: OnceLock<()> = OnceLock::new();

/// Load the TrueType font used for axis labels and the legend.
///
/// Fonts are process-global; only the first successful call has an effect.
pub fn load_font(path: &Path) -> Result<(), RenderError> {
    if FONT_LOADED.get().is_some() {
        return Ok(());
    }
    let bytes = fs::read(path).map_err(|source| RenderError::Font {
        path: path.display().to_string(),
        source,
    })?;
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(FONT_FAMILY, FontStyle::Normal, bytes).map_err(|_| RenderError::Font {
        path: path.display().to_string(),
        source: io::Error::new(io::ErrorKind::InvalidData, "not a TrueType font"),
    })?;
    let _ = FONT_LOADED.set(());
    Ok(())
}

fn draw_err<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Draw(err.to_string())
}

fn rgb([r, g, b]: [u8; 3]) -> RGBColor {
    RGBColor(r, g, b)
}

/// Split a series into drawable polylines.
///
/// Non-finite samples break the line. Finite samples are pulled into a band
/// one axis span beyond `y_range` so pixel coordinates stay within `i32`.
fn polylines(
    points: impl Iterator<Item = (f64, f64)>,
    (y0, y1): (f64, f64),
) -> Vec<Vec<(f64, f64)>> {
    let span = (y1 - y0).abs();
    let (low, high) = (y0.min(y1) - span, y0.max(y1) + span);

    let mut lines = Vec::new();
    let mut current = Vec::new();
    for (x, y) in points {
        if y.is_finite() {
            current.push((x, y.max(low).min(high)));
        } else if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Two-series line plot with static axes.
///
/// The series buffers are overwritten in place on every [`update`](Self::update).
#[derive(Debug, Clone)]
pub struct PlotSurface {
    config: PlotConfig,
    e: Vec<f64>,
    h: Vec<f64>,
}

impl PlotSurface {
    /// Create an empty surface.
    pub fn new(config: PlotConfig) -> Self {
        Self {
            config,
            e: Vec::new(),
            h: Vec::new(),
        }
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Replace both series with a frame's data. H is multiplied by the
    /// display scale.
    pub fn update(&mut self, frame: &Frame) {
        self.e.clear();
        self.e.extend_from_slice(&frame.e);

        let scale = self.config.h_scale;
        self.h.clear();
        self.h.extend(frame.h.iter().map(|v| v * scale));
    }

    /// Empty both series.
    pub fn clear(&mut self) {
        self.e.clear();
        self.h.clear();
    }

    /// E values as plotted.
    pub fn e_values(&self) -> &[f64] {
        &self.e
    }

    /// H values as plotted, after scaling.
    pub fn h_values(&self) -> &[f64] {
        &self.h
    }

    /// E series points, x being the cell index.
    pub fn e_series(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.e.iter().enumerate().map(|(i, &v)| (i as f64, v))
    }

    /// H series points, x being the cell index.
    pub fn h_series(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.h.iter().enumerate().map(|(i, &v)| (i as f64, v))
    }

    /// Raster dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Size of one RGB24 raster in bytes.
    pub fn raster_size(&self) -> usize {
        self.config.width as usize * self.config.height as usize * 3
    }

    /// Draw the current series into an RGB24 buffer.
    pub fn rasterize(&self, buffer: &mut [u8]) -> Result<(), RenderError> {
        let expected = self.raster_size();
        if buffer.len() != expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: buffer.len(),
            });
        }

        let config = &self.config;
        let e_color = rgb(config.e_color);
        let h_color = rgb(config.h_color);

        let root = BitMapBackend::with_buffer(buffer, self.dimensions()).into_drawing_area();
        root.fill(&rgb(config.background)).map_err(draw_err)?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if config.annotate {
            builder.x_label_area_size(40).y_label_area_size(60);
        }
        let (x0, x1) = config.x_range;
        let (y0, y1) = config.y_range;
        let mut chart = builder
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(draw_err)?;

        // Without label areas the mesh draws grid lines only.
        if config.grid || config.annotate {
            let mut mesh = chart.configure_mesh();
            if !config.grid {
                mesh.disable_mesh();
            }
            if !config.annotate {
                mesh.disable_x_axis().disable_y_axis();
            }
            mesh.x_desc(config.x_label.as_str())
                .y_desc(config.y_label.as_str())
                .draw()
                .map_err(draw_err)?;
        }

        let e_style = e_color.stroke_width(config.line_width);
        chart
            .draw_series(
                polylines(self.e_series(), config.y_range)
                    .into_iter()
                    .map(|line| PathElement::new(line, e_style)),
            )
            .map_err(draw_err)?
            .label(config.e_label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], e_color));

        let h_style = h_color.stroke_width(config.line_width);
        chart
            .draw_series(
                polylines(self.h_series(), config.y_range)
                    .into_iter()
                    .map(|line| PathElement::new(line, h_style)),
            )
            .map_err(draw_err)?
            .label(config.h_label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], h_color));

        if config.annotate {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }
}
