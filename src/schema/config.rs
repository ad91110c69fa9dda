//! Configuration types for video rendering runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::frame::FrameFormat;

/// Top-level rendering configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Where frame files live and how to read them.
    pub input: InputConfig,
    /// Figure styling and axis limits.
    pub plot: PlotConfig,
    /// Video output settings.
    pub encoder: EncoderConfig,
}

/// Frame discovery and decoding parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory scanned for frame files.
    pub dir: PathBuf,
    /// File name pattern; the single `*` stands for the timestep index.
    pub pattern: String,
    /// Record layout. Inferred from the pattern extension when absent.
    pub format: Option<FrameFormat>,
    /// Domain cell count N shared with the simulator.
    pub cells: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            pattern: "frame_*.csv".to_string(),
            format: None,
            cells: 10_000,
        }
    }
}

impl InputConfig {
    /// Resolve the record layout, falling back to the pattern's extension.
    pub fn resolved_format(&self) -> Result<FrameFormat, ConfigError> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        let ext = self
            .pattern
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();
        FrameFormat::from_extension(ext).ok_or_else(|| ConfigError::UnknownExtension {
            pattern: self.pattern.clone(),
        })
    }
}

/// Plot surface styling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Static x-axis limits.
    pub x_range: (f64, f64),
    /// Static y-axis limits.
    pub y_range: (f64, f64),
    /// Display multiplier applied to H only.
    pub h_scale: f64,
    pub x_label: String,
    pub y_label: String,
    /// Legend entry for the E series.
    pub e_label: String,
    /// Legend entry for the H series.
    pub h_label: String,
    pub e_color: [u8; 3],
    pub h_color: [u8; 3],
    pub background: [u8; 3],
    /// Series stroke width in pixels.
    pub line_width: u32,
    /// TrueType font used for all text.
    pub font: PathBuf,
    /// Draw the mesh grid.
    pub grid: bool,
    /// Draw text: axis labels, tick labels and legend.
    pub annotate: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            x_range: (0.0, 10_000.0),
            y_range: (-1.0, 1.0),
            h_scale: 100.0,
            x_label: "Cell index".to_string(),
            y_label: "Field amplitude".to_string(),
            e_label: "Electric Field (E)".to_string(),
            h_label: "Magnetic Field (H)".to_string(),
            e_color: [0, 0, 255],
            h_color: [255, 0, 0],
            background: [255, 255, 255],
            line_width: 2,
            font: PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
            grid: true,
            annotate: true,
        }
    }
}

/// Video encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Output video file; overwritten if present.
    pub output: PathBuf,
    /// Codec passed to ffmpeg's `-vcodec`.
    pub codec: String,
    /// Output frame rate.
    pub fps: u32,
    /// Nominal delay between logical frames. Informational only.
    pub interval_ms: u32,
    /// ffmpeg executable name or path.
    pub ffmpeg: PathBuf,
    /// Output pixel format.
    pub pixel_format: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("wave_animation.mp4"),
            codec: "libx264".to_string(),
            fps: 20,
            interval_ms: 50,
            ffmpeg: PathBuf::from("ffmpeg"),
            pixel_format: "yuv420p".to_string(),
        }
    }
}

fn valid_range((lo, hi): (f64, f64)) -> bool {
    lo.is_finite() && hi.is_finite() && lo < hi
}

impl VideoConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let input = &self.input;
        if input.cells == 0 {
            return Err(ConfigError::InvalidCellCount);
        }
        if input.pattern.matches('*').count() != 1 {
            return Err(ConfigError::InvalidPattern(input.pattern.clone()));
        }
        input.resolved_format()?;

        let plot = &self.plot;
        if plot.width == 0 || plot.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if plot.width % 2 != 0 || plot.height % 2 != 0 {
            return Err(ConfigError::OddDimensions {
                width: plot.width,
                height: plot.height,
            });
        }
        if !valid_range(plot.x_range) {
            return Err(ConfigError::InvalidAxisRange { axis: 'x' });
        }
        if !valid_range(plot.y_range) {
            return Err(ConfigError::InvalidAxisRange { axis: 'y' });
        }
        if !plot.h_scale.is_finite() {
            return Err(ConfigError::InvalidScale);
        }
        if plot.line_width == 0 {
            return Err(ConfigError::InvalidLineWidth);
        }

        let encoder = &self.encoder;
        if encoder.fps == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }
        if encoder.codec.is_empty() {
            return Err(ConfigError::Empty("encoder.codec"));
        }
        if encoder.output.as_os_str().is_empty() {
            return Err(ConfigError::Empty("encoder.output"));
        }
        if encoder.ffmpeg.as_os_str().is_empty() {
            return Err(ConfigError::Empty("encoder.ffmpeg"));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cell count must be non-zero")]
    InvalidCellCount,
    #[error("Pattern {0:?} must contain exactly one '*'")]
    InvalidPattern(String),
    #[error("Cannot infer frame format from pattern {pattern:?}; set input.format")]
    UnknownExtension { pattern: String },
    #[error("Plot dimensions must be non-zero")]
    InvalidDimensions,
    #[error("Plot dimensions {width}x{height} must be even for the encoder")]
    OddDimensions { width: u32, height: u32 },
    #[error("The {axis} axis range must be finite and increasing")]
    InvalidAxisRange { axis: char },
    #[error("H display scale must be finite")]
    InvalidScale,
    #[error("Line width must be non-zero")]
    InvalidLineWidth,
    #[error("Frame rate must be non-zero")]
    InvalidFrameRate,
    #[error("{0} must not be empty")]
    Empty(&'static str),
}
