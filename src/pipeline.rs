//! End-to-end run: locate frames, decode them in order, render, encode.

use log::{info, warn};

use crate::animation::{
    AnimationError, Animator, FfmpegEncoder, RecordingStats, VideoSink, load_font,
};
use crate::frame::{FrameError, FramePattern, Run, locate};
use crate::schema::{ConfigError, InputConfig, PlotConfig, VideoConfig};

/// Any failure that aborts a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Animation(#[from] AnimationError),
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A video was written.
    Encoded(RecordingStats),
    /// No frame files matched; nothing was written.
    NoFrames,
}

/// Locate the frame files described by `input`.
pub fn discover(input: &InputConfig) -> Result<Run, PipelineError> {
    let format = input.resolved_format()?;
    let pattern = FramePattern::parse(&input.pattern)
        .ok_or_else(|| ConfigError::InvalidPattern(input.pattern.clone()))?;
    let frames = locate(&input.dir, &pattern)?;
    Ok(Run::new(frames, format, input.cells))
}

/// Make text rendering possible, or turn it off.
fn prepare_plot(plot: &PlotConfig) -> PlotConfig {
    let mut plot = plot.clone();
    if plot.annotate {
        if let Err(err) = load_font(&plot.font) {
            warn!("{}; rendering without labels", err);
            plot.annotate = false;
        }
    }
    plot
}

/// Render every frame of the configured run into `sink`.
///
/// Frames are decoded one at a time in timestep order. Any error aborts the
/// run and the sink's session.
pub fn render_video<S: VideoSink>(
    config: &VideoConfig,
    sink: S,
) -> Result<RunOutcome, PipelineError> {
    config.validate()?;

    let run = discover(&config.input)?;
    if run.is_empty() {
        warn!(
            "no frames matching {:?} in {}; no video written",
            config.input.pattern,
            config.input.dir.display()
        );
        return Ok(RunOutcome::NoFrames);
    }
    run.preflight()?;

    info!(
        "rendering {} {:?} frames at {} fps ({} ms interval)",
        run.len(),
        run.format(),
        config.encoder.fps,
        config.encoder.interval_ms
    );

    let plot = prepare_plot(&config.plot);
    let mut animator = Animator::new(plot, config.encoder.fps, sink);

    for item in run.frames() {
        let rendered = item
            .map_err(PipelineError::from)
            .and_then(|(step, frame)| Ok(animator.render_frame(step, &frame)?));
        if let Err(err) = rendered {
            animator.abort();
            return Err(err);
        }
    }

    match animator.finish()? {
        Some(stats) => Ok(RunOutcome::Encoded(stats)),
        None => Ok(RunOutcome::NoFrames),
    }
}

/// Render the configured run to a video file with ffmpeg.
pub fn render_with_ffmpeg(config: &VideoConfig) -> Result<RunOutcome, PipelineError> {
    render_video(config, FfmpegEncoder::new(config.encoder.clone()))
}
