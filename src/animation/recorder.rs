//! Animator driving the plot surface and the recording session.

use std::fmt;
use std::path::PathBuf;

use log::{debug, info};

use super::encoder::{EncodeError, VideoFormat, VideoSink};
use super::surface::{PlotSurface, RenderError};
use crate::frame::Frame;
use crate::schema::PlotConfig;

/// Lifecycle of an [`Animator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    /// Series empty, axes configured, encoder not started.
    Init,
    /// At least one frame rendered and pushed to the encoder.
    Animating,
    /// Terminal; the recording session is closed.
    Done,
}

/// Errors raised while animating.
#[derive(Debug, thiserror::Error)]
pub enum AnimationError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("Animation already finished")]
    Finished,
}

/// Renders frames in order and streams them to a [`VideoSink`].
///
/// Usage:
/// ```ignore
/// let mut animator = Animator::new(PlotConfig::default(), 20, encoder);
/// for item in run.frames() {
///     let (step, frame) = item?;
///     animator.render_frame(step, &frame)?;
/// }
/// if let Some(stats) = animator.finish()? {
///     println!("{}", stats);
/// }
/// ```
pub struct Animator<S: VideoSink> {
    surface: PlotSurface,
    sink: S,
    state: AnimatorState,
    fps: u32,
    /// Reused raster buffer.
    raster: Vec<u8>,
    frames_written: u64,
    first_step: Option<u64>,
    last_step: Option<u64>,
}

impl<S: VideoSink> Animator<S> {
    /// Create an animator in the `Init` state.
    pub fn new(plot: PlotConfig, fps: u32, sink: S) -> Self {
        Self {
            surface: PlotSurface::new(plot),
            sink,
            state: AnimatorState::Init,
            fps,
            raster: Vec::new(),
            frames_written: 0,
            first_step: None,
            last_step: None,
        }
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn surface(&self) -> &PlotSurface {
        &self.surface
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get number of frames encoded so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn video_format(&self) -> VideoFormat {
        let (width, height) = self.surface.dimensions();
        VideoFormat {
            width,
            height,
            fps: self.fps,
        }
    }

    /// Render one frame and hand it to the encoder.
    ///
    /// The first call starts the recording session.
    pub fn render_frame(&mut self, step: u64, frame: &Frame) -> Result<(), AnimationError> {
        match self.state {
            AnimatorState::Done => return Err(AnimationError::Finished),
            AnimatorState::Init => {
                let format = self.video_format();
                self.sink.begin(format)?;
                self.raster = vec![0u8; format.frame_size()];
                self.state = AnimatorState::Animating;
                debug!(
                    "recording started: {}x{} @ {} fps",
                    format.width, format.height, format.fps
                );
            }
            AnimatorState::Animating => {}
        }

        self.surface.update(frame);
        self.surface.rasterize(&mut self.raster)?;
        self.sink.push_frame(&self.raster)?;

        self.frames_written += 1;
        self.first_step.get_or_insert(step);
        self.last_step = Some(step);
        debug!("rendered step {} ({} frames)", step, self.frames_written);
        Ok(())
    }

    /// Move to `Done`, finalizing the recording session.
    ///
    /// Returns `None` when no frame was rendered; the encoder is never
    /// started in that case.
    pub fn finish(&mut self) -> Result<Option<RecordingStats>, AnimationError> {
        let previous = self.state;
        self.state = AnimatorState::Done;
        match previous {
            AnimatorState::Done => Err(AnimationError::Finished),
            AnimatorState::Init => Ok(None),
            AnimatorState::Animating => {
                let output = self.sink.finish()?;
                let format = self.video_format();
                let stats = RecordingStats {
                    frame_count: self.frames_written,
                    first_step: self.first_step.unwrap_or_default(),
                    last_step: self.last_step.unwrap_or_default(),
                    width: format.width,
                    height: format.height,
                    fps: format.fps,
                    output,
                };
                info!("recording finished: {}", stats);
                Ok(Some(stats))
            }
        }
    }

    /// Move to `Done`, discarding any recording in progress.
    pub fn abort(&mut self) {
        if self.state == AnimatorState::Animating {
            self.sink.abort();
        }
        self.state = AnimatorState::Done;
    }
}

/// Statistics from a recording session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingStats {
    /// Total frames encoded.
    pub frame_count: u64,
    /// Timestep of the first frame.
    pub first_step: u64,
    /// Timestep of the last frame.
    pub last_step: u64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Video file written.
    pub output: PathBuf,
}

impl RecordingStats {
    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frame_count as f64 / self.fps as f64
    }
}

impl fmt::Display for RecordingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames (steps {}..={}), {}x{} @ {} fps, {:.2}s -> {}",
            self.frame_count,
            self.first_step,
            self.last_step,
            self.width,
            self.height,
            self.fps,
            self.duration_secs(),
            self.output.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Sink recording every call.
    #[derive(Default)]
    struct ScriptedSink {
        format: Option<VideoFormat>,
        frames: Vec<Vec<u8>>,
        finished: bool,
        aborted: bool,
        fail_push: bool,
    }

    impl VideoSink for ScriptedSink {
        fn begin(&mut self, format: VideoFormat) -> Result<(), EncodeError> {
            if self.format.is_some() {
                return Err(EncodeError::AlreadyStarted);
            }
            self.format = Some(format);
            Ok(())
        }

        fn push_frame(&mut self, rgb: &[u8]) -> Result<(), EncodeError> {
            if self.fail_push {
                return Err(EncodeError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "encoder closed its input",
                )));
            }
            self.frames.push(rgb.to_vec());
            Ok(())
        }

        fn finish(&mut self) -> Result<PathBuf, EncodeError> {
            self.finished = true;
            Ok(PathBuf::from("scripted.mp4"))
        }

        fn abort(&mut self) {
            self.aborted = true;
        }
    }

    fn plot() -> PlotConfig {
        PlotConfig {
            width: 64,
            height: 32,
            x_range: (0.0, 4.0),
            line_width: 1,
            grid: false,
            annotate: false,
            ..PlotConfig::default()
        }
    }

    fn frame(e: f64, h: f64) -> Frame {
        Frame {
            e: vec![e; 4],
            h: vec![h; 3],
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut animator = Animator::new(plot(), 20, ScriptedSink::default());
        assert_eq!(animator.state(), AnimatorState::Init);
        assert!(animator.sink().format.is_none());

        animator.render_frame(50, &frame(0.5, 0.001)).unwrap();
        assert_eq!(animator.state(), AnimatorState::Animating);
        assert_eq!(
            animator.sink().format,
            Some(VideoFormat {
                width: 64,
                height: 32,
                fps: 20
            })
        );

        animator.render_frame(100, &frame(-0.5, -0.001)).unwrap();
        let stats = animator.finish().unwrap().unwrap();
        assert_eq!(animator.state(), AnimatorState::Done);
        assert!(animator.sink().finished);

        assert_eq!(stats.frame_count, 2);
        assert_eq!(stats.first_step, 50);
        assert_eq!(stats.last_step, 100);
        assert_eq!(stats.output, PathBuf::from("scripted.mp4"));
        assert!((stats.duration_secs() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_each_frame_is_one_raster() {
        let mut animator = Animator::new(plot(), 20, ScriptedSink::default());
        animator.render_frame(1, &frame(0.5, 0.0)).unwrap();
        animator.render_frame(2, &frame(-0.5, 0.0)).unwrap();
        animator.finish().unwrap();

        let frames = &animator.sink().frames;
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.len() == 64 * 32 * 3));
        assert_ne!(frames[0], frames[1]);
    }

    #[test]
    fn test_surface_reflects_latest_frame() {
        let mut animator = Animator::new(plot(), 20, ScriptedSink::default());
        animator.render_frame(1, &frame(0.5, 0.002)).unwrap();
        assert_eq!(animator.surface().e_values(), &[0.5; 4]);
        assert!(
            animator
                .surface()
                .h_values()
                .iter()
                .all(|v| (v - 0.2).abs() < 1e-12)
        );
    }

    #[test]
    fn test_empty_animation_never_starts_encoder() {
        let mut animator = Animator::new(plot(), 20, ScriptedSink::default());
        assert!(animator.finish().unwrap().is_none());
        assert_eq!(animator.state(), AnimatorState::Done);
        assert!(animator.sink().format.is_none());
        assert!(!animator.sink().finished);
    }

    #[test]
    fn test_done_is_terminal() {
        let mut animator = Animator::new(plot(), 20, ScriptedSink::default());
        animator.finish().unwrap();
        assert!(matches!(
            animator.render_frame(1, &frame(0.0, 0.0)),
            Err(AnimationError::Finished)
        ));
        assert!(matches!(animator.finish(), Err(AnimationError::Finished)));
    }

    #[test]
    fn test_abort_discards_session() {
        let mut animator = Animator::new(plot(), 20, ScriptedSink::default());
        animator.render_frame(1, &frame(0.0, 0.0)).unwrap();
        animator.abort();
        assert_eq!(animator.state(), AnimatorState::Done);
        assert!(animator.sink().aborted);
        assert!(!animator.sink().finished);
    }

    #[test]
    fn test_encode_error_propagates() {
        let sink = ScriptedSink {
            fail_push: true,
            ..Default::default()
        };
        let mut animator = Animator::new(plot(), 20, sink);
        assert!(matches!(
            animator.render_frame(1, &frame(0.0, 0.0)),
            Err(AnimationError::Encode(EncodeError::Io(_)))
        ));
    }
}
