//! Animation of decoded frames into a video.
//!
//! An [`Animator`] owns the [`PlotSurface`] and moves through three states:
//!
//! ```text
//! Init --first frame--> Animating --finish--> Done
//!   |                                          ^
//!   +-------------finish (no frames)-----------+
//! ```
//!
//! Each rendered frame is rasterized to RGB24 and streamed to a
//! [`VideoSink`]; [`FfmpegEncoder`] is the production sink.

mod encoder;
mod recorder;
mod surface;

pub use encoder::{EncodeError, FfmpegEncoder, VideoFormat, VideoSink};
pub use recorder::{AnimationError, Animator, AnimatorState, RecordingStats};
pub use surface::{PlotSurface, RenderError, load_font};
