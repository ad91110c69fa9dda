//! FDTD Video - Render 1D FDTD field snapshots into an animated video.
//!
//! An external simulator writes one file per timestep holding the electric
//! field E (N samples) and the magnetic field H (N-1 samples, staggered grid).
//! This crate turns such a run into a single video.
//!
//! # Architecture
//!
//! - `frame`: locating frame files and decoding the text and binary layouts
//! - `animation`: plot surface, animator state machine and video encoding
//! - `schema`: configuration types
//! - `pipeline`: the end-to-end run
//!
//! # Example
//!
//! ```rust,no_run
//! use fdtd_video::{RunOutcome, VideoConfig, render_with_ffmpeg};
//!
//! let mut config = VideoConfig::default();
//! config.input.pattern = "frame_*.bin".to_string();
//!
//! match render_with_ffmpeg(&config)? {
//!     RunOutcome::Encoded(stats) => println!("wrote {}", stats),
//!     RunOutcome::NoFrames => println!("nothing to render"),
//! }
//! # Ok::<(), fdtd_video::PipelineError>(())
//! ```

pub mod animation;
pub mod frame;
pub mod pipeline;
pub mod schema;

// Re-export commonly used types
pub use frame::{Frame, FrameError, FrameFormat, Run};
pub use pipeline::{PipelineError, RunOutcome, render_video, render_with_ffmpeg};
pub use schema::{ConfigError, VideoConfig};
