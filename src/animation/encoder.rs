//! Video encoding of rendered frames.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};

use log::{debug, warn};

use crate::schema::EncoderConfig;

/// Geometry and timing of the video being encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl VideoFormat {
    /// Bytes per RGB24 frame.
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Video encoding errors.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Failed to start encoder {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create output directory {}: {source}", dir.display())]
    OutputDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Encoder exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("Encoder I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Frame holds {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },
    #[error("Encoder session already started")]
    AlreadyStarted,
    #[error("Encoder session not started")]
    NotStarted,
    #[error("No frames to encode")]
    NoFrames,
}

/// Destination for rendered RGB24 frames.
///
/// A session is `begin`, any number of `push_frame`, then `finish` or `abort`.
pub trait VideoSink {
    fn begin(&mut self, format: VideoFormat) -> Result<(), EncodeError>;

    fn push_frame(&mut self, rgb: &[u8]) -> Result<(), EncodeError>;

    /// Complete the video and return the written file.
    fn finish(&mut self) -> Result<PathBuf, EncodeError>;

    /// Drop the session without producing a usable video.
    fn abort(&mut self);
}

impl<S: VideoSink + ?Sized> VideoSink for &mut S {
    fn begin(&mut self, format: VideoFormat) -> Result<(), EncodeError> {
        (**self).begin(format)
    }

    fn push_frame(&mut self, rgb: &[u8]) -> Result<(), EncodeError> {
        (**self).push_frame(rgb)
    }

    fn finish(&mut self) -> Result<PathBuf, EncodeError> {
        (**self).finish()
    }

    fn abort(&mut self) {
        (**self).abort()
    }
}

struct Session {
    child: Child,
    stdin: ChildStdin,
    format: VideoFormat,
    frames: u64,
}

/// Encodes through an `ffmpeg` child process fed raw RGB24 on stdin.
///
/// Usage:
/// ```ignore
/// let mut encoder = FfmpegEncoder::new(EncoderConfig::default());
/// encoder.begin(VideoFormat { width: 1000, height: 500, fps: 20 })?;
/// encoder.push_frame(&rgb)?;
/// let path = encoder.finish()?;
/// ```
pub struct FfmpegEncoder {
    config: EncoderConfig,
    session: Option<Session>,
}

impl FfmpegEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Full ffmpeg argument list for `format`.
    pub fn arguments(&self, format: &VideoFormat) -> Vec<String> {
        let config = &self.config;
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-nostats".into(),
            "-y".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "rgb24".into(),
            "-s".into(),
            format!("{}x{}", format.width, format.height),
            "-r".into(),
            format.fps.to_string(),
            "-i".into(),
            "-".into(),
            "-an".into(),
            "-vcodec".into(),
            config.codec.clone(),
            "-pix_fmt".into(),
            config.pixel_format.clone(),
            "-r".into(),
            format.fps.to_string(),
            config.output.display().to_string(),
        ]
    }

    /// Wait for ffmpeg after its stdin closed and report its exit.
    fn reap(session: Session) -> Result<(), EncodeError> {
        let Session { child, stdin, .. } = session;
        drop(stdin);
        let output = child.wait_with_output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(EncodeError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl VideoSink for FfmpegEncoder {
    fn begin(&mut self, format: VideoFormat) -> Result<(), EncodeError> {
        if self.session.is_some() {
            return Err(EncodeError::AlreadyStarted);
        }

        if let Some(dir) = self.config.output.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|source| EncodeError::OutputDir {
                    dir: dir.to_path_buf(),
                    source,
                })?;
            }
        }

        let args = self.arguments(&format);
        debug!("spawning {} {}", self.config.ffmpeg.display(), args.join(" "));

        let mut child = Command::new(&self.config.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EncodeError::Spawn {
                program: self.config.ffmpeg.clone(),
                source,
            })?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EncodeError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "encoder stdin unavailable",
            )));
        };

        self.session = Some(Session {
            child,
            stdin,
            format,
            frames: 0,
        });
        Ok(())
    }

    fn push_frame(&mut self, rgb: &[u8]) -> Result<(), EncodeError> {
        let session = self.session.as_mut().ok_or(EncodeError::NotStarted)?;
        let expected = session.format.frame_size();
        if rgb.len() != expected {
            return Err(EncodeError::FrameSize {
                expected,
                actual: rgb.len(),
            });
        }

        if let Err(err) = session.stdin.write_all(rgb) {
            // ffmpeg went away; its exit status says why.
            let Some(session) = self.session.take() else {
                return Err(err.into());
            };
            return Err(match Self::reap(session) {
                Ok(()) => err.into(),
                Err(failed) => failed,
            });
        }
        session.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<PathBuf, EncodeError> {
        let mut session = self.session.take().ok_or(EncodeError::NotStarted)?;
        if session.frames == 0 {
            let _ = session.child.kill();
            let _ = session.child.wait();
            return Err(EncodeError::NoFrames);
        }

        session.stdin.flush()?;
        let frames = session.frames;
        Self::reap(session)?;
        debug!(
            "encoder wrote {} frames to {}",
            frames,
            self.config.output.display()
        );
        Ok(self.config.output.clone())
    }

    fn abort(&mut self) {
        if let Some(mut session) = self.session.take() {
            warn!(
                "aborting encoder after {} frames; {} is incomplete",
                session.frames,
                self.config.output.display()
            );
            let _ = session.child.kill();
            let _ = session.child.wait();
        }
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.abort();
    }
}
