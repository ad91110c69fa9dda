//! Ordered frame sequence for one simulation run.

use std::fs;
use std::iter::FusedIterator;

use log::debug;

use super::{Frame, FrameError, FrameFormat, LocatedFrame};

/// The ordered frame files of one run and how to decode them.
///
/// Usage:
/// ```ignore
/// let run = Run::new(locate("data", &pattern)?, FrameFormat::Binary, 10_000);
/// run.preflight()?;
///
/// for item in run.frames() {
///     let (step, frame) = item?;
///     // Use frame...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Run {
    frames: Vec<LocatedFrame>,
    format: FrameFormat,
    cells: usize,
}

impl Run {
    /// `frames` must already be in timestep order, as `locate` returns them.
    pub fn new(frames: Vec<LocatedFrame>, format: FrameFormat, cells: usize) -> Self {
        Self {
            frames,
            format,
            cells,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Configured domain cell count.
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Frame files in render order.
    pub fn located(&self) -> &[LocatedFrame] {
        &self.frames
    }

    /// Check every file's size against the layout without reading contents.
    ///
    /// Catches truncated binary frames before any rendering starts.
    pub fn preflight(&self) -> Result<(), FrameError> {
        let Some(minimum) = self.format.minimum_size(self.cells) else {
            return Ok(());
        };

        for located in &self.frames {
            let actual = fs::metadata(&located.path)
                .map_err(|source| FrameError::Io {
                    path: located.path.clone(),
                    source,
                })?
                .len();
            if actual < minimum {
                return Err(FrameError::IncompleteFrame {
                    path: located.path.clone(),
                    expected: minimum,
                    actual,
                });
            }
        }

        debug!("preflight passed for {} frames", self.frames.len());
        Ok(())
    }

    /// Decode the frame at `index` in render order.
    pub fn decode(&self, index: usize) -> Option<Result<Frame, FrameError>> {
        let located = self.frames.get(index)?;
        Some(self.format.decode(&located.path, self.cells))
    }

    /// Lazily decode frames in order, one file per step.
    ///
    /// Each call starts over from the first frame.
    pub fn frames(&self) -> FrameIter<'_> {
        FrameIter {
            run: self,
            current: 0,
            shape: None,
        }
    }
}

/// Iterator over decoded frames, yielding `(timestep, frame)`.
///
/// Every frame must have the shape of the first one. Iteration stops after
/// the first error.
pub struct FrameIter<'a> {
    run: &'a Run,
    current: usize,
    shape: Option<(usize, usize)>,
}

impl<'a> FrameIter<'a> {
    fn check_shape(&mut self, located: &LocatedFrame, frame: &Frame) -> Result<(), FrameError> {
        let found = frame.shape();
        match self.shape {
            None => {
                self.shape = Some(found);
                Ok(())
            }
            Some(expected) if expected == found => Ok(()),
            Some(expected) => Err(FrameError::ShapeMismatch {
                path: located.path.clone(),
                expected,
                found,
            }),
        }
    }
}

impl<'a> Iterator for FrameIter<'a> {
    type Item = Result<(u64, Frame), FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        let run = self.run;
        let located = run.frames.get(self.current)?;
        self.current += 1;

        let result = run
            .format
            .decode(&located.path, run.cells)
            .and_then(|frame| {
                self.check_shape(located, &frame)?;
                Ok((located.step, frame))
            });

        if result.is_err() {
            self.current = run.frames.len();
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.run.frames.len() - self.current;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for FrameIter<'a> {}

impl<'a> FusedIterator for FrameIter<'a> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FramePattern, encode_binary, locate, write_text};
    use std::path::Path;
    use tempfile::tempdir;

    fn pulse(cells: usize, step: u64) -> Frame {
        Frame {
            e: (0..cells).map(|i| (i as f64 - step as f64).cos()).collect(),
            h: (0..cells - 1).map(|i| i as f64 * 1e-3).collect(),
        }
    }

    fn write_binary_run(dir: &Path, cells: usize, steps: &[u64]) {
        for &step in steps {
            let path = dir.join(format!("frame_{}.bin", step));
            fs::write(path, encode_binary(&pulse(cells, step))).unwrap();
        }
    }

    fn binary_run(dir: &Path, cells: usize) -> Run {
        let pattern = FramePattern::parse("frame_*.bin").unwrap();
        Run::new(locate(dir, &pattern).unwrap(), FrameFormat::Binary, cells)
    }

    #[test]
    fn test_frames_in_step_order() {
        let dir = tempdir().unwrap();
        write_binary_run(dir.path(), 8, &[100, 50, 150]);

        let run = binary_run(dir.path(), 8);
        assert_eq!(run.len(), 3);

        let frames: Vec<_> = run.frames().map(|r| r.unwrap()).collect();
        assert_eq!(
            frames.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            vec![50, 100, 150]
        );
        for (step, frame) in &frames {
            assert_eq!(frame, &pulse(8, *step));
            assert_eq!(frame.shape(), (8, 7));
        }
    }

    #[test]
    fn test_frames_restartable() {
        let dir = tempdir().unwrap();
        write_binary_run(dir.path(), 4, &[1, 2]);
        let run = binary_run(dir.path(), 4);

        let mut iter = run.frames();
        assert_eq!(iter.len(), 2);
        iter.next().unwrap().unwrap();
        assert_eq!(iter.len(), 1);

        assert_eq!(run.frames().count(), 2);
    }

    #[test]
    fn test_frames_are_decoded_lazily() {
        let dir = tempdir().unwrap();
        write_binary_run(dir.path(), 4, &[1, 2]);
        let run = binary_run(dir.path(), 4);

        let mut iter = run.frames();
        iter.next().unwrap().unwrap();
        // Truncating a file after the run is built only affects its own step.
        fs::write(dir.path().join("frame_2.bin"), [0u8; 3]).unwrap();
        assert!(matches!(
            iter.next(),
            Some(Err(FrameError::IncompleteFrame { actual: 3, .. }))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_preflight_catches_short_file() {
        let dir = tempdir().unwrap();
        write_binary_run(dir.path(), 16, &[1, 2, 3]);
        fs::write(dir.path().join("frame_2.bin"), [0u8; 40]).unwrap();

        let run = binary_run(dir.path(), 16);
        let err = run.preflight().unwrap_err();
        match err {
            FrameError::IncompleteFrame {
                path,
                expected,
                actual,
            } => {
                assert!(path.ends_with("frame_2.bin"));
                assert_eq!(expected, 16 * 8 + 15 * 8);
                assert_eq!(actual, 40);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_preflight_skips_text() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("frame_1.csv"), "type,value\n").unwrap();
        let pattern = FramePattern::parse("frame_*.csv").unwrap();
        let run = Run::new(
            locate(dir.path(), &pattern).unwrap(),
            FrameFormat::Text,
            10_000,
        );
        run.preflight().unwrap();
    }

    #[test]
    fn test_shape_mismatch_stops_iteration() {
        let dir = tempdir().unwrap();
        let write = |step: u64, frame: &Frame| {
            let mut out = Vec::new();
            write_text(&mut out, frame).unwrap();
            fs::write(dir.path().join(format!("frame_{}.csv", step)), out).unwrap();
        };
        write(1, &pulse(5, 1));
        write(2, &pulse(4, 2));
        write(3, &pulse(5, 3));

        let pattern = FramePattern::parse("frame_*.csv").unwrap();
        let run = Run::new(
            locate(dir.path(), &pattern).unwrap(),
            FrameFormat::Text,
            5,
        );

        let mut iter = run.frames();
        assert!(iter.next().unwrap().is_ok());
        let err = iter.next().unwrap().unwrap_err();
        match err {
            FrameError::ShapeMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, (5, 4));
                assert_eq!(found, (4, 3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_decode_by_index() {
        let dir = tempdir().unwrap();
        write_binary_run(dir.path(), 4, &[7, 3]);
        let run = binary_run(dir.path(), 4);

        let frame = run.decode(1).unwrap().unwrap();
        assert_eq!(frame, pulse(4, 7));
        assert!(run.decode(2).is_none());
    }
}
