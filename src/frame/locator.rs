//! Frame file discovery and ordering.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use super::FrameError;

/// File name pattern with a single `*` standing for the timestep index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePattern {
    prefix: String,
    suffix: String,
}

impl FramePattern {
    /// Parse a pattern such as `frame_*.bin`.
    ///
    /// Returns `None` unless the pattern has exactly one `*`.
    pub fn parse(pattern: &str) -> Option<Self> {
        let (prefix, suffix) = pattern.split_once('*')?;
        if suffix.contains('*') {
            return None;
        }
        Some(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Timestep index embedded in `file_name`, if it matches.
    pub fn step_of(&self, file_name: &str) -> Option<u64> {
        let digits = file_name
            .strip_prefix(&self.prefix)?
            .strip_suffix(&self.suffix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// A frame file and its timestep index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFrame {
    pub step: u64,
    pub path: PathBuf,
}

/// List the frame files in `dir` matching `pattern`, ordered by timestep.
///
/// An empty result is not an error.
pub fn locate<P: AsRef<Path>>(
    dir: P,
    pattern: &FramePattern,
) -> Result<Vec<LocatedFrame>, FrameError> {
    let dir = dir.as_ref();
    let io_err = |source: io::Error| FrameError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut frames = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(step) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| pattern.step_of(name))
        else {
            continue;
        };
        frames.push(LocatedFrame { step, path });
    }

    frames.sort_by(|a, b| a.step.cmp(&b.step).then_with(|| a.path.cmp(&b.path)));
    debug!("located {} frame files in {}", frames.len(), dir.display());
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    fn names(frames: &[LocatedFrame]) -> Vec<String> {
        frames
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_pattern_parse() {
        assert!(FramePattern::parse("frame_*.bin").is_some());
        assert!(FramePattern::parse("frame.bin").is_none());
        assert!(FramePattern::parse("*_*.bin").is_none());
    }

    #[test]
    fn test_step_of() {
        let pattern = FramePattern::parse("frame_*.csv").unwrap();
        assert_eq!(pattern.step_of("frame_00050.csv"), Some(50));
        assert_eq!(pattern.step_of("frame_7.csv"), Some(7));
        assert_eq!(pattern.step_of("frame_.csv"), None);
        assert_eq!(pattern.step_of("frame_1a.csv"), None);
        assert_eq!(pattern.step_of("frame_-1.csv"), None);
        assert_eq!(pattern.step_of("frame_1.csv.bak"), None);
        assert_eq!(pattern.step_of("other_1.csv"), None);
    }

    #[test]
    fn test_numeric_ordering() {
        let dir = tempdir().unwrap();
        for name in ["frame_2.bin", "frame_10.bin", "frame_1.bin"] {
            touch(dir.path(), name);
        }

        let pattern = FramePattern::parse("frame_*.bin").unwrap();
        let frames = locate(dir.path(), &pattern).unwrap();
        assert_eq!(
            names(&frames),
            vec!["frame_1.bin", "frame_2.bin", "frame_10.bin"]
        );
        assert_eq!(
            frames.iter().map(|f| f.step).collect::<Vec<_>>(),
            vec![1, 2, 10]
        );
    }

    #[test]
    fn test_equal_steps_ordered_by_name() {
        let dir = tempdir().unwrap();
        for name in ["frame_2.bin", "frame_1.bin", "frame_01.bin"] {
            touch(dir.path(), name);
        }

        let pattern = FramePattern::parse("frame_*.bin").unwrap();
        let frames = locate(dir.path(), &pattern).unwrap();
        assert_eq!(
            names(&frames),
            vec!["frame_01.bin", "frame_1.bin", "frame_2.bin"]
        );
        assert_eq!(
            frames.iter().map(|f| f.step).collect::<Vec<_>>(),
            vec![1, 1, 2]
        );
    }

    #[test]
    fn test_non_matching_files_ignored() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "frame_00100.csv");
        touch(dir.path(), "frame_00050.csv");
        touch(dir.path(), "frame_00050.bin");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("frame_00001.csv")).unwrap();

        let pattern = FramePattern::parse("frame_*.csv").unwrap();
        let frames = locate(dir.path(), &pattern).unwrap();
        assert_eq!(names(&frames), vec!["frame_00050.csv", "frame_00100.csv"]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempdir().unwrap();
        let pattern = FramePattern::parse("frame_*.csv").unwrap();
        assert!(locate(dir.path(), &pattern).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let pattern = FramePattern::parse("frame_*.csv").unwrap();
        let err = locate(dir.path().join("absent"), &pattern).unwrap_err();
        assert!(matches!(err, FrameError::Io { .. }));
    }
}
