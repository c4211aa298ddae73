//! Image probe trait and shared types.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read dimensions of {path}: {message}")]
    Unreadable { path: String, message: String },
}

/// Pixel size of a raster image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Reads pixel dimensions without decoding the full image.
///
/// Implementations are shared across the render workers, hence `Sync`.
pub trait ImageProbe: Sync {
    fn dimensions(&self, path: &Path) -> Result<Dimensions, ProbeError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock probe answering from a fixed table and recording every lookup.
    #[derive(Default)]
    pub struct MockProbe {
        pub known: HashMap<String, Dimensions>,
        pub probed: Mutex<Vec<String>>,
    }

    impl MockProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, path: impl Into<String>, width: u32, height: u32) -> Self {
            self.known.insert(path.into(), Dimensions { width, height });
            self
        }

        pub fn probed(&self) -> Vec<String> {
            self.probed.lock().unwrap().clone()
        }
    }

    impl ImageProbe for MockProbe {
        fn dimensions(&self, path: &Path) -> Result<Dimensions, ProbeError> {
            let key = path.to_string_lossy().to_string();
            self.probed.lock().unwrap().push(key.clone());
            self.known
                .get(&key)
                .copied()
                .ok_or_else(|| ProbeError::Unreadable {
                    path: key,
                    message: "no mock dimensions".to_string(),
                })
        }
    }

    #[test]
    fn mock_answers_known_paths() {
        let probe = MockProbe::new().with("/site/images/a.png", 640, 480);
        let dims = probe.dimensions(Path::new("/site/images/a.png")).unwrap();
        assert_eq!(dims, Dimensions { width: 640, height: 480 });
        assert_eq!(probe.probed(), vec!["/site/images/a.png".to_string()]);
    }

    #[test]
    fn mock_fails_unknown_paths() {
        let probe = MockProbe::new();
        assert!(probe.dimensions(Path::new("/missing.png")).is_err());
        assert_eq!(probe.probed().len(), 1);
    }
}
