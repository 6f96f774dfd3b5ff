use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::liveness::domain::video_source::VideoSource;
use crate::shared::frame::Frame;
use crate::shared::image_loader::load_frame;
use crate::shared::BoxError;

/// Replays a fixed list of still images, one per capture.
///
/// Useful for kiosks that snap stills instead of streaming video, and for
/// replaying a recorded capture sequence. Running out of images is a
/// capture error.
pub struct ImageSequenceSource {
    paths: VecDeque<PathBuf>,
    served: usize,
}

impl ImageSequenceSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: paths.into(),
            served: 0,
        }
    }

    /// Every image in `dir` (by extension), sorted by file name.
    pub fn from_dir(dir: &Path) -> Result<Self, BoxError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| crate::shared::image_loader::is_image(p))
            .collect();
        paths.sort();
        Ok(Self::new(paths))
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl VideoSource for ImageSequenceSource {
    fn current_frame(&mut self) -> Result<Frame, BoxError> {
        let path = self
            .paths
            .pop_front()
            .ok_or("Image sequence exhausted")?;
        let frame = load_frame(&path, self.served)?;
        self.served += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_gray(dir: &Path, name: &str, value: u8) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(8, 8, image::Rgb([value, value, value]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_serves_images_in_order_then_errors() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_gray(dir.path(), "a.png", 10);
        let b = write_gray(dir.path(), "b.png", 200);

        let mut source = ImageSequenceSource::new(vec![a, b]);
        let first = source.current_frame().unwrap();
        let second = source.current_frame().unwrap();
        assert_eq!(first.data()[0], 10);
        assert_eq!(second.data()[0], 200);
        assert_eq!(second.index(), 1);
        assert!(source.current_frame().is_err());
    }

    #[test]
    fn test_from_dir_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        write_gray(dir.path(), "02.png", 2);
        write_gray(dir.path(), "01.png", 1);
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut source = ImageSequenceSource::from_dir(dir.path()).unwrap();
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.current_frame().unwrap().data()[0], 1);
        assert_eq!(source.current_frame().unwrap().data()[0], 2);
    }
}
