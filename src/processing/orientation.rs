use crate::utils::MrzError;
use image::DynamicImage;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A source image brought to a best-guess upright, landscape orientation.
///
/// Portrait inputs (height > width) are rotated 90 degrees clockwise without
/// any content analysis; that is a heuristic, not a guarantee. The rotated
/// copy lives in a named temp file that is removed when this struct drops,
/// on every exit path.
///
/// An unreadable source is not fatal here: the struct keeps the original
/// path and records that no pixels are available, and extraction proceeds
/// as far as it can.
pub struct OrientedImage {
    source: PathBuf,
    rotated: Option<NamedTempFile>,
    image: Option<DynamicImage>,
}

impl OrientedImage {
    pub fn open(path: &Path) -> Self {
        let source = path.to_path_buf();

        let img = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                warn!("Could not decode {} as an image: {}", path.display(), e);
                return OrientedImage {
                    source,
                    rotated: None,
                    image: None,
                };
            }
        };

        if img.height() <= img.width() {
            return OrientedImage {
                source,
                rotated: None,
                image: Some(img),
            };
        }

        debug!(
            "Portrait image {}x{}, rotating 90 degrees clockwise",
            img.width(),
            img.height()
        );
        let turned = img.rotate90();
        match write_temp_png(&turned) {
            Ok(tmp) => OrientedImage {
                source,
                rotated: Some(tmp),
                image: Some(turned),
            },
            Err(e) => {
                // Rotation failure degrades to "no change".
                warn!("Could not persist rotated copy, keeping original orientation: {}", e);
                OrientedImage {
                    source,
                    rotated: None,
                    image: Some(img),
                }
            }
        }
    }

    /// Path to hand to a file-based decoder: the rotated temp file when a
    /// rotation was applied, the original path otherwise.
    pub fn path(&self) -> &Path {
        self.rotated
            .as_ref()
            .map(|t| t.path())
            .unwrap_or(&self.source)
    }

    /// Oriented pixels, or `None` when the source could not be decoded.
    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn was_rotated(&self) -> bool {
        self.rotated.is_some()
    }
}

fn write_temp_png(img: &DynamicImage) -> Result<NamedTempFile, MrzError> {
    let tmp = tempfile::Builder::new()
        .prefix("mrzscan_rotated_")
        .suffix(".png")
        .tempfile()
        .map_err(|e| MrzError::Io(format!("Failed to create temp file: {}", e)))?;

    img.save(tmp.path())
        .map_err(|e| MrzError::ImageProcessing(format!("Failed to write rotated image: {}", e)))?;

    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn save_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_pixel(width, height, image::Rgb([120, 130, 140]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_landscape_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_image(dir.path(), "landscape.png", 40, 20);

        let oriented = OrientedImage::open(&path);
        assert!(!oriented.was_rotated());
        assert_eq!(oriented.path(), path.as_path());
        let img = oriented.image().unwrap();
        assert_eq!((img.width(), img.height()), (40, 20));
    }

    #[test]
    fn test_portrait_is_rotated_into_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_image(dir.path(), "portrait.png", 20, 40);

        let rotated_path;
        {
            let oriented = OrientedImage::open(&path);
            assert!(oriented.was_rotated());
            assert_ne!(oriented.path(), path.as_path());
            assert!(oriented.path().exists());
            rotated_path = oriented.path().to_path_buf();

            let img = oriented.image().unwrap();
            assert_eq!((img.width(), img.height()), (40, 20));
        }
        // Temp artifact is gone once the handle drops.
        assert!(!rotated_path.exists());
    }

    #[test]
    fn test_unreadable_source_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_an_image.jpg");
        std::fs::write(&path, b"plain text").unwrap();

        let oriented = OrientedImage::open(&path);
        assert!(oriented.image().is_none());
        assert!(!oriented.was_rotated());
        assert_eq!(oriented.path(), path.as_path());
    }

    #[test]
    fn test_square_image_is_not_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_image(dir.path(), "square.png", 30, 30);

        let oriented = OrientedImage::open(&path);
        assert!(!oriented.was_rotated());
    }
}
