use crate::utils::MrzError;
use image::GrayImage;
use std::path::Path;
use tesseract::{PageSegMode, Tesseract};

/// Every character that may appear in a machine readable zone.
pub const MRZ_CHAR_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789<";

/// Thin wrapper around Tesseract, constrained to the MRZ alphabet.
pub struct MrzOcr;

impl MrzOcr {
    /// Recognize text in an in-memory buffer. The engine wants a file, so
    /// the buffer goes through a named temp file that is removed on return.
    pub fn recognize(image: &GrayImage, psm: PageSegMode) -> Result<String, MrzError> {
        let tmp = tempfile::Builder::new()
            .prefix("mrzscan_ocr_")
            .suffix(".png")
            .tempfile()
            .map_err(|e| MrzError::Io(format!("Failed to create temp file: {}", e)))?;

        image
            .save(tmp.path())
            .map_err(|e| MrzError::ImageProcessing(format!("Failed to write OCR input: {}", e)))?;

        Self::recognize_file(tmp.path(), psm)
    }

    /// Recognize text in an image file on disk.
    pub fn recognize_file(path: &Path, psm: PageSegMode) -> Result<String, MrzError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| MrzError::Ocr("Could not convert path to string".to_string()))?;

        let mut tess = Tesseract::new(None, Some("eng"))
            .map_err(|e| MrzError::Ocr(format!("Failed to initialize Tesseract: {}", e)))?
            .set_variable("tessedit_char_whitelist", MRZ_CHAR_WHITELIST)
            .map_err(|e| MrzError::Ocr(format!("Failed to set Tesseract variable: {}", e)))?;

        // Page seg mode is set in place, unlike the chained builders above.
        tess.set_page_seg_mode(psm);

        let mut tess = tess
            .set_image(path_str)
            .map_err(|e| MrzError::Ocr(format!("Failed to set image: {}", e)))?;

        tess.get_text()
            .map_err(|e| MrzError::Ocr(format!("Failed to extract text: {}", e)))
    }
}
