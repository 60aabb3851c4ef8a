use crate::models::MrzFieldSet;
use crate::processing::candidates::clean_candidate;
use crate::processing::ocr::MrzOcr;
use crate::processing::parser::parse_td3;
use log::debug;
use std::path::Path;
use tesseract::PageSegMode;

/// A capability that locates and decodes the MRZ directly from a full
/// image, without manual cropping or offset search.
///
/// Implementations must fold every internal failure into `None`: callers
/// cannot (and should not) tell "engine found nothing" apart from "engine
/// broke". Swapping engines never touches the orchestrator.
pub trait StructuredDecoder: Send + Sync {
    /// Engine identifier for provenance logging.
    fn name(&self) -> &'static str;

    /// Attempt a structured decode. `None` means "no MRZ found".
    fn decode(&self, image_path: &Path) -> Option<MrzFieldSet>;
}

/// Default engine: whole-image Tesseract pass with automatic page
/// segmentation and the MRZ alphabet whitelist. The page is scanned for
/// two MRZ-shaped lines, which are then sliced with the TD3 offsets.
pub struct TesseractDecoder;

impl StructuredDecoder for TesseractDecoder {
    fn name(&self) -> &'static str {
        "tesseract-full-page"
    }

    fn decode(&self, image_path: &Path) -> Option<MrzFieldSet> {
        let text = match MrzOcr::recognize_file(image_path, PageSegMode::PsmAuto) {
            Ok(text) => text,
            Err(e) => {
                debug!("Structured decode unavailable: {}", e);
                return None;
            }
        };

        let lines = scan_mrz_lines(&text);
        if lines.len() < 2 {
            debug!("Full-page pass found {} MRZ-shaped line(s)", lines.len());
            return None;
        }
        Some(parse_td3(&lines[0], &lines[1]))
    }
}

/// Pulls unique MRZ-shaped lines out of a page of recognized text, in
/// reading order.
pub fn scan_mrz_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let Some(cleaned) = clean_candidate(line) else {
            continue;
        };
        if !lines.contains(&cleaned) {
            lines.push(cleaned);
        }
    }
    lines
}
