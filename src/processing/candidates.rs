use crate::models::{CandidateLine, TD3_DOC_PREFIXES, TD3_LINE_LEN};
use crate::processing::ocr::MrzOcr;
use crate::processing::preprocess::preprocess_region;
use image::DynamicImage;
use log::{debug, warn};
use tesseract::PageSegMode;

/// Crop start ratios tried against the bottom of the image, narrowest
/// first: bottom 15%, 20% and 25% of image height. The MRZ sits at the
/// bottom of the page but its exact extent varies with scan framing.
pub const CROP_STARTS: [f32; 3] = [0.85, 0.80, 0.75];

/// Scans bottom-of-image crops for MRZ-shaped text lines.
///
/// Candidates are unique by exact text, kept in first-seen order across
/// crops. Every returned line is exactly [`TD3_LINE_LEN`] characters; the
/// caller decides whether enough lines were found (TD3 needs two).
pub fn extract_candidate_lines(img: &DynamicImage) -> Vec<CandidateLine> {
    let mut found: Vec<CandidateLine> = Vec::new();

    for &crop_start in &CROP_STARTS {
        let y0 = (img.height() as f32 * crop_start) as u32;
        if y0 >= img.height() {
            continue;
        }
        let region = img.crop_imm(0, y0, img.width(), img.height() - y0);
        let processed = preprocess_region(&region);

        let text = match MrzOcr::recognize(&processed, PageSegMode::PsmSingleBlock) {
            Ok(text) => text,
            Err(e) => {
                // One bad crop must not sink the remaining ones.
                warn!(
                    "OCR failed on crop starting at {:.0}% of height: {}",
                    crop_start * 100.0,
                    e
                );
                continue;
            }
        };

        for line in text.lines() {
            let Some(cleaned) = clean_candidate(line) else {
                continue;
            };
            if found.iter().any(|c| c.text == cleaned) {
                continue;
            }
            debug!("MRZ candidate from crop {:.2}: {}", crop_start, cleaned);
            found.push(CandidateLine {
                text: cleaned,
                crop_start,
            });
        }
    }

    found
}

/// Normalizes one raw OCR line and applies the MRZ shape filter.
///
/// Whitespace is dropped, pipe glyphs become `I` and letter `O` becomes
/// digit `0` (the two recurring confusions inside this alphabet). A line
/// survives only at exactly 44 characters with either a filler character
/// or a known document-type prefix.
pub fn clean_candidate(line: &str) -> Option<String> {
    let cleaned: String = line
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '|' => 'I',
            'O' => '0',
            _ => c,
        })
        .collect();

    if cleaned.len() != TD3_LINE_LEN {
        return None;
    }
    if cleaned.contains('<') || TD3_DOC_PREFIXES.iter().any(|p| cleaned.starts_with(p)) {
        Some(cleaned)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
    const LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    #[test]
    fn test_valid_lines_are_kept() {
        assert_eq!(clean_candidate(LINE1).as_deref(), Some(LINE1));
        assert_eq!(clean_candidate(LINE2).as_deref(), Some(LINE2));
    }

    #[test]
    fn test_length_filter_is_exact() {
        assert_eq!(clean_candidate(&LINE1[..43]), None);
        let long = format!("{}<", LINE1);
        assert_eq!(clean_candidate(&long), None);
        assert_eq!(clean_candidate(""), None);
    }

    #[test]
    fn test_whitespace_is_stripped_before_measuring() {
        let spaced = "  P<UTOERIKSSON<< ANNA<MARIA<<<<<<<<<<<<<<<<<<<\n";
        assert_eq!(clean_candidate(spaced).as_deref(), Some(LINE1));
    }

    #[test]
    fn test_known_confusions_are_repaired() {
        let misread = "L898902C36UT07408122F1204159ZE184226B<<<<<1|";
        let cleaned = clean_candidate(misread).unwrap();
        assert!(!cleaned.contains('O'));
        assert!(!cleaned.contains('|'));
        assert_eq!(cleaned.len(), TD3_LINE_LEN);
    }

    #[test]
    fn test_line_without_filler_or_prefix_is_rejected() {
        let line = "A".repeat(TD3_LINE_LEN);
        assert_eq!(clean_candidate(&line), None);
    }

    #[test]
    fn test_visa_and_id_prefixes_are_accepted() {
        for prefix in ["V<", "I<"] {
            let line = format!("{}{}", prefix, "A".repeat(TD3_LINE_LEN - 2));
            assert!(clean_candidate(&line).is_some());
        }
    }
}
