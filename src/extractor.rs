use crate::models::{ExtractionMethod, MrzFieldSet, PassengerRecord};
use crate::processing::candidates::extract_candidate_lines;
use crate::processing::normalize::normalize_record;
use crate::processing::orientation::OrientedImage;
use crate::processing::parser::parse_td3;
use crate::processing::structured::{StructuredDecoder, TesseractDecoder};
use crate::utils::MrzError;
use log::{debug, info};
use std::path::Path;

/// Which decode path won, or that neither did.
pub enum DecodeOutcome {
    Structured(MrzFieldSet),
    Manual(MrzFieldSet),
    NotFound,
}

/// Sequences one extraction: orientation, then the structured decoder,
/// then the crop-search fallback. Each stage runs at most once per image;
/// there is no retry.
///
/// Holds no per-image state, so one extractor can serve extractions on
/// multiple threads; each call owns its transient buffers and temp files
/// and releases them on every exit path.
pub struct MrzExtractor {
    decoder: Box<dyn StructuredDecoder>,
}

impl MrzExtractor {
    pub fn new() -> Self {
        Self::with_decoder(Box::new(TesseractDecoder))
    }

    /// Installs a different structured-decode engine.
    pub fn with_decoder(decoder: Box<dyn StructuredDecoder>) -> Self {
        MrzExtractor { decoder }
    }

    /// Extracts one record from one image.
    ///
    /// Returns [`MrzError::NoMrzDetected`] when both stages come up empty
    /// and [`MrzError::ImageUnreadable`] when the source never decoded as
    /// an image. Failures are local to this image; batch callers report
    /// them per image and keep going.
    pub fn extract(&self, image_path: &Path) -> Result<PassengerRecord, MrzError> {
        info!("Extracting MRZ from {}", image_path.display());
        let oriented = OrientedImage::open(image_path);

        match self.decode(&oriented)? {
            DecodeOutcome::Structured(fields) => {
                info!("MRZ decoded by the {} engine", self.decoder.name());
                Ok(normalize_record(
                    &fields,
                    ExtractionMethod::Structured,
                    image_path,
                ))
            }
            DecodeOutcome::Manual(fields) => {
                info!("MRZ decoded by crop search");
                Ok(normalize_record(&fields, ExtractionMethod::Manual, image_path))
            }
            DecodeOutcome::NotFound => Err(MrzError::NoMrzDetected),
        }
        // The rotated temp artifact, if any, is deleted here when
        // `oriented` drops, success or not.
    }

    fn decode(&self, oriented: &OrientedImage) -> Result<DecodeOutcome, MrzError> {
        if let Some(fields) = self.decoder.decode(oriented.path()) {
            if !fields.is_empty() {
                return Ok(DecodeOutcome::Structured(fields));
            }
        }
        debug!("Structured decode came up empty, falling back to crop search");

        let Some(img) = oriented.image() else {
            return Err(MrzError::ImageUnreadable(
                oriented.source().display().to_string(),
            ));
        };

        let candidates = extract_candidate_lines(img);
        if candidates.len() < 2 {
            info!(
                "Crop search found {} valid MRZ line(s), need 2",
                candidates.len()
            );
            return Ok(DecodeOutcome::NotFound);
        }

        let fields = parse_td3(&candidates[0].text, &candidates[1].text);
        Ok(DecodeOutcome::Manual(fields))
    }
}

impl Default for MrzExtractor {
    fn default() -> Self {
        Self::new()
    }
}
