use thiserror::Error;

/// Errors reported by the extraction pipeline.
///
/// Failures are always local to a single image: callers processing a batch
/// report each outcome independently and keep going.
#[derive(Error, Debug)]
pub enum MrzError {
    /// The source file could not be decoded as an image at all.
    #[error("Image unreadable: {0}")]
    ImageUnreadable(String),

    /// Neither the structured decoder nor the crop search produced a usable
    /// field set. Finding fewer than the two MRZ lines TD3 needs folds into
    /// this case.
    #[error("No MRZ detected in image")]
    NoMrzDetected,

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("IO error: {0}")]
    Io(String),
}
