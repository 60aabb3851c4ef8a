pub mod candidates;
pub mod normalize;
pub mod ocr;
pub mod orientation;
pub mod parser;
pub mod preprocess;
pub mod structured;

pub use candidates::extract_candidate_lines;
pub use normalize::normalize_record;
pub use ocr::MrzOcr;
pub use orientation::OrientedImage;
pub use parser::parse_td3;
pub use preprocess::preprocess_region;
pub use structured::{StructuredDecoder, TesseractDecoder};
