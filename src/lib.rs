pub mod extractor;
pub mod models;
pub mod processing;
pub mod utils;

pub use extractor::MrzExtractor;
