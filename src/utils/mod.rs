pub mod error;

pub use error::MrzError;
