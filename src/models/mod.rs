pub mod data;

pub use data::{
    CandidateLine, ExtractionMethod, MrzFieldSet, PassengerRecord, TD3_DOC_PREFIXES, TD3_LINE_LEN,
};
