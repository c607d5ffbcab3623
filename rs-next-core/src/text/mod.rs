//! Text side of the pipeline: raw corpus → tokens → ids.

/// Corpus cleaning and whitespace tokenization.
pub mod normalizer;

/// Frozen token ↔ id mapping with `postcard` persistence.
pub mod vocabulary;

pub use normalizer::{normalize, normalize_to_string};
pub use vocabulary::{RESERVED_ID, Vocabulary};
