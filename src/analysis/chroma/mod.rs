//! Chroma feature extraction

pub mod extractor;
pub mod smoothing;

pub use extractor::ChromaFeatureExtractor;
