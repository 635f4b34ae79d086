//! Audio input

pub mod decoder;

pub use decoder::{decode, decode_to_rate};
