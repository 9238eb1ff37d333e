//! Parsing of structured JSON returned by generative models.

pub mod parser;
pub mod response;

pub use parser::{parse_strict, parse_with_fallback};
pub use response::LlmResponse;
