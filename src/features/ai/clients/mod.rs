mod gemini_client;

#[cfg(test)]
pub mod fake_model;

pub use gemini_client::{
    GeminiClient, GenerationRequest, GenerativeModel, InlineMedia, ModelError,
};
