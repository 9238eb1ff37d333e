use schemars::gen::SchemaGenerator;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// Structured output expected back from a generative model
///
/// Implementors are parsed strictly: the JSON must deserialize into the type
/// and pass [`LlmResponse::validate`]. Anything else is replaced by the single
/// [`LlmResponse::fallback`] value, so a caller always receives a well-formed
/// value and can tell the two apart with [`LlmResponse::is_success`].
pub trait LlmResponse: DeserializeOwned + JsonSchema + Sized {
    /// The value used when the model output cannot be trusted
    fn fallback() -> Self;

    /// Record why the fallback was used
    fn mark_as_fallback(&mut self, error_message: String);

    /// Check if this response was parsed from model output
    fn is_success(&self) -> bool;

    /// Semantic checks that the JSON schema alone cannot express
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Generate JSON schema string for use in prompts
    fn json_schema_string() -> String {
        let mut gen = SchemaGenerator::default();
        let schema = gen.root_schema_for::<Self>();
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
    }
}
