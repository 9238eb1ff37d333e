//! Prompt template management module.
//!
//! Templates are stored in `templates/prompts/` and use Jinja2 syntax. Each
//! gateway has one render function here so the variables a template needs
//! are visible in one place.

pub mod engine;

pub use engine::{render_template, TemplateError};

use minijinja::Value;
use std::collections::HashMap;

/// Render the image classification prompt.
///
/// # Arguments
/// * `categories` - `(value, label)` pairs of the category taxonomy
/// * `severities` - accepted severity values
/// * `json_schema` - JSON schema string for the expected output
pub fn render_classification_prompt(
    categories: &[(&str, &str)],
    severities: &[&str],
    json_schema: &str,
) -> Result<String, TemplateError> {
    let category_list: Vec<Value> = categories
        .iter()
        .map(|(value, label)| {
            Value::from_iter([("value", Value::from(*value)), ("label", Value::from(*label))])
        })
        .collect();

    let mut ctx: HashMap<&str, Value> = HashMap::new();
    ctx.insert("categories", Value::from(category_list));
    let severity_list: Vec<String> = severities.iter().map(|s| s.to_string()).collect();
    ctx.insert("severities", Value::from(severity_list));
    ctx.insert("json_schema", Value::from(json_schema));

    render_template("classification.jinja", &ctx)
}

/// Render the completion verification prompt.
///
/// `has_original` switches the prompt between a before/after comparison and
/// a single proof-image inspection.
pub fn render_verification_prompt(
    category: Option<&str>,
    description: Option<&str>,
    has_original: bool,
    json_schema: &str,
) -> Result<String, TemplateError> {
    let mut ctx: HashMap<&str, Value> = HashMap::new();
    ctx.insert("category", Value::from(category.unwrap_or("")));
    ctx.insert("description", Value::from(description.unwrap_or("")));
    ctx.insert("has_original", Value::from(has_original));
    ctx.insert("json_schema", Value::from(json_schema));

    render_template("verification.jinja", &ctx)
}

/// Render the audio transcription prompt.
pub fn render_transcription_prompt() -> Result<String, TemplateError> {
    render_template("transcription.jinja", &HashMap::new())
}
