use super::LlmResponse;

/// Remove a surrounding markdown code fence, if any
///
/// Handles ```` ```json ```` and bare ```` ``` ```` fences. Text without a fence
/// is returned trimmed. Only the fence is removed: prose around a JSON object
/// is left in place and will fail the strict parse.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = strip_language_tag(rest).trim_start();

    body.strip_suffix("```")
        .or_else(|| body.rfind("```").map(|end| &body[..end]))
        .unwrap_or(body)
        .trim()
}

/// Drop a language tag such as `json` or `JSON` right after the opening
/// fence, whether or not a newline follows it
fn strip_language_tag(rest: &str) -> &str {
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let (tag, after) = rest.split_at(tag_len);

    if tag.is_empty() {
        return rest;
    }
    match after.chars().next() {
        None => after,
        Some(c) if c.is_whitespace() || c == '{' || c == '[' => after,
        Some(_) => rest,
    }
}

/// Parse model output into `T`, rejecting anything that is not exactly a
/// valid instance of the schema
pub fn parse_strict<T>(text: &str) -> Result<T, String>
where
    T: LlmResponse,
{
    let json_str = strip_code_fence(text);

    if json_str.is_empty() {
        return Err("Model returned empty output".to_string());
    }

    let parsed: T = serde_json::from_str(json_str).map_err(|e| {
        format!(
            "Model output is not valid JSON for the expected schema: {}. Output: {}",
            e,
            json_str.chars().take(200).collect::<String>()
        )
    })?;

    parsed.validate()?;

    Ok(parsed)
}

/// Parse model output, substituting the type's fallback on any failure
///
/// # Example
///
/// ```ignore
/// let verdict = parse_with_fallback::<ClassificationOutput>(&raw_text);
/// if !verdict.is_success() {
///     // fallback value, already safe to return
/// }
/// ```
pub fn parse_with_fallback<T>(text: &str) -> T
where
    T: LlmResponse,
{
    match parse_strict::<T>(text) {
        Ok(parsed) => parsed,
        Err(error_msg) => {
            tracing::warn!("Model output rejected, using fallback: {}", error_msg);
            let mut fallback = T::fallback();
            fallback.mark_as_fallback(error_msg);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    fn default_true() -> bool {
        true
    }

    #[derive(Debug, Clone, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct TestResponse {
        pub title: String,
        pub count: Option<i32>,

        #[serde(default = "default_true", skip)]
        #[schemars(skip)]
        pub is_llm_success: bool,

        #[serde(skip)]
        #[schemars(skip)]
        pub llm_error_message: Option<String>,
    }

    impl LlmResponse for TestResponse {
        fn fallback() -> Self {
            Self {
                title: "fallback".to_string(),
                count: None,
                is_llm_success: true,
                llm_error_message: None,
            }
        }

        fn mark_as_fallback(&mut self, error_message: String) {
            self.is_llm_success = false;
            self.llm_error_message = Some(error_message);
        }

        fn is_success(&self) -> bool {
            self.is_llm_success
        }

        fn validate(&self) -> Result<(), String> {
            match self.count {
                Some(c) if c < 0 => Err("count must not be negative".to_string()),
                _ => Ok(()),
            }
        }
    }

    // ==================== strip_code_fence tests ====================

    #[test]
    fn test_strip_json_fence() {
        let text = "```json\n{\"title\": \"Test\"}\n```";
        assert_eq!(strip_code_fence(text), "{\"title\": \"Test\"}");
    }

    #[test]
    fn test_strip_generic_fence() {
        let text = "```\n{\"title\": \"Test\"}\n```\n";
        assert_eq!(strip_code_fence(text), "{\"title\": \"Test\"}");
    }

    #[test]
    fn test_strip_no_fence() {
        let text = "  {\"title\": \"Test\"}  ";
        assert_eq!(strip_code_fence(text), "{\"title\": \"Test\"}");
    }

    #[test]
    fn test_strip_unterminated_fence() {
        let text = "```json\n{\"title\": \"Test\"}";
        assert_eq!(strip_code_fence(text), "{\"title\": \"Test\"}");
    }

    #[test]
    fn test_strip_single_line_json_fence() {
        let text = "```json {\"title\": \"Test\"}```";
        assert_eq!(strip_code_fence(text), "{\"title\": \"Test\"}");
    }

    #[test]
    fn test_strip_tag_without_separator() {
        assert_eq!(
            strip_code_fence("```JSON{\"title\": \"Test\"}\n```"),
            "{\"title\": \"Test\"}"
        );
        assert_eq!(
            strip_code_fence("```json\r\n{\"title\": \"Test\"}\r\n```"),
            "{\"title\": \"Test\"}"
        );
    }

    // ==================== parse tests ====================

    #[test]
    fn test_parse_single_line_fenced_json() {
        let result: TestResponse =
            parse_with_fallback("```json {\"title\": \"Inline\", \"count\": 2}```");
        assert!(result.is_success());
        assert_eq!(result.title, "Inline");
        assert_eq!(result.count, Some(2));
    }

    #[test]
    fn test_parse_valid_json() {
        let result: TestResponse = parse_with_fallback(r#"{"title": "Bin", "count": 3}"#);
        assert!(result.is_success());
        assert_eq!(result.title, "Bin");
        assert_eq!(result.count, Some(3));
        assert!(result.llm_error_message.is_none());
    }

    #[test]
    fn test_parse_fenced_json() {
        let result: TestResponse = parse_with_fallback("```json\n{\"title\": \"Fenced\"}\n```");
        assert!(result.is_success());
        assert_eq!(result.title, "Fenced");
    }

    #[test]
    fn test_prose_around_json_is_rejected() {
        let result: TestResponse =
            parse_with_fallback("Sure! Here it is: {\"title\": \"Bin\"} hope that helps");
        assert!(!result.is_success());
        assert_eq!(result.title, "fallback");
    }

    #[test]
    fn test_truthy_text_is_not_guessed() {
        let result: TestResponse = parse_with_fallback("isWasteRelated: true");
        assert!(!result.is_success());
        assert!(result.llm_error_message.is_some());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(parse_strict::<TestResponse>(r#"{"title": "x", "extra": 1}"#).is_err());
    }

    #[test]
    fn test_validation_failure_uses_fallback() {
        let result: TestResponse = parse_with_fallback(r#"{"title": "x", "count": -1}"#);
        assert!(!result.is_success());
        assert_eq!(
            result.llm_error_message.as_deref(),
            Some("count must not be negative")
        );
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_strict::<TestResponse>("").is_err());
        assert!(parse_strict::<TestResponse>("```json\n```").is_err());
    }

    #[test]
    fn test_schema_omits_internal_fields() {
        let schema = TestResponse::json_schema_string();
        assert!(schema.contains("title"));
        assert!(!schema.contains("is_llm_success"));
    }
}
