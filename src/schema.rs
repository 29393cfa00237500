/// JSON Schema 2020-12定義モジュール。
///
/// comment-hub との契約をJSON Schemaで定義し、実行時に検証を行います。
pub(crate) mod comment_hub;

use serde_json::Value;

/// スキーマ検証結果。
#[derive(Debug)]
pub(crate) struct ValidationResult {
    pub(crate) valid: bool,
    pub(crate) errors: Vec<String>,
}

impl ValidationResult {
    pub(crate) fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub(crate) fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

/// JSON Schemaでデータを検証する。
pub(crate) fn validate_json(schema_json: &Value, instance: &Value) -> ValidationResult {
    match jsonschema::validator_for(schema_json) {
        Ok(schema) => {
            let errors: Vec<String> = schema
                .iter_errors(instance)
                .map(|error| format!("{error} at {}", error.instance_path))
                .collect();
            if errors.is_empty() {
                ValidationResult::valid()
            } else {
                ValidationResult::invalid(errors)
            }
        }
        Err(e) => ValidationResult::invalid(vec![format!("Schema compilation error: {e}")]),
    }
}
