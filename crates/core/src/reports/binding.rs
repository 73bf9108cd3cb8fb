//! Parameter binding for report queries.
//!
//! Tokens look like `{{name}}`. A JSON string consisting of nothing but one
//! token is replaced by the typed parameter value; tokens embedded in longer
//! strings are interpolated as text. Tokens with no value bind to `""`.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::reports_model::{ParamSpec, QueryStep};
use crate::errors::{Error, Result, ValidationError};

lazy_static! {
    static ref TOKEN_REGEX: Regex =
        Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("Invalid regex pattern");
    static ref WHOLE_TOKEN_REGEX: Regex =
        Regex::new(r"^\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}$").expect("Invalid regex pattern");
}

/// Resolves caller parameters against the declared specs.
///
/// Declared parameters are coerced to their type, fall back to their default
/// and fail with `MissingField` when required but absent. Undeclared caller
/// parameters are passed through unchanged.
pub fn resolve_params(specs: &[ParamSpec], supplied: &Map<String, Value>) -> Result<Map<String, Value>> {
    let mut bound = supplied.clone();
    for spec in specs {
        let value = match supplied.get(&spec.name).filter(|v| !v.is_null()) {
            Some(value) => Some(spec.coerce(value)?),
            None => match &spec.default {
                Some(default) => Some(spec.coerce(default)?),
                None if spec.required => {
                    return Err(Error::Validation(ValidationError::MissingField(
                        spec.name.clone(),
                    )))
                }
                None => None,
            },
        };
        match value {
            Some(value) => {
                bound.insert(spec.name.clone(), value);
            }
            None => {
                bound.remove(&spec.name);
            }
        }
    }
    Ok(bound)
}

/// Substitutes tokens throughout a JSON tree.
pub fn bind_value(template: &Value, params: &Map<String, Value>) -> Value {
    match template {
        Value::String(s) => bind_string(s, params),
        Value::Array(items) => Value::Array(items.iter().map(|v| bind_value(v, params)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), bind_value(v, params)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn bind_string(s: &str, params: &Map<String, Value>) -> Value {
    if let Some(caps) = WHOLE_TOKEN_REGEX.captures(s) {
        return params
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
    }
    if !s.contains("{{") {
        return Value::String(s.to_string());
    }
    let replaced = TOKEN_REGEX.replace_all(s, |caps: &Captures| match params.get(&caps[1]) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    });
    Value::String(replaced.into_owned())
}

/// Binds parameters into every value position of a step.
pub fn bind_step(step: &QueryStep, params: &Map<String, Value>) -> Result<QueryStep> {
    let template = serde_json::to_value(step)?;
    serde_json::from_value(bind_value(&template, params)).map_err(|e| {
        Error::invalid_input(format!("Query step is invalid after binding parameters: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::reports_model::{FindStep, ParamType};
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn whole_token_keeps_type() {
        let bound = bind_value(
            &json!({"targetQuantity": {"$gte": "{{min}}"}, "open": "{{ open }}"}),
            &params(json!({"min": 50, "open": true})),
        );
        assert_eq!(bound, json!({"targetQuantity": {"$gte": 50}, "open": true}));
    }

    #[test]
    fn embedded_tokens_interpolate_as_text() {
        let bound = bind_value(
            &json!({"title": {"$regex": "^{{prefix}}-{{n}}"}}),
            &params(json!({"prefix": "NEED", "n": 7})),
        );
        assert_eq!(bound, json!({"title": {"$regex": "^NEED-7"}}));
    }

    #[test]
    fn missing_tokens_bind_to_empty_string() {
        let bound = bind_value(
            &json!({"schoolId": "{{school}}", "tags": ["x{{gone}}y"]}),
            &Map::new(),
        );
        assert_eq!(bound, json!({"schoolId": "", "tags": ["xy"]}));
    }

    #[test]
    fn resolve_applies_defaults_and_requirements() {
        let specs = vec![
            ParamSpec {
                name: "year".to_string(),
                param_type: ParamType::String,
                required: true,
                default: None,
            },
            ParamSpec {
                name: "min".to_string(),
                param_type: ParamType::Number,
                required: false,
                default: Some(json!("10")),
            },
        ];

        let resolved =
            resolve_params(&specs, &params(json!({"year": "2024-2025", "extra": 1}))).unwrap();
        assert_eq!(resolved["min"], json!(10));
        assert_eq!(resolved["extra"], json!(1));

        let err = resolve_params(&specs, &Map::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField(ref f)) if f == "year"
        ));
    }

    #[test]
    fn binds_inside_typed_steps() {
        let step = QueryStep::Find(FindStep {
            filter: json!({"schoolYear": "{{year}}"}),
            limit: Some(5),
            ..Default::default()
        });
        let bound = bind_step(&step, &params(json!({"year": "2024-2025"}))).unwrap();
        match bound {
            QueryStep::Find(find) => {
                assert_eq!(find.filter, json!({"schoolYear": "2024-2025"}));
                assert_eq!(find.limit, Some(5));
            }
            other => panic!("unexpected step {:?}", other),
        }
    }
}
