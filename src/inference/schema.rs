//! Validation of structured service answers.
//!
//! A [`ResponseSchema`] names the fields a JSON answer must have and the
//! shape of each. Answers are checked before they are decoded; a violation
//! fails that call instead of being coerced into something plausible.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ServiceError;

/// Shape of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Any string
    String,
    /// A string with at least one non-whitespace character
    NonEmptyString,
    /// A number, optionally bounded (inclusive)
    Number {
        /// Lower bound
        min: Option<f64>,
        /// Upper bound
        max: Option<f64>,
    },
    /// A boolean
    Boolean,
}

/// One named field of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name in the JSON object
    pub name: String,
    /// Expected shape
    pub kind: FieldKind,
    /// Whether the field must be present
    pub required: bool,
}

/// Expected shape of a structured answer.
///
/// # Example
///
/// ```rust
/// use chatlens::inference::ResponseSchema;
/// use serde_json::json;
///
/// let schema = ResponseSchema::new("sentiment")
///     .number("score", -10.0, 10.0)
///     .non_empty_string("sentiment");
///
/// assert!(schema.validate(&json!({"score": 4, "sentiment": "warm"})).is_ok());
/// assert!(schema.validate(&json!({"score": 40, "sentiment": "warm"})).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Schema name, passed along to services that support named schemas
    pub name: String,
    /// Declared fields
    pub fields: Vec<FieldSpec>,
}

impl ResponseSchema {
    /// Creates a schema with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required,
        });
        self
    }

    /// Adds a required string field.
    #[must_use]
    pub fn string(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::String, true)
    }

    /// Adds a required non-empty string field.
    #[must_use]
    pub fn non_empty_string(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::NonEmptyString, true)
    }

    /// Adds a required number field bounded to `[min, max]`.
    #[must_use]
    pub fn number(self, name: impl Into<String>, min: f64, max: f64) -> Self {
        self.field(
            name,
            FieldKind::Number {
                min: Some(min),
                max: Some(max),
            },
            true,
        )
    }

    /// Checks `value` against the schema.
    pub fn validate(&self, value: &Value) -> Result<(), ServiceError> {
        let Some(object) = value.as_object() else {
            return Err(ServiceError::schema(&self.name, "a JSON object"));
        };

        for spec in &self.fields {
            match object.get(&spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(ServiceError::schema(&spec.name, "a value (field is required)"));
                }
                None | Some(Value::Null) => {}
                Some(field) => check_field(spec, field)?,
            }
        }
        Ok(())
    }

    /// Validates `value` and deserializes it.
    pub fn decode<T: DeserializeOwned>(&self, value: Value) -> Result<T, ServiceError> {
        self.validate(&value)?;
        serde_json::from_value(value).map_err(|e| ServiceError::malformed(e.to_string()))
    }

    /// Renders the schema as JSON Schema for services that accept one.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for spec in &self.fields {
            let property = match &spec.kind {
                FieldKind::String => json!({"type": "string"}),
                FieldKind::NonEmptyString => json!({"type": "string", "minLength": 1}),
                FieldKind::Number { min, max } => {
                    let mut p = json!({"type": "number"});
                    if let Some(min) = min {
                        p["minimum"] = json!(min);
                    }
                    if let Some(max) = max {
                        p["maximum"] = json!(max);
                    }
                    p
                }
                FieldKind::Boolean => json!({"type": "boolean"}),
            };
            properties.insert(spec.name.clone(), property);
            if spec.required {
                required.push(Value::String(spec.name.clone()));
            }
        }

        json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn check_field(spec: &FieldSpec, value: &Value) -> Result<(), ServiceError> {
    match &spec.kind {
        FieldKind::String => value
            .as_str()
            .map(|_| ())
            .ok_or_else(|| ServiceError::schema(&spec.name, "a string")),
        FieldKind::NonEmptyString => match value.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(()),
            _ => Err(ServiceError::schema(&spec.name, "a non-empty string")),
        },
        FieldKind::Boolean => value
            .as_bool()
            .map(|_| ())
            .ok_or_else(|| ServiceError::schema(&spec.name, "a boolean")),
        FieldKind::Number { min, max } => {
            let Some(n) = value.as_f64() else {
                return Err(ServiceError::schema(&spec.name, "a number"));
            };
            let lo = min.unwrap_or(f64::NEG_INFINITY);
            let hi = max.unwrap_or(f64::INFINITY);
            if n.is_finite() && n >= lo && n <= hi {
                Ok(())
            } else {
                Err(ServiceError::OutOfRange {
                    field: spec.name.clone(),
                    value: n,
                    min: lo,
                    max: hi,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentiment() -> ResponseSchema {
        ResponseSchema::new("sentiment")
            .number("score", -10.0, 10.0)
            .non_empty_string("sentiment")
    }

    #[test]
    fn test_valid_object() {
        assert!(sentiment().validate(&json!({"score": -10, "sentiment": "grim"})).is_ok());
        assert!(sentiment().validate(&json!({"score": 9.5, "sentiment": "ok", "extra": 1})).is_ok());
    }

    #[test]
    fn test_missing_field() {
        let err = sentiment().validate(&json!({"score": 1})).unwrap_err();
        assert_eq!(
            err,
            ServiceError::schema("sentiment", "a value (field is required)")
        );
    }

    #[test]
    fn test_wrong_types() {
        assert!(sentiment().validate(&json!({"score": "5", "sentiment": "x"})).is_err());
        assert!(sentiment().validate(&json!({"score": 5, "sentiment": "  "})).is_err());
        assert!(sentiment().validate(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_out_of_range() {
        let err = sentiment()
            .validate(&json!({"score": 10.5, "sentiment": "ecstatic"}))
            .unwrap_err();
        assert!(matches!(err, ServiceError::OutOfRange { value, .. } if (value - 10.5).abs() < 1e-9));
    }

    #[test]
    fn test_optional_field() {
        let schema = ResponseSchema::new("opt").field("note", FieldKind::String, false);
        assert!(schema.validate(&json!({})).is_ok());
        assert!(schema.validate(&json!({"note": null})).is_ok());
        assert!(schema.validate(&json!({"note": 3})).is_err());
    }

    #[test]
    fn test_decode() {
        #[derive(Deserialize)]
        struct Answer {
            score: f64,
            sentiment: String,
        }
        let answer: Answer = sentiment()
            .decode(json!({"score": 2, "sentiment": "fine"}))
            .unwrap();
        assert!((answer.score - 2.0).abs() < f64::EPSILON);
        assert_eq!(answer.sentiment, "fine");
    }

    #[test]
    fn test_json_schema_rendering() {
        let rendered = sentiment().to_json_schema();
        assert_eq!(rendered["properties"]["score"]["maximum"], 10.0);
        assert_eq!(rendered["properties"]["sentiment"]["minLength"], 1);
        assert_eq!(rendered["required"], json!(["score", "sentiment"]));
    }
}
