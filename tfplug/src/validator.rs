use crate::types::{AttributePath, Diagnostics, Dynamic};

/// Checks a known configuration value. Validators are not called for null
/// or unknown values.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics);
}

/// Accepts only strings from a fixed set
pub struct StringOneOfValidator {
    pub values: Vec<String>,
}

impl StringOneOfValidator {
    pub fn create(values: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            values: values.iter().map(|v| v.to_string()).collect(),
        })
    }
}

impl Validator for StringOneOfValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if !self.values.contains(s) {
                diagnostics.add_attribute_error(
                    AttributePath::new(attribute_path),
                    format!("Invalid value for {}", attribute_path),
                    format!(
                        "Value must be one of: {}, got: {:?}",
                        self.values.join(", "),
                        s
                    ),
                );
            }
        }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRangeValidator {
    pub fn at_least(min: f64) -> Box<dyn Validator> {
        Box::new(Self {
            min: Some(min),
            max: None,
        })
    }
}

impl Validator for NumberRangeValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(n) = value.as_number() {
            if let Some(min) = self.min {
                if n < min {
                    diagnostics.add_attribute_error(
                        AttributePath::new(attribute_path),
                        format!("{} must be at least {}", attribute_path, min),
                        format!("Got {}", n),
                    );
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    diagnostics.add_attribute_error(
                        AttributePath::new(attribute_path),
                        format!("{} must be at most {}", attribute_path, max),
                        format!("Got {}", n),
                    );
                }
            }
        }
    }
}

/// Rejects numbers with a fractional part, for attributes sent upstream as
/// integers
pub struct WholeNumberValidator;

impl WholeNumberValidator {
    pub fn create() -> Box<dyn Validator> {
        Box::new(Self)
    }
}

impl Validator for WholeNumberValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(n) = value.as_number() {
            if n.fract() != 0.0 {
                diagnostics.add_attribute_error(
                    AttributePath::new(attribute_path),
                    format!("{} must be a whole number", attribute_path),
                    format!("Got {}", n),
                );
            }
        }
    }
}

/// Requires a string holding a JSON object
pub struct JsonObjectValidator;

impl Validator for JsonObjectValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            match serde_json::from_str::<serde_json::Value>(s) {
                Ok(serde_json::Value::Object(_)) => {}
                Ok(other) => diagnostics.add_attribute_error(
                    AttributePath::new(attribute_path),
                    format!("{} must be a JSON object", attribute_path),
                    format!("Got a JSON {}", json_kind(&other)),
                ),
                Err(e) => diagnostics.add_attribute_error(
                    AttributePath::new(attribute_path),
                    format!("{} must be valid JSON", attribute_path),
                    e.to_string(),
                ),
            }
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
