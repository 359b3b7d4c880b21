//! Default value providers for attributes
//!
//! Defaults are evaluated during planning for Optional+Computed attributes
//! whose configuration value is null. The planned value becomes the default,
//! so the practitioner sees it in the plan rather than "known after apply".
//!
//! ```no_run
//! use tfplug::schema::AttributeBuilder;
//! use tfplug::defaults::StaticDefault;
//!
//! let tier = AttributeBuilder::string("tier")
//!     .optional()
//!     .computed()
//!     .default(StaticDefault::string("STANDARD"));
//! ```

use crate::types::Dynamic;

#[derive(Debug, Clone)]
pub struct DefaultRequest {
    pub attribute_path: String,
}

#[derive(Debug, Clone)]
pub struct DefaultResponse {
    pub value: Dynamic,
}

/// Provides the value of an attribute left unset in configuration
pub trait Default: Send + Sync {
    /// Human-readable description
    fn description(&self) -> String;

    fn default_value(&self, request: DefaultRequest) -> DefaultResponse;
}

/// StaticDefault provides a static default value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Box<dyn Default> {
        Box::new(Self { value })
    }

    pub fn string(value: &str) -> Box<dyn Default> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Box<dyn Default> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Box<dyn Default> {
        Self::create(Dynamic::Bool(value))
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        format!("static default value: {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: self.value.clone(),
        }
    }
}
