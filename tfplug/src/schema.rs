//! Schema types and builders for tfplug
//!
//! Providers declare their provider, resource and data source schemas with
//! [`SchemaBuilder`] and [`AttributeBuilder`]. Plan modifiers, defaults and
//! validators hang off individual attributes and are evaluated by the gRPC
//! service during validation and planning.

pub use crate::attribute_type::AttributeType;
use crate::defaults::Default;
use crate::plan_modifier::PlanModifier;
use crate::types::{Dynamic, State};
use crate::validator::Validator;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Attribute represents a single schema attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub default: Option<Arc<dyn Default>>,
    pub validators: Vec<Arc<dyn Validator>>,
}

// Manual Debug implementation since validators/modifiers don't implement Debug
impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("plan_modifiers", &self.plan_modifiers.len())
            .field("default", &self.default.as_ref().map(|d| d.description()))
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// Schema of a provider, resource or data source
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub description: String,
    pub attributes: HashMap<String, Attribute>,
}

pub type ProviderSchema = Schema;
pub type ResourceSchema = Schema;
pub type DataSourceSchema = Schema;

impl Schema {
    /// Attributes sorted by name, for stable output.
    pub fn sorted_attributes(&self) -> Vec<&Attribute> {
        let mut attrs: Vec<&Attribute> = self.attributes.values().collect();
        attrs.sort_by(|a, b| a.name.cmp(&b.name));
        attrs
    }

    /// Shapes `state` to this schema: every declared attribute is present,
    /// nested objects carry all their fields, undeclared keys are dropped
    /// and unknowns are resolved to null.
    pub fn complete_state(&self, mut state: State) -> State {
        let values = self
            .attributes
            .iter()
            .map(|(name, attr)| {
                let value = state.values.remove(name).unwrap_or(Dynamic::Null);
                (name.clone(), attr.r#type.conform(value.resolve_unknowns()))
            })
            .collect();
        State { values }
    }
}

/// AttributeBuilder provides fluent API for building attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, r#type: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                plan_modifiers: Vec::new(),
                default: None,
                validators: Vec::new(),
            },
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, AttributeType::Number)
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    pub fn list(name: &str, element: AttributeType) -> Self {
        Self::new(name, AttributeType::List(Box::new(element)))
    }

    pub fn map(name: &str, element: AttributeType) -> Self {
        Self::new(name, AttributeType::Map(Box::new(element)))
    }

    pub fn object(name: &str, fields: HashMap<String, AttributeType>) -> Self {
        Self::new(name, AttributeType::Object(fields))
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn plan_modifier(mut self, modifier: Box<dyn PlanModifier>) -> Self {
        self.attribute.plan_modifiers.push(Arc::from(modifier));
        self
    }

    pub fn default(mut self, default: Box<dyn Default>) -> Self {
        self.attribute.default = Some(Arc::from(default));
        self
    }

    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.attribute.validators.push(Arc::from(validator));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    description: String,
    attributes: HashMap<String, Attribute>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            description: String::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    pub fn attribute(mut self, builder: AttributeBuilder) -> Self {
        let attr = builder.build();
        self.attributes.insert(attr.name.clone(), attr);
        self
    }

    fn build(self, version: i64) -> Schema {
        Schema {
            version,
            description: self.description,
            attributes: self.attributes,
        }
    }

    pub fn build_provider(self) -> ProviderSchema {
        self.build(0)
    }

    pub fn build_resource(self, version: i64) -> ResourceSchema {
        self.build(version)
    }

    pub fn build_data_source(self, version: i64) -> DataSourceSchema {
        self.build(version)
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
