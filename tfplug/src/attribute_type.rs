use crate::types::Dynamic;
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

impl AttributeType {
    /// JSON encoding of the cty type, as carried in schema attributes.
    pub fn to_json(&self) -> Value {
        match self {
            AttributeType::String => json!("string"),
            AttributeType::Number => json!("number"),
            AttributeType::Bool => json!("bool"),
            AttributeType::List(elem) => json!(["list", elem.to_json()]),
            AttributeType::Set(elem) => json!(["set", elem.to_json()]),
            AttributeType::Map(elem) => json!(["map", elem.to_json()]),
            AttributeType::Object(attrs) => {
                let fields: serde_json::Map<String, Value> = attrs
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.to_json()))
                    .collect();
                json!(["object", fields])
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }

    /// Whether `value` conforms to this type. Null and unknown conform to
    /// every type.
    pub fn accepts(&self, value: &Dynamic) -> bool {
        match (value, self) {
            (Dynamic::Null | Dynamic::Unknown, _) => true,
            (Dynamic::String(_), AttributeType::String) => true,
            (Dynamic::Number(_), AttributeType::Number) => true,
            (Dynamic::Bool(_), AttributeType::Bool) => true,
            (Dynamic::List(list), AttributeType::List(elem) | AttributeType::Set(elem)) => {
                list.iter().all(|v| elem.accepts(v))
            }
            (Dynamic::Map(map), AttributeType::Map(elem)) => map.values().all(|v| elem.accepts(v)),
            (Dynamic::Map(map), AttributeType::Object(attrs)) => {
                map.keys().all(|k| attrs.contains_key(k))
                    && attrs
                        .iter()
                        .all(|(k, ty)| map.get(k).map_or(true, |v| ty.accepts(v)))
            }
            _ => false,
        }
    }

    /// Fills in missing object fields with null so the value matches the
    /// full object type, recursing through collections.
    pub fn conform(&self, value: Dynamic) -> Dynamic {
        match (self, value) {
            (AttributeType::Object(attrs), Dynamic::Map(mut map)) => {
                for (name, ty) in attrs {
                    let field = map.remove(name).unwrap_or(Dynamic::Null);
                    map.insert(name.clone(), ty.conform(field));
                }
                Dynamic::Map(map)
            }
            (AttributeType::List(elem) | AttributeType::Set(elem), Dynamic::List(list)) => {
                Dynamic::List(list.into_iter().map(|v| elem.conform(v)).collect())
            }
            (AttributeType::Map(elem), Dynamic::Map(map)) => Dynamic::Map(
                map.into_iter()
                    .map(|(k, v)| (k, elem.conform(v)))
                    .collect(),
            ),
            (_, value) => value,
        }
    }
}
