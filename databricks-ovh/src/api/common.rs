//! Common types and utilities for the OVH API

use serde::{Deserialize, Deserializer};

/// OVH error body, e.g. `{"class":"Client::NotFound","message":"..."}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub message: Option<String>,
    pub class: Option<String>,
}

/// Identifier that upstream may send as a JSON string or a number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LenientId(pub String);

impl LenientId {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for LenientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            String(String),
            Int(i64),
            Float(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::String(s) => Ok(LenientId(s)),
            Raw::Int(n) => Ok(LenientId(n.to_string())),
            Raw::Float(f) => Ok(LenientId(f.to_string())),
        }
    }
}

/// The `id` of a create response, checked before the full record is decoded
#[derive(Debug, Deserialize)]
pub struct IdEnvelope {
    pub id: Option<LenientId>,
}
