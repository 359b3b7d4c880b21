//! Conversions between Terraform values and upstream JSON fields

use std::collections::HashMap;
use tfplug::plan_modifier::values_equal;
use tfplug::{Dynamic, State};

pub fn string_map(value: &Dynamic) -> Option<HashMap<String, String>> {
    value.as_map().map(|map| {
        map.iter()
            .filter_map(|(k, v)| v.as_string().map(|s| (k.clone(), s.clone())))
            .collect()
    })
}

pub fn string_list(value: &Dynamic) -> Option<Vec<String>> {
    value
        .as_list()
        .map(|list| list.iter().filter_map(|v| v.as_string().cloned()).collect())
}

pub fn integer(value: &Dynamic) -> Option<i64> {
    value.as_number().map(|n| n as i64)
}

pub fn map_value(map: HashMap<String, String>) -> Dynamic {
    Dynamic::Map(
        map.into_iter()
            .map(|(k, v)| (k, Dynamic::String(v)))
            .collect(),
    )
}

pub fn list_value(list: Vec<String>) -> Dynamic {
    Dynamic::List(list.into_iter().map(Dynamic::String).collect())
}

/// Sets `name` only when the upstream record carried the field
pub fn set_present<T: Into<Dynamic>>(state: &mut State, name: &str, value: Option<T>) {
    if let Some(value) = value {
        state.set(name, value);
    }
}

/// Replaces unknown plan values with the prior state's value
pub fn resolve_from_prior(mut plan: State, prior: &State) -> State {
    for (name, value) in plan.values.iter_mut() {
        if value.is_unknown() {
            *value = prior.get(name).clone();
        }
    }
    plan
}

/// Update field: `None` is left out of the body, `Some(None)` clears the
/// value upstream with an explicit `null`.
pub type Patch<T> = Option<Option<T>>;

/// Mutable attributes that differ between plan and prior state. Each
/// accessor returns the planned value only when it changed; a value removed
/// from configuration comes back as `Some(None)`.
pub struct Changes<'a> {
    plan: &'a State,
    prior: &'a State,
}

impl<'a> Changes<'a> {
    pub fn new(plan: &'a State, prior: &'a State) -> Self {
        Self { plan, prior }
    }

    pub fn changed(&self, name: &str) -> bool {
        !values_equal(self.plan.get(name), self.prior.get(name))
    }

    pub fn value<T>(&self, name: &str, convert: impl Fn(&Dynamic) -> Option<T>) -> Patch<T> {
        self.changed(name).then(|| convert(self.plan.get(name)))
    }

    pub fn string(&self, name: &str) -> Patch<String> {
        self.value(name, |v| v.as_string().cloned())
    }

    pub fn integer(&self, name: &str) -> Patch<i64> {
        self.value(name, integer)
    }

    pub fn string_map(&self, name: &str) -> Patch<HashMap<String, String>> {
        self.value(name, string_map)
    }
}
