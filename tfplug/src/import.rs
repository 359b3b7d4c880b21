//! Import helpers for simplifying resource import implementations

use crate::request::{ImportStateRequest, ImportStateResponse};
use crate::types::{Diagnostics, State};

/// Sets the import ID to a single attribute in state
///
/// The remaining attributes are left null; Terraform follows an import with
/// a Read, which fills them in.
///
/// Example: ID "abc123" -> state.id = "abc123"
pub fn import_state_passthrough_id(attr_name: &str, request: &ImportStateRequest) -> ImportStateResponse {
    let mut diagnostics = Diagnostics::new();

    if request.id.is_empty() {
        diagnostics.add_error(
            "Missing import ID",
            Some(format!(
                "An identifier is required to import into attribute '{}'",
                attr_name
            )),
        );
        return ImportStateResponse {
            state: None,
            diagnostics,
        };
    }

    let mut state = State::new();
    state.set(attr_name, request.id.clone());

    ImportStateResponse {
        state: Some(state),
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_sets_only_the_target_attribute() {
        let request = ImportStateRequest {
            id: "abc123".to_string(),
        };

        let response = import_state_passthrough_id("id", &request);
        let state = response.state.unwrap();

        assert_eq!(state.values.len(), 1);
        assert_eq!(state.get_string("id"), Some("abc123".to_string()));
        assert!(!response.diagnostics.has_errors());
    }

    #[test]
    fn passthrough_rejects_empty_id() {
        let request = ImportStateRequest { id: String::new() };

        let response = import_state_passthrough_id("id", &request);

        assert!(response.state.is_none());
        assert_eq!(response.diagnostics.errors[0].summary, "Missing import ID");
    }
}
