//! Placeholder payload types.

use serde::{Deserialize, Serialize};

/// A request payload with no fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyRequest {}

/// A response payload with no fields. Serialises as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResponse {}

crate::aggregate!(EmptyRequest, EmptyResponse);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::binder::{bind, BindSource};

    #[test]
    fn test_empty_payloads() {
        let bound = bind(EmptyRequest::default, &BindSource {
            content_type: Some("application/json"),
            body: br#"{"ignored":1}"#,
            query: Some("x=1"),
        })
        .unwrap();
        assert_eq!(bound, EmptyRequest {});
        assert_eq!(serde_json::to_string(&EmptyResponse {}).unwrap(), "{}");
    }
}
