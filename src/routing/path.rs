//! Route path joining.

use crate::routing::RegistrationError;

/// Join a prefix and a segment into a normalised absolute path.
///
/// Empty segments and repeated slashes collapse; the result always starts
/// with `/` and never ends with one, except for the root itself.
pub fn join_path(prefix: &str, segment: &str) -> Result<String, RegistrationError> {
    let mut path = String::new();
    for part in prefix.split('/').chain(segment.split('/')) {
        if part.is_empty() {
            continue;
        }
        check_segment(part, prefix, segment)?;
        path.push('/');
        path.push_str(part);
    }
    if path.is_empty() {
        path.push('/');
    }
    Ok(path)
}

fn check_segment(part: &str, prefix: &str, segment: &str) -> Result<(), RegistrationError> {
    let reason = if part.chars().any(char::is_whitespace) {
        "whitespace in path"
    } else if part.contains(['?', '#']) {
        "query or fragment in path"
    } else if part == "." || part == ".." {
        "relative path segment"
    } else {
        return Ok(());
    };
    Err(RegistrationError::InvalidPath {
        path: format!("{prefix}/{segment}"),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join_path("/", "GetUser").unwrap(), "/GetUser");
        assert_eq!(join_path("", "GetAge").unwrap(), "/GetAge");
        assert_eq!(join_path("/api/", "/Login").unwrap(), "/api/Login");
        assert_eq!(join_path("api//v1", "users/{id}").unwrap(), "/api/v1/users/{id}");
        assert_eq!(join_path("/", "").unwrap(), "/");
        assert_eq!(join_path("", "").unwrap(), "/");
    }

    #[test]
    fn test_invalid_segments() {
        assert!(matches!(join_path("/api", "bad name"), Err(RegistrationError::InvalidPath { .. })));
        assert!(matches!(join_path("/api", "x?y=1"), Err(RegistrationError::InvalidPath { .. })));
        assert!(matches!(join_path("/api/..", "x"), Err(RegistrationError::InvalidPath { .. })));
    }
}
