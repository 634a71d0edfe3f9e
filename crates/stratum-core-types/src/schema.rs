//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_PASS_ID: &str = "pass_id";

// Migration identifiers
pub const FIELD_FILE: &str = "file";
pub const FIELD_VERSION: &str = "version";
pub const FIELD_OLD_VERSION: &str = "old_version";
pub const FIELD_NEW_VERSION: &str = "new_version";
pub const FIELD_CHECKSUM: &str = "checksum";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Canonical operation names
pub const OP_BOOTSTRAP: &str = "bootstrap_copy";
pub const OP_CREATE_SCHEMA: &str = "create_schema";
pub const OP_FILE_MIGRATIONS: &str = "file_migrations";
pub const OP_CODE_MIGRATIONS: &str = "code_migrations";
pub const OP_ON_OPEN: &str = "on_open";
pub const OP_ON_CREATE: &str = "on_create";
pub const OP_ON_UPGRADE: &str = "on_upgrade";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_accessibility() {
        // Verify all constants are non-empty
        assert!(!FIELD_COMPONENT.is_empty());
        assert!(!FIELD_OP.is_empty());
        assert!(!FIELD_FILE.is_empty());
        assert!(!EVENT_START.is_empty());
        assert!(!EVENT_END.is_empty());
        assert!(!EVENT_END_ERROR.is_empty());
    }

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }

    #[test]
    fn test_lifecycle_ops_are_distinct() {
        assert_ne!(OP_ON_OPEN, OP_ON_CREATE);
        assert_ne!(OP_ON_CREATE, OP_ON_UPGRADE);
    }
}
