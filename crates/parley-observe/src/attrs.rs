//! Span and field values shared by Parley's instrumentation.
//!
//! Field *names* are written inline at each `tracing` call site
//! (`conversation_id = %id`); the values here keep operation and service
//! labels consistent between the HTTP layer, the CLI, and exported spans.

/// Instrumentation scope and `service` field value.
pub const SERVICE_NAME: &str = "parley";

// --- Operation name values (`operation` field) ---

/// A human message submitted for storage and reply routing.
pub const OP_SUBMIT_MESSAGE: &str = "submit_message";

/// Conversation create, rename, delete, and membership changes.
pub const OP_MANAGE_CONVERSATION: &str = "manage_conversation";

/// Tag create, update, delete, attach, and detach.
pub const OP_MANAGE_TAG: &str = "manage_tag";

/// Response cache inspection and clearing.
pub const OP_CACHE_ADMIN: &str = "cache_admin";

/// API key verification on an incoming request.
pub const OP_AUTHENTICATE: &str = "authenticate";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_values_are_distinct() {
        let ops = [
            OP_SUBMIT_MESSAGE,
            OP_MANAGE_CONVERSATION,
            OP_MANAGE_TAG,
            OP_CACHE_ADMIN,
            OP_AUTHENTICATE,
        ];
        for (i, a) in ops.iter().enumerate() {
            for b in &ops[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
