//! Topic name, topic filter, and client identifier checks.
//!
//! The codec only checks characters; matching filters against names belongs to
//! the broker.

/// Multi-level wildcard
pub const WILDCARD_MULTI: u8 = b'#';
/// Single-level wildcard
pub const WILDCARD_SINGLE: u8 = b'+';

/// A PUBLISH topic name: non-empty, no wildcard characters.
pub fn is_valid_topic_name(topic: &[u8]) -> bool {
    !topic.is_empty()
        && !topic
            .iter()
            .any(|&b| b == WILDCARD_MULTI || b == WILDCARD_SINGLE)
}

/// A SUBSCRIBE/UNSUBSCRIBE topic filter: non-empty. Wildcards are allowed.
pub fn is_valid_topic_filter(filter: &[u8]) -> bool {
    !filter.is_empty()
}

/// A non-empty client identifier may only contain `0-9`, `a-z`, `A-Z`.
///
/// Identifiers longer than 23 bytes are accepted.
pub fn is_valid_client_id(id: &[u8]) -> bool {
    id.iter().all(u8::is_ascii_alphanumeric)
}
