use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = ligo_common::id::prefixed_ulid("ws");
/// assert!(id.starts_with("ws_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Well-known ID prefixes.
pub mod prefix {
    /// Live websocket session.
    pub const SESSION: &str = "ws";
    /// Consumer name inside a topic consumer group.
    pub const CONSUMER: &str = "csm";
}
