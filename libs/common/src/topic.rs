//! Topic names: the wire contract between the chat relay and the workers.

/// Chat messages to be broadcast to every live session.
pub const MESSAGING: &str = "messaging";

/// Translation requests and their (broadcast) results.
pub const TRANSLATE_REQUEST: &str = "translate-request";
pub const TRANSLATE_RESPONSE: &str = "ai-response";

/// Grammar-check requests and their (private) results.
pub const CHECK_GRAMMAR_REQUEST: &str = "check-grammar";
pub const CHECK_GRAMMAR_RESPONSE: &str = "check-grammar-response";

/// Bot questions and their (private) answers.
pub const ASK_BOT_REQUEST: &str = "ask-ligobot";
pub const ASK_BOT_RESPONSE: &str = "ask-ligobot-response";
