use ligo_common::BusError;

/// Conditions raised inside the relay core.
///
/// None of these reach a client: callers log them and drop the event.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A side-channel response could not be turned into a deliverable event.
    #[error("malformed side-channel response: {0}")]
    MalformedResponse(String),
    /// The session a response was addressed to is no longer live.
    #[error("session {0} is gone")]
    SessionGone(String),
    /// The session's outbound queue is full; it is not keeping up.
    #[error("mailbox for session {0} is full")]
    MailboxFull(String),
    #[error("publish to {topic} failed: {source}")]
    Publish {
        topic: &'static str,
        #[source]
        source: BusError,
    },
    #[error("history store error: {0}")]
    History(String),
}

impl From<diesel::result::Error> for RelayError {
    fn from(err: diesel::result::Error) -> Self {
        Self::History(err.to_string())
    }
}

impl From<diesel_async::pooled_connection::deadpool::PoolError> for RelayError {
    fn from(err: diesel_async::pooled_connection::deadpool::PoolError) -> Self {
        Self::History(err.to_string())
    }
}
