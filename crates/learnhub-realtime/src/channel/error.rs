//! Subscription failures reported back to the client.

use thiserror::Error;

use learnhub_core::AppError;

/// Why a subscribe or unsubscribe request was refused.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel name does not parse.
    #[error("Unknown channel: {0}")]
    Unknown(String),
    /// The connection already holds the maximum number of subscriptions.
    #[error("Maximum subscriptions ({0}) reached")]
    LimitReached(usize),
    /// The caller may not observe this channel.
    #[error("Not authorized to subscribe to channel: {0}")]
    Forbidden(String),
    /// The personal channel cannot be dropped.
    #[error("Channel {0} cannot be unsubscribed")]
    Pinned(String),
    /// A lookup needed for the permission check failed.
    #[error(transparent)]
    Lookup(#[from] AppError),
}

impl ChannelError {
    /// Stable machine code sent in the error frame.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unknown(_) => "UNKNOWN_CHANNEL",
            Self::LimitReached(_) => "MAX_SUBSCRIPTIONS",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Pinned(_) => "PINNED_CHANNEL",
            Self::Lookup(e) if e.is_transient() => "UNAVAILABLE",
            Self::Lookup(_) => "INTERNAL",
        }
    }
}
