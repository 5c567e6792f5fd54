use std::error::Error as StdError;

/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed channel errors shared across the channel traits.
///
/// A failed delivery to a single recipient is not an error: sinks report it
/// as `Ok(SendReceipt::Rejected)` from [`crate::MessageSink::send`]. Only the
/// loss of the channel itself surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport cannot be established or maintained at all.
    #[error("channel transport lost: {message}")]
    TransportLost { message: String },

    /// Transport-recovery command finished with a non-zero outcome.
    #[error("transport restart failed with status {status}")]
    RestartFailed { status: i32 },

    /// Wrapped source error from an external dependency.
    #[error("channel operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn transport_lost(message: impl std::fmt::Display) -> Self {
        Self::TransportLost {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
