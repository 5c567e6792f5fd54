use thiserror::Error;

/// Errors surfaced by [`crate::PlaceLookupService`] implementations.
///
/// Resolution itself never fails: lookup errors and timeouts are downgraded
/// to a no-match by the resolver.
#[derive(Debug, Error)]
pub enum Error {
    #[error("place lookup failed: {context}: {source}")]
    Lookup {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn lookup(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Lookup {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
