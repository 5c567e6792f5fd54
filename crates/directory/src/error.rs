use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown recipient: {id}")]
    UnknownRecipient { id: String },

    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn unknown_recipient(id: impl Into<String>) -> Self {
        Self::UnknownRecipient { id: id.into() }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
