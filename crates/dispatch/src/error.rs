use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The channel itself failed; the batch was aborted. Per-item delivery
    /// failures never surface here.
    #[error(transparent)]
    Transport(#[from] lagebot_channels::Error),

    #[error(transparent)]
    Directory(#[from] lagebot_directory::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
