//! Error type shared by both caches. It is [Clone] because one failed remote call is handed to every waiter of
//! the same key.

// Third party libraries.
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum CacheError {
    /// The bridge call itself failed, or the backend answered with an error.
    #[error("remote call `{command}` failed: {message}")]
    Remote { command: &'static str, message: String },

    /// The operation name is not part of the registry. This is a programming error, never cached as "no data".
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    #[error("malformed parameters for `{command}`: {message}")]
    MalformedParams { command: String, message: String },

    /// The resolved value could not be turned into the type the caller asked for.
    #[error("failed to decode result of `{command}`: {message}")]
    Decode { command: &'static str, message: String },

    /// The task driving the remote call went away before it settled.
    #[error("remote call `{command}` aborted: {message}")]
    Aborted { command: &'static str, message: String },

    /// A fire-and-forget price request could not even be issued.
    #[error("failed to issue price request for {type_id}: {message}")]
    Issue { type_id: i64, message: String },

    #[error("malformed push event `{event}`: {message}")]
    MalformedEvent { event: String, message: String },
}

impl CacheError {
    /// Keep a [CacheError] the source already produced, wrap everything else as a remote failure of `command`.
    pub fn from_remote(command: &'static str, err: anyhow::Error) -> Self {
        match err.downcast::<CacheError>() {
            Ok(err) => err,
            Err(err) => CacheError::Remote {
                command,
                message: format!("{err:#}"),
            },
        }
    }
}
