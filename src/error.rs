/// Error taxonomy for the adapter, factory and reader layers
use thiserror::Error;

use crate::hardware::HandlerError;

/// Errors raised by the sensor reading core.
///
/// Every variant carries enough context (the offending arguments or values)
/// to diagnose a failure without re-running with debug logging enabled.
/// Bus handler failures are wrapped transparently and never recovered here.
#[derive(Debug, Error)]
pub enum Error {
    /// Adapter initialization received an unsupported argument shape
    #[error("Invalid arguments. Passed arguments: {args}")]
    InvalidArguments { args: String },

    /// Factory was asked for an identifier it does not know
    #[error("Invalid reader. Reader {name} does not exist")]
    UnknownAdapter { name: String },

    /// A second factory construction was attempted
    #[error("Only 1 factory can be initialized. {existing} already constructed")]
    TooManyFactories { existing: usize },

    /// Malformed `repetitions` or `delay` passed to a collection burst
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    /// A value of the wrong type reached a typed boundary
    #[error("{name} has the wrong type: {desc}")]
    TypeValidation { name: String, desc: String },

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl Error {
    /// Short message without the diagnostic detail
    pub fn message(&self) -> &'static str {
        match self {
            Error::InvalidArguments { .. } => "Invalid arguments",
            Error::UnknownAdapter { .. } => "Invalid reader",
            Error::TooManyFactories { .. } => "Only 1 factory can be initialized",
            Error::InvalidParameter { .. } => "Invalid parameter",
            Error::TypeValidation { .. } => "Type validation failed",
            Error::Handler(_) => "Bus handler failure",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
