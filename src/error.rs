use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AugmentError>;

/// Errors raised by pipeline construction and application.
///
/// Construction-time problems (bad static parameters, registry misuse)
/// surface before any sample is processed; `Shape` is the only variant a
/// well-configured pipeline can produce at call time, and it aborts the
/// whole `Compose` invocation for that sample.
#[derive(Error, Debug)]
pub enum AugmentError {
    /// Invalid static parameters passed to a transform constructor.
    #[error("configuration: {message}")]
    Configuration { message: String },

    /// A pipeline spec referenced a name the registry does not know.
    #[error("unknown transform {name:?}")]
    UnknownTransform { name: String },

    /// An attempt to register a transform name twice.
    #[error("transform {name:?} is already registered")]
    DuplicateName { name: String },

    /// An array of unsupported rank/channel count, or mismatched
    /// parallel annotation sequences.
    #[error("shape: {message}")]
    Shape { message: String },

    /// A transform's params could not be decoded from configuration.
    #[error("invalid params for transform {name:?}")]
    InvalidParams {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AugmentError {
    pub fn configuration(message: impl Into<String>) -> Self {
        AugmentError::Configuration {
            message: message.into(),
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        AugmentError::Shape {
            message: message.into(),
        }
    }
}
