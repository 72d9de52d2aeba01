//! Definition of errors.

use thiserror::Error;

pub type Result<T, E = DksplitError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DksplitError {
    #[error(transparent)]
    ResourceLoad(#[from] ResourceLoadError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgumentError),

    #[error("IOError: {0}")]
    Io(#[from] std::io::Error),
}

impl DksplitError {
    pub(crate) fn resource_load<S>(resource: &str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::ResourceLoad(ResourceLoadError {
            resource: resource.to_string(),
            msg: msg.into(),
        })
    }

    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }
}

/// Error used when a model resource is missing, truncated or mis-sized.
#[derive(Debug, Error)]
#[error("ResourceLoadError: {resource}: {msg}")]
pub struct ResourceLoadError {
    /// Name of the resource.
    pub(crate) resource: String,

    /// Error message.
    pub(crate) msg: String,
}

impl ResourceLoadError {
    /// Gets the name of the resource that failed to load.
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

/// Error used when an emission provider fails to score a batch.
#[derive(Debug, Error)]
#[error("InferenceError: {msg}")]
pub struct InferenceError {
    /// Error message.
    pub(crate) msg: String,
}

impl InferenceError {
    /// Creates a new error with the given message.
    ///
    /// Emission providers outside this crate use it to report failures.
    pub fn new<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self { msg: msg.into() }
    }
}

/// Error used when the argument is invalid.
#[derive(Debug, Error)]
#[error("InvalidArgumentError: {arg}: {msg}")]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}
