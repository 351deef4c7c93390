/*
 * Error type shared by every layer of the frame compositor. All variants are
 * fatal: they describe either misuse of a native resource lifecycle, invalid
 * construction arguments, or a failing Graphics Backend call. Nothing inside
 * the crate retries; the surrounding application decides how to react.
 */
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// A surface/device-context transition was requested from the wrong state.
    ResourceState(String),
    /// Invalid construction or configuration arguments.
    Configuration(String),
    /// The Graphics Backend reported a failure.
    NativeCallFailed(String),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::ResourceState(msg) => write!(f, "Resource state error: {msg}"),
            PlatformError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            PlatformError::NativeCallFailed(msg) => write!(f, "Native call failed: {msg}"),
        }
    }
}

impl std::error::Error for PlatformError {}

#[cfg(target_os = "windows")]
impl From<windows::core::Error> for PlatformError {
    fn from(err: windows::core::Error) -> Self {
        PlatformError::NativeCallFailed(format!("{} (HRESULT {:?})", err.message(), err.code()))
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;
