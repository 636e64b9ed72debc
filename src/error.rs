//! Crate-level error types.

use std::fmt;

/// Errors produced by the gpu-select crate.
#[derive(Debug)]
pub enum SelectError {
    /// A nearest second pass was requested without a usable first-pass hit
    /// count.
    MissingFirstPass {
        /// Hit count handed to `begin` (`None` is the "no prior pass"
        /// sentinel).
        previous_hits: Option<usize>,
        /// Records actually present in the hit buffer.
        buffered: usize,
    },
    /// Occlusion results could not be read back from the GPU.
    QueryReadback(String),
    /// No compatible GPU adapter found.
    Adapter(wgpu::RequestAdapterError),
    /// GPU device request failed.
    Gpu(wgpu::RequestDeviceError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFirstPass {
                previous_hits: None,
                ..
            } => {
                write!(f, "nearest second pass started without a first pass")
            }
            Self::MissingFirstPass {
                previous_hits: Some(n),
                buffered,
            } => write!(
                f,
                "second pass expects {n} first-pass hits but the buffer \
                 holds {buffered}"
            ),
            Self::QueryReadback(msg) => {
                write!(f, "occlusion query readback failed: {msg}")
            }
            Self::Adapter(e) => {
                write!(f, "no compatible GPU adapter found: {e}")
            }
            Self::Gpu(e) => write!(f, "device request failed: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for SelectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Adapter(e) => Some(e),
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::RequestAdapterError> for SelectError {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        Self::Adapter(e)
    }
}

impl From<wgpu::RequestDeviceError> for SelectError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for SelectError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_first_pass_messages() {
        let err = SelectError::MissingFirstPass {
            previous_hits: None,
            buffered: 0,
        };
        assert_eq!(
            err.to_string(),
            "nearest second pass started without a first pass"
        );

        let err = SelectError::MissingFirstPass {
            previous_hits: Some(3),
            buffered: 1,
        };
        assert_eq!(
            err.to_string(),
            "second pass expects 3 first-pass hits but the buffer holds 1"
        );
    }

    #[test]
    fn io_errors_keep_their_source() {
        use std::error::Error;

        let err = SelectError::from(std::io::Error::other("disk"));
        assert!(err.source().is_some());
        assert!(SelectError::QueryReadback("lost".to_owned())
            .source()
            .is_none());
    }
}
