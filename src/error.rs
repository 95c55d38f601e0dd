use std::fmt;
use std::io;

/// Fault recorded while shaping a response.
///
/// Faults never interrupt the chain. They are collected on the request state,
/// logged as they happen, and surfaced by [`crate::chain::Context::execute`].
#[derive(Debug)]
pub enum ResponseError {
    /// A status or header write was attempted after the status line was committed
    ///
    /// Only recorded when the context runs with [`crate::config::ResponseGuard::Strict`].
    AlreadyFinalized {
        /// The operation that was rejected (`"set_status"`, `"set_header"`, ...)
        operation: &'static str,
    },
    /// Status code outside the `100..=999` range accepted on the wire
    InvalidStatus {
        /// The rejected code
        code: u16,
    },
    /// Header name or value that cannot be represented on the wire
    ///
    /// Only recorded when the context runs with [`crate::config::ResponseGuard::Strict`].
    InvalidHeader {
        /// The header name as supplied by the caller
        name: String,
    },
    /// The response sink failed to accept payload bytes
    Transport(io::Error),
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseError::AlreadyFinalized { operation } => {
                write!(
                    f,
                    "response already finalized: {} called after the status line was written",
                    operation
                )
            }
            ResponseError::InvalidStatus { code } => {
                write!(f, "invalid status code {}: expected 100..=999", code)
            }
            ResponseError::InvalidHeader { name } => {
                write!(f, "invalid response header '{}'", name)
            }
            ResponseError::Transport(err) => write!(f, "response transport error: {}", err),
        }
    }
}

impl std::error::Error for ResponseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResponseError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ResponseError {
    fn from(err: io::Error) -> Self {
        ResponseError::Transport(err)
    }
}
