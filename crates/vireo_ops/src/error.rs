//! Recording and flattening errors

use thiserror::Error;

/// Contract violations surfaced by the operation buffer.
///
/// These indicate caller bugs, not runtime data conditions: the operation
/// in progress is rejected and nothing is written to the buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpsError {
    #[error("macro handle belongs to a different frame buffer")]
    ForeignMacro,

    #[error("macro handle is stale: the frame buffer was reset after it was recorded")]
    StaleMacro,

    #[error("pop without a matching push")]
    PopUnderflow,

    #[error("{0} transform/clip scope(s) left open at end of stream")]
    UnbalancedScopes(usize),
}

pub type Result<T> = std::result::Result<T, OpsError>;
