//! Error types for loading host state and assembling snapshots

use thiserror::Error;

/// Errors raised while turning host state into an economy snapshot.
///
/// The analyzer itself never fails; these only cover getting data in.
#[derive(Error, Debug)]
pub enum BossModeError {
    #[error("failed to read host state: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed host state: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("building id {id} appears more than once ({first} and {second})")]
    DuplicateUnit {
        id: u32,
        first: String,
        second: String,
    },
}

pub type Result<T> = std::result::Result<T, BossModeError>;
