use git2::Oid;
use thiserror::Error;

/// Failures while discovering an ancestry graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// A commit spec or ID could not be resolved
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// `end` is not reachable from `start` through first-parent steps
    #[error("{end} is not an ancestor of {start}")]
    NoPath { start: Oid, end: Oid },

    /// A commit on the path has more than one parent
    #[error("merge commit {commit} ({parents} parents) is not supported")]
    MergeCommitUnsupported { commit: Oid, parents: usize },

    /// Underlying object database error
    #[error(transparent)]
    Git(#[from] git2::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;
