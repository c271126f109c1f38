use graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the restack core
#[derive(Debug, Error)]
pub enum RestackError {
    /// A hash or ref could not be resolved
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested ancestor relationship does not hold
    #[error("no path: {0}")]
    NoPath(String),

    /// A merge commit was met where only linear history is supported
    #[error("unsupported topology: {0}")]
    UnsupportedTopology(String),

    /// A rebase directive this tool does not implement
    #[error("line {line}: unsupported directive '{directive}'")]
    UnsupportedAction { line: usize, directive: String },

    /// A derived history still contains conflicted commits
    #[error("{count} commit(s) in the new history have conflicts")]
    Conflict { count: usize },

    /// A rebase script line could not be understood
    #[error("line {line}: {reason}")]
    MalformedScript { line: usize, reason: String },

    /// A save document is structurally invalid
    #[error("malformed save document: {0}")]
    MalformedSaveDocument(String),

    /// A squash or fixup has no earlier commit to fold into
    #[error("action {index} has no previous commit to fold into")]
    NothingToFold { index: usize },

    /// An action targets a commit outside the ancestry graph
    #[error("commit {0} is not part of the commits being rebased")]
    NotInGraph(String),

    /// A message cannot be passed through a shell command
    #[error("message cannot be quoted for the shell: {0}")]
    Unquotable(String),

    /// An action index is out of range
    #[error("no action at index {0}")]
    NoSuchAction(usize),

    /// Reading or writing a script or save document failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to an output stream failed
    #[error(transparent)]
    Write(#[from] std::io::Error),

    /// Object database error
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// Configuration file could not be parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl RestackError {
    pub fn malformed_script<S: Into<String>>(line: usize, reason: S) -> Self {
        RestackError::MalformedScript {
            line,
            reason: reason.into(),
        }
    }

    pub fn malformed_document<S: Into<String>>(msg: S) -> Self {
        RestackError::MalformedSaveDocument(msg.into())
    }

    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        RestackError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<GraphError> for RestackError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::CommitNotFound(spec) => RestackError::NotFound(spec),
            e @ GraphError::NoPath { .. } => RestackError::NoPath(e.to_string()),
            e @ GraphError::MergeCommitUnsupported { .. } => {
                RestackError::UnsupportedTopology(e.to_string())
            }
            GraphError::Git(e) => RestackError::Git(e),
        }
    }
}

impl From<toml::de::Error> for RestackError {
    fn from(err: toml::de::Error) -> Self {
        RestackError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RestackError {
    fn from(err: serde_json::Error) -> Self {
        RestackError::MalformedSaveDocument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RestackError>;
