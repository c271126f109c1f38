//! Planning, checking and writing interactive rebases.

pub mod config;
pub mod error;
pub mod rebase;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::{Identity, RestackConfig, RootHandling, CONFIG_FILE_NAME};
pub use error::{RestackError, Result};
pub use rebase::{
    Action, ActionKind, ActionSequence, ActionState, EditCommand, EditHistory, HistoryNode, HistoryWarning,
    MessageId, MessageStore, MessageTable, NewHistory, SaveDocument,
};
pub use session::RebaseSession;
pub use store::{ApplyOutcome, ChangeStatus, CommitStore, FileChange};
