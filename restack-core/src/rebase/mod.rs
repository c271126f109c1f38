//! Pending rebase actions and everything derived from them.

pub mod action;
pub mod command;
pub mod history;
pub mod messages;
pub mod save;
pub mod script;
pub mod sequence;

pub use action::{Action, ActionKind};
pub use command::{EditCommand, EditHistory};
pub use history::{
    compose_messages, derive_history, ActionState, HistoryNode, HistoryWarning, NewHistory, RebaseBackend,
};
pub use messages::{MessageId, MessageStore, MessageTable};
pub use save::{SaveDocument, SavedAction};
pub use script::{amend_command, import_script, parse_script, render_script, ScriptLine, ScriptSource};
pub use sequence::ActionSequence;
