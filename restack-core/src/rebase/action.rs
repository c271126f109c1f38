use super::messages::MessageId;
use git2::Oid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a pending rebase step does with its commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Pick,
    Drop,
    Squash,
    Fixup,
    Reword,
    Edit,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Pick,
        ActionKind::Drop,
        ActionKind::Squash,
        ActionKind::Fixup,
        ActionKind::Reword,
        ActionKind::Edit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Pick => "pick",
            ActionKind::Drop => "drop",
            ActionKind::Squash => "squash",
            ActionKind::Fixup => "fixup",
            ActionKind::Reword => "reword",
            ActionKind::Edit => "edit",
        }
    }

    /// Squash and fixup fold into the commit produced before them
    pub fn folds_into_previous(&self) -> bool {
        matches!(self, ActionKind::Squash | ActionKind::Fixup)
    }

    /// Pick, reword and edit each produce a new commit
    pub fn creates_commit(&self) -> bool {
        matches!(self, ActionKind::Pick | ActionKind::Reword | ActionKind::Edit)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown action type '{}'", s))
    }
}

/// A single step of the pending rebase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    /// Commit the step applies
    pub target: Oid,
    /// Edited message, if the user wrote one
    pub message: Option<MessageId>,
}

impl Action {
    pub fn new(kind: ActionKind, target: Oid) -> Self {
        Self {
            kind,
            target,
            message: None,
        }
    }

    pub fn with_message(mut self, message: MessageId) -> Self {
        self.message = Some(message);
        self
    }
}
