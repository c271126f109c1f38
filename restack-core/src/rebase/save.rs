use super::action::{Action, ActionKind};
use super::messages::MessageStore;
use super::sequence::ActionSequence;
use crate::error::{RestackError, Result};
use git2::Oid;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// A pending rebase written to disk so it can be resumed later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDocument {
    /// Working directory of the repository
    pub repo: String,
    pub head: String,
    pub onto: String,
    /// Base commit of the ancestry graph
    pub root: String,
    pub actions: Vec<SavedAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAction {
    pub hash: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Edited message split into lines; empty when there is none
    #[serde(default)]
    pub lines: Vec<String>,
}

impl SaveDocument {
    pub fn from_sequence<M: MessageStore>(
        repo: &Path,
        head: Oid,
        onto: Oid,
        root: Oid,
        sequence: &ActionSequence<M>,
    ) -> Self {
        let actions = sequence
            .iter()
            .map(|action| SavedAction {
                hash: action.target.to_string(),
                kind: action.kind,
                lines: action
                    .message
                    .and_then(|id| sequence.message(id))
                    .map(|text| text.split('\n').map(str::to_string).collect())
                    .unwrap_or_default(),
            })
            .collect();

        SaveDocument {
            repo: repo.to_string_lossy().into_owned(),
            head: head.to_string(),
            onto: onto.to_string(),
            root: root.to_string(),
            actions,
        }
    }

    /// Rebuild the action list, storing edited messages in `messages`
    pub fn to_sequence<M: MessageStore>(&self, messages: M) -> Result<ActionSequence<M>> {
        let mut sequence = ActionSequence::with_store(messages);

        for (index, saved) in self.actions.iter().enumerate() {
            let target = parse_oid(&saved.hash, &format!("action {}", index))?;
            let mut action = Action::new(saved.kind, target);
            if !saved.lines.is_empty() {
                action = action.with_message(sequence.push_message(saved.lines.join("\n")));
            }
            sequence.append(action);
        }

        Ok(sequence)
    }

    pub fn head_id(&self) -> Result<Oid> {
        parse_oid(&self.head, "head")
    }

    pub fn onto_id(&self) -> Result<Oid> {
        parse_oid(&self.onto, "onto")
    }

    pub fn root_id(&self) -> Result<Oid> {
        parse_oid(&self.root, "root")
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let document: SaveDocument = serde_json::from_str(text)?;
        document.head_id()?;
        document.onto_id()?;
        document.root_id()?;
        Ok(document)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| RestackError::io(path, e))?;
        let document = Self::from_json(&text)?;
        debug!(path = %path.display(), actions = document.actions.len(), "loaded save document");
        Ok(document)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut text = self.to_json()?;
        text.push('\n');
        fs::write(path, text).map_err(|e| RestackError::io(path, e))?;
        debug!(path = %path.display(), actions = self.actions.len(), "wrote save document");
        Ok(())
    }
}

fn parse_oid(text: &str, field: &str) -> Result<Oid> {
    Oid::from_str(text).map_err(|_| RestackError::malformed_document(format!("{}: bad hash '{}'", field, text)))
}
