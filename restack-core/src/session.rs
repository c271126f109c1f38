use crate::error::{RestackError, Result};
use crate::rebase::{
    derive_history, import_script, render_script, Action, ActionKind, ActionSequence, EditHistory,
    MessageTable, NewHistory, SaveDocument,
};
use crate::store::CommitStore;
use git2::Oid;
use graph::AncestryGraph;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// One interactive rebase being planned: the commits it covers and the
/// actions the user has chosen for them
pub struct RebaseSession {
    store: CommitStore,
    graph: AncestryGraph,
    sequence: ActionSequence<MessageTable>,
    edits: EditHistory,
}

impl RebaseSession {
    /// Plan a rebase of `head` onto `onto`, one pick per commit.
    ///
    /// Without `onto` the plan reaches down to the root of history, with a
    /// synthetic root standing in as the ancestor.
    pub fn open(store: CommitStore, head: &str, onto: Option<&str>) -> Result<Self> {
        let head = store.resolve(head)?;
        let onto = match onto {
            Some(spec) => store.resolve(spec)?,
            None => Oid::zero(),
        };
        Self::plan(store, head, onto)
    }

    pub fn plan(store: CommitStore, head: Oid, onto: Oid) -> Result<Self> {
        let graph = store.ancestry(head, onto)?;
        let sequence = ActionSequence::picks_for(&graph, MessageTable::new());
        info!(head = %head, onto = %graph.end(), commits = sequence.len(), "planned rebase");

        Ok(RebaseSession {
            store,
            graph,
            sequence,
            edits: EditHistory::new(),
        })
    }

    /// Resume from a save document against an already opened store
    pub fn from_document(store: CommitStore, document: &SaveDocument) -> Result<Self> {
        let head = document.head_id()?;
        let onto = document.onto_id()?;
        let root = document.root_id()?;
        if onto != root {
            return Err(RestackError::malformed_document(format!(
                "onto {} differs from root {}",
                onto, root
            )));
        }

        let graph = store.ancestry(head, onto)?;
        let sequence = document.to_sequence(MessageTable::new())?;
        sequence.validate_against(&graph)?;
        info!(head = %head, actions = sequence.len(), "resumed rebase plan");

        Ok(RebaseSession {
            store,
            graph,
            sequence,
            edits: EditHistory::new(),
        })
    }

    /// Resume a saved plan in the repository the document names
    pub fn resume<P: AsRef<Path>>(path: P) -> Result<Self> {
        let document = SaveDocument::load(path)?;
        let store = CommitStore::open(&document.repo)?;
        Self::from_document(store, &document)
    }

    /// Resume a saved plan against `store` instead of the recorded repository
    pub fn load<P: AsRef<Path>>(store: CommitStore, path: P) -> Result<Self> {
        let document = SaveDocument::load(path)?;
        Self::from_document(store, &document)
    }

    pub fn store(&self) -> &CommitStore {
        &self.store
    }

    pub fn graph(&self) -> &AncestryGraph {
        &self.graph
    }

    pub fn sequence(&self) -> &ActionSequence<MessageTable> {
        &self.sequence
    }

    pub fn head(&self) -> Oid {
        self.graph.start()
    }

    pub fn onto(&self) -> Oid {
        self.graph.end()
    }

    /// Replace the plan with a parsed todo script; edit history is reset
    pub fn import_script(&mut self, text: &str) -> Result<()> {
        let sequence = import_script(text, &self.store, MessageTable::new())?;
        sequence.validate_against(&self.graph)?;
        self.sequence = sequence;
        self.edits = EditHistory::new();
        Ok(())
    }

    /// Add an action for a commit of the graph
    pub fn append(&mut self, kind: ActionKind, target: Oid) -> Result<usize> {
        if target == self.graph.end() || !self.graph.contains(&target) {
            return Err(RestackError::NotInGraph(target.to_string()));
        }
        Ok(self.sequence.append(Action::new(kind, target)))
    }

    pub fn move_action(&mut self, from: usize, to: usize) -> Result<()> {
        self.edits.move_action(&mut self.sequence, from, to)
    }

    pub fn set_kind(&mut self, index: usize, kind: ActionKind) -> Result<()> {
        self.edits.set_kind(&mut self.sequence, index, kind)
    }

    pub fn set_message(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        self.edits.set_message(&mut self.sequence, index, text)
    }

    /// Undo the last edit; false when there was nothing to undo
    pub fn undo(&mut self) -> Result<bool> {
        Ok(self.edits.undo(&mut self.sequence)?.is_some())
    }

    pub fn redo(&mut self) -> Result<bool> {
        Ok(self.edits.redo(&mut self.sequence)?.is_some())
    }

    pub fn derive(&self) -> Result<NewHistory> {
        derive_history(&self.sequence, &self.graph, &self.store)
    }

    pub fn render_script<W: Write>(&self, out: &mut W) -> Result<()> {
        render_script(&self.sequence, &self.store, out)
    }

    pub fn script(&self) -> Result<String> {
        let mut out = Vec::new();
        self.render_script(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn document(&self) -> SaveDocument {
        SaveDocument::from_sequence(
            self.store.path(),
            self.head(),
            self.onto(),
            self.graph.end(),
            &self.sequence,
        )
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.document().save(path)
    }

    /// Write the new history and optionally point `branch` at it
    pub fn apply(&self, branch: Option<&str>) -> Result<Oid> {
        let history = self.derive()?;
        let tip = history.materialize(&self.store)?;

        if let Some(branch) = branch {
            let log = format!("restack: rebase onto {}", self.store.short_hash(self.onto()));
            self.store.update_branch(branch, tip, &log)?;
        }

        info!(tip = %tip, commits = history.len(), "applied rebase");
        Ok(tip)
    }
}
