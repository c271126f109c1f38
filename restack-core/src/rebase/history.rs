use super::action::ActionKind;
use super::messages::MessageStore;
use super::sequence::ActionSequence;
use crate::error::{RestackError, Result};
use crate::store::{ApplyOutcome, CommitStore};
use git2::Oid;
use graph::AncestryGraph;
use std::fmt;
use tracing::{debug, warn};

/// What the derivation needs from the object store
pub trait RebaseBackend {
    fn tree_of(&self, commit: Oid) -> Result<Oid>;

    fn full_message(&self, commit: Oid) -> Result<String>;

    /// Replay `commit`'s change on `base_tree`
    fn try_apply(&self, base_tree: Oid, commit: Oid) -> Result<ApplyOutcome>;
}

impl RebaseBackend for CommitStore {
    fn tree_of(&self, commit: Oid) -> Result<Oid> {
        CommitStore::tree_of(self, commit)
    }

    fn full_message(&self, commit: Oid) -> Result<String> {
        CommitStore::full_message(self, commit)
    }

    fn try_apply(&self, base_tree: Oid, commit: Oid) -> Result<ApplyOutcome> {
        CommitStore::try_apply(self, base_tree, commit)
    }
}

/// One commit of the history the rebase would produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryNode {
    pub position: usize,
    /// Previous node; `None` means the node sits directly on `onto`
    pub parent: Option<usize>,
    /// Resulting tree; a conflicted node keeps the last clean tree
    pub tree: Oid,
    pub message: String,
    /// Commits folded into this node, in application order
    pub sources: Vec<Oid>,
    /// Indices of the actions that built this node
    pub actions: Vec<usize>,
    /// Conflicted paths, empty when everything applied cleanly
    pub conflicts: Vec<String>,
    /// The rebase stops here for amending
    pub stops_for_edit: bool,
}

impl HistoryNode {
    pub fn is_conflicted(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Commit whose change opened this node
    pub fn origin(&self) -> Oid {
        self.sources[0]
    }
}

/// Outcome of one action after a derivation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Unprocessed,
    Applied { node: usize },
    AppliedWithConflict { node: usize },
    /// Dropped; `original` is the dropped commit's graph index
    Skipped { original: Option<u32> },
}

/// Non-fatal findings of a derivation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryWarning {
    /// A squash whose fold chain does not start with a reword
    SquashWithoutReword { action: usize },
}

impl fmt::Display for HistoryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryWarning::SquashWithoutReword { action } => write!(
                f,
                "action {}: squash without a preceding reword, messages are concatenated",
                action
            ),
        }
    }
}

/// The linear history a sequence of actions produces on top of `onto`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistory {
    pub onto: Oid,
    pub nodes: Vec<HistoryNode>,
    pub states: Vec<ActionState>,
    pub warnings: Vec<HistoryWarning>,
}

impl NewHistory {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn tip(&self) -> Option<&HistoryNode> {
        self.nodes.last()
    }

    pub fn conflict_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_conflicted()).count()
    }

    pub fn has_conflicts(&self) -> bool {
        self.conflict_count() > 0
    }

    /// Write the history as real commits and return the new tip.
    ///
    /// Authors are taken from each node's originating commit. Refuses while
    /// any node is conflicted; no ref is moved.
    pub fn materialize(&self, store: &CommitStore) -> Result<Oid> {
        let count = self.conflict_count();
        if count > 0 {
            return Err(RestackError::Conflict { count });
        }

        let mut tip = self.onto;
        for node in &self.nodes {
            let origin = store.find_commit(node.origin())?;
            let author = origin.author().to_owned();
            let parents: Vec<Oid> = if tip.is_zero() { Vec::new() } else { vec![tip] };
            tip = store.create_commit(node.tree, &parents, &author, &node.message)?;
            debug!(position = node.position, commit = %tip, "wrote rebased commit");
        }

        Ok(tip)
    }
}

/// Join a folded-in message onto the message it is squashed into
pub fn compose_messages(base: &str, folded: &str) -> String {
    format!("{}\n\n{}\n", base.trim_end(), folded.trim_end())
}

/// Replay the actions in order and describe the resulting history.
///
/// This is a full recompute: every state starts as `Unprocessed`. Conflicts are
/// recorded on the nodes and the pass carries on; structural problems (a fold
/// with nothing before it, missing objects) abort it.
pub fn derive_history<M, B>(
    sequence: &ActionSequence<M>,
    graph: &AncestryGraph,
    backend: &B,
) -> Result<NewHistory>
where
    M: MessageStore,
    B: RebaseBackend + ?Sized,
{
    let onto = graph.end();
    let mut tip_tree = backend.tree_of(onto)?;
    let mut nodes: Vec<HistoryNode> = Vec::new();
    let mut states = vec![ActionState::Unprocessed; sequence.len()];
    let mut warnings = Vec::new();
    // Kind of the action that opened the current tip node
    let mut chain_head: Option<ActionKind> = None;

    for (index, action) in sequence.iter().enumerate() {
        let edited = action.message.and_then(|id| sequence.message(id));

        match action.kind {
            ActionKind::Drop => {
                states[index] = ActionState::Skipped {
                    original: graph.index_of(&action.target),
                };
            }
            ActionKind::Pick | ActionKind::Reword | ActionKind::Edit => {
                let outcome = backend.try_apply(tip_tree, action.target)?;
                let message = match (action.kind, edited) {
                    (ActionKind::Reword | ActionKind::Edit, Some(text)) => text.to_string(),
                    _ => backend.full_message(action.target)?,
                };
                let (tree, conflicts) = match outcome {
                    ApplyOutcome::Clean(tree) => (tree, Vec::new()),
                    ApplyOutcome::Conflicted(paths) => (tip_tree, paths),
                };

                let position = nodes.len();
                states[index] = if conflicts.is_empty() {
                    ActionState::Applied { node: position }
                } else {
                    warn!(commit = %action.target, paths = ?conflicts, "conflict while applying");
                    ActionState::AppliedWithConflict { node: position }
                };
                nodes.push(HistoryNode {
                    position,
                    parent: position.checked_sub(1),
                    tree,
                    message,
                    sources: vec![action.target],
                    actions: vec![index],
                    conflicts,
                    stops_for_edit: action.kind == ActionKind::Edit,
                });
                tip_tree = tree;
                chain_head = Some(action.kind);
            }
            ActionKind::Squash | ActionKind::Fixup => {
                let Some(node) = nodes.last_mut() else {
                    return Err(RestackError::NothingToFold { index });
                };

                let clean = match backend.try_apply(node.tree, action.target)? {
                    ApplyOutcome::Clean(tree) => {
                        node.tree = tree;
                        true
                    }
                    ApplyOutcome::Conflicted(paths) => {
                        warn!(commit = %action.target, paths = ?paths, "conflict while folding");
                        for path in paths {
                            if !node.conflicts.contains(&path) {
                                node.conflicts.push(path);
                            }
                        }
                        false
                    }
                };

                if action.kind == ActionKind::Squash {
                    if chain_head != Some(ActionKind::Reword) {
                        warn!(action = index, "squash without a preceding reword");
                        warnings.push(HistoryWarning::SquashWithoutReword { action: index });
                    }
                    node.message = match edited {
                        Some(text) => text.to_string(),
                        None => compose_messages(&node.message, &backend.full_message(action.target)?),
                    };
                } else if let Some(text) = edited {
                    node.message = text.to_string();
                }

                node.sources.push(action.target);
                node.actions.push(index);
                tip_tree = node.tree;
                states[index] = if clean {
                    ActionState::Applied { node: node.position }
                } else {
                    ActionState::AppliedWithConflict { node: node.position }
                };
            }
        }
    }

    debug!(actions = sequence.len(), nodes = nodes.len(), "derived new history");
    Ok(NewHistory {
        onto,
        nodes,
        states,
        warnings,
    })
}
