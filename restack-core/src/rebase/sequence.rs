use super::action::{Action, ActionKind};
use super::messages::{MessageId, MessageStore, MessageTable};
use crate::error::{RestackError, Result};
use graph::AncestryGraph;

/// The ordered, user-editable list of pending rebase steps
///
/// Mutators touch only the fields they name and hand back the previous
/// value, so every edit can be undone by applying the inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSequence<M: MessageStore = MessageTable> {
    actions: Vec<Action>,
    messages: M,
}

impl ActionSequence<MessageTable> {
    pub fn new() -> Self {
        Self::with_store(MessageTable::new())
    }
}

impl Default for ActionSequence<MessageTable> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MessageStore> ActionSequence<M> {
    pub fn with_store(messages: M) -> Self {
        Self {
            actions: Vec::new(),
            messages,
        }
    }

    /// A pick for every commit of the graph, oldest first
    pub fn picks_for(graph: &AncestryGraph, messages: M) -> Self {
        let mut sequence = Self::with_store(messages);
        for node in graph.commits_oldest_first() {
            sequence.append(Action::new(ActionKind::Pick, node.id));
        }
        sequence
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    pub fn messages(&self) -> &M {
        &self.messages
    }

    /// Text behind a message id
    pub fn message(&self, id: MessageId) -> Option<&str> {
        self.messages.get(id)
    }

    /// Edited message of the action at `index`, if any
    pub fn message_text(&self, index: usize) -> Option<&str> {
        self.get(index)
            .and_then(|action| action.message)
            .and_then(|id| self.messages.get(id))
    }

    /// Store a message without attaching it to an action
    pub fn push_message(&mut self, text: impl Into<String>) -> MessageId {
        self.messages.push(text.into())
    }

    /// Add an action at the end; returns its index
    pub fn append(&mut self, action: Action) -> usize {
        self.actions.push(action);
        self.actions.len() - 1
    }

    pub fn insert(&mut self, index: usize, action: Action) -> Result<()> {
        if index > self.actions.len() {
            return Err(RestackError::NoSuchAction(index));
        }
        self.actions.insert(index, action);
        Ok(())
    }

    /// Move one action to a new position, keeping the others in order
    pub fn move_action(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;

        if from < to {
            self.actions[from..=to].rotate_left(1);
        } else if to < from {
            self.actions[to..=from].rotate_right(1);
        }
        Ok(())
    }

    /// Change an action's kind; returns the previous kind
    pub fn set_kind(&mut self, index: usize, kind: ActionKind) -> Result<ActionKind> {
        self.check_index(index)?;
        let previous = self.actions[index].kind;
        self.actions[index].kind = kind;
        Ok(previous)
    }

    /// Attach a freshly edited message; returns the previously attached id
    pub fn set_message(&mut self, index: usize, text: impl Into<String>) -> Result<Option<MessageId>> {
        self.check_index(index)?;
        let id = self.messages.push(text.into());
        Ok(self.actions[index].message.replace(id))
    }

    /// Attach an already stored message (or none); returns the previous id
    pub fn set_message_id(&mut self, index: usize, id: Option<MessageId>) -> Result<Option<MessageId>> {
        self.check_index(index)?;
        if let Some(id) = id {
            if self.messages.get(id).is_none() {
                return Err(RestackError::NotFound(format!("message #{}", id.index())));
            }
        }
        Ok(std::mem::replace(&mut self.actions[index].message, id))
    }

    pub fn clear_message(&mut self, index: usize) -> Result<Option<MessageId>> {
        self.set_message_id(index, None)
    }

    /// Remove every action; stored messages stay addressable
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Check every action targets a commit being rebased
    pub fn validate_against(&self, graph: &AncestryGraph) -> Result<()> {
        for action in &self.actions {
            if action.target == graph.end() || !graph.contains(&action.target) {
                return Err(RestackError::NotInGraph(action.target.to_string()));
            }
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.actions.len() {
            Ok(())
        } else {
            Err(RestackError::NoSuchAction(index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Oid;
    use pretty_assertions::assert_eq;

    fn oid(n: u8) -> Oid {
        Oid::from_bytes(&[n; 20]).unwrap()
    }

    fn sample() -> ActionSequence {
        let mut sequence = ActionSequence::new();
        for n in 1..=5 {
            sequence.append(Action::new(ActionKind::Pick, oid(n)));
        }
        sequence
    }

    fn targets(sequence: &ActionSequence) -> Vec<Oid> {
        sequence.iter().map(|a| a.target).collect()
    }

    #[test]
    fn test_move_forward_and_back() {
        let mut sequence = sample();
        let original = targets(&sequence);

        sequence.move_action(1, 3).unwrap();
        assert_eq!(targets(&sequence), vec![oid(1), oid(3), oid(4), oid(2), oid(5)]);

        sequence.move_action(3, 1).unwrap();
        assert_eq!(targets(&sequence), original);

        sequence.move_action(4, 0).unwrap();
        assert_eq!(targets(&sequence), vec![oid(5), oid(1), oid(2), oid(3), oid(4)]);
    }

    #[test]
    fn test_move_keeps_message_ids() {
        let mut sequence = sample();
        sequence.set_message(2, "edited").unwrap();
        let id = sequence.get(2).unwrap().message;

        sequence.move_action(2, 0).unwrap();
        sequence.move_action(0, 4).unwrap();

        assert_eq!(sequence.get(4).unwrap().message, id);
        assert_eq!(sequence.get(4).unwrap().target, oid(3));
        assert_eq!(sequence.message_text(4), Some("edited"));
        assert_eq!(sequence.messages().len(), 1);
    }

    #[test]
    fn test_move_out_of_range() {
        let mut sequence = sample();
        assert!(matches!(sequence.move_action(0, 5), Err(RestackError::NoSuchAction(5))));
        assert!(matches!(sequence.move_action(7, 0), Err(RestackError::NoSuchAction(7))));
    }

    #[test]
    fn test_set_kind_returns_previous() {
        let mut sequence = sample();
        assert_eq!(sequence.set_kind(1, ActionKind::Fixup).unwrap(), ActionKind::Pick);
        assert_eq!(sequence.set_kind(1, ActionKind::Drop).unwrap(), ActionKind::Fixup);
        assert_eq!(sequence.get(1).unwrap().kind, ActionKind::Drop);
    }

    #[test]
    fn test_messages_survive_replacement_and_clear() {
        let mut sequence = sample();
        assert_eq!(sequence.set_message(0, "first").unwrap(), None);
        let first = sequence.get(0).unwrap().message.unwrap();
        assert_eq!(sequence.set_message(0, "second").unwrap(), Some(first));
        assert_eq!(sequence.message(first), Some("first"));

        assert!(sequence.clear_message(0).unwrap().is_some());
        assert_eq!(sequence.message_text(0), None);

        sequence.clear();
        assert!(sequence.is_empty());
        assert_eq!(sequence.message(first), Some("first"));
    }

    #[test]
    fn test_insert_bounds() {
        let mut sequence = sample();
        sequence.insert(5, Action::new(ActionKind::Drop, oid(9))).unwrap();
        sequence.insert(0, Action::new(ActionKind::Edit, oid(8))).unwrap();
        assert_eq!(sequence.len(), 7);
        assert_eq!(sequence.get(6).unwrap().target, oid(9));
        assert!(sequence.insert(9, Action::new(ActionKind::Pick, oid(7))).is_err());
    }
}
