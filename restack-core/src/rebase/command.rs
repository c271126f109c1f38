use super::action::ActionKind;
use super::messages::{MessageId, MessageStore};
use super::sequence::ActionSequence;
use crate::error::{RestackError, Result};

/// A reversible edit of an [`ActionSequence`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCommand {
    Move { from: usize, to: usize },
    SetKind { index: usize, from: ActionKind, to: ActionKind },
    SetMessage { index: usize, from: Option<MessageId>, to: Option<MessageId> },
}

impl EditCommand {
    pub fn apply<M: MessageStore>(&self, sequence: &mut ActionSequence<M>) -> Result<()> {
        match *self {
            EditCommand::Move { from, to } => sequence.move_action(from, to),
            EditCommand::SetKind { index, to, .. } => sequence.set_kind(index, to).map(|_| ()),
            EditCommand::SetMessage { index, to, .. } => sequence.set_message_id(index, to).map(|_| ()),
        }
    }

    pub fn revert<M: MessageStore>(&self, sequence: &mut ActionSequence<M>) -> Result<()> {
        self.inverse().apply(sequence)
    }

    /// The command that undoes this one
    pub fn inverse(&self) -> EditCommand {
        match *self {
            EditCommand::Move { from, to } => EditCommand::Move { from: to, to: from },
            EditCommand::SetKind { index, from, to } => EditCommand::SetKind { index, from: to, to: from },
            EditCommand::SetMessage { index, from, to } => {
                EditCommand::SetMessage { index, from: to, to: from }
            }
        }
    }
}

/// Linear undo/redo over sequence edits
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a command and record it; clears the redo stack
    pub fn execute<M: MessageStore>(
        &mut self,
        sequence: &mut ActionSequence<M>,
        command: EditCommand,
    ) -> Result<()> {
        command.apply(sequence)?;
        self.undo_stack.push(command);
        self.redo_stack.clear();
        Ok(())
    }

    pub fn move_action<M: MessageStore>(
        &mut self,
        sequence: &mut ActionSequence<M>,
        from: usize,
        to: usize,
    ) -> Result<()> {
        self.execute(sequence, EditCommand::Move { from, to })
    }

    pub fn set_kind<M: MessageStore>(
        &mut self,
        sequence: &mut ActionSequence<M>,
        index: usize,
        kind: ActionKind,
    ) -> Result<()> {
        let from = sequence
            .get(index)
            .ok_or(RestackError::NoSuchAction(index))?
            .kind;
        self.execute(sequence, EditCommand::SetKind { index, from, to: kind })
    }

    pub fn set_message<M: MessageStore>(
        &mut self,
        sequence: &mut ActionSequence<M>,
        index: usize,
        text: impl Into<String>,
    ) -> Result<()> {
        let from = sequence
            .get(index)
            .ok_or(RestackError::NoSuchAction(index))?
            .message;
        let to = Some(sequence.push_message(text));
        self.execute(sequence, EditCommand::SetMessage { index, from, to })
    }

    /// Revert the most recent command; returns it if there was one
    pub fn undo<M: MessageStore>(&mut self, sequence: &mut ActionSequence<M>) -> Result<Option<EditCommand>> {
        let Some(command) = self.undo_stack.pop() else {
            return Ok(None);
        };
        if let Err(e) = command.revert(sequence) {
            self.undo_stack.push(command);
            return Err(e);
        }
        self.redo_stack.push(command);
        Ok(Some(command))
    }

    /// Re-apply the most recently undone command
    pub fn redo<M: MessageStore>(&mut self, sequence: &mut ActionSequence<M>) -> Result<Option<EditCommand>> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(None);
        };
        if let Err(e) = command.apply(sequence) {
            self.redo_stack.push(command);
            return Err(e);
        }
        self.undo_stack.push(command);
        Ok(Some(command))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rebase::action::Action;
    use git2::Oid;
    use pretty_assertions::assert_eq;

    fn oid(n: u8) -> Oid {
        Oid::from_bytes(&[n; 20]).unwrap()
    }

    fn sample() -> ActionSequence {
        let mut sequence = ActionSequence::new();
        for n in 1..=4 {
            sequence.append(Action::new(ActionKind::Pick, oid(n)));
        }
        sequence
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut sequence = sample();
        let original = sequence.clone();
        let mut history = EditHistory::new();

        history.move_action(&mut sequence, 0, 3).unwrap();
        history.set_kind(&mut sequence, 1, ActionKind::Squash).unwrap();
        history.set_message(&mut sequence, 1, "combined").unwrap();
        let edited = sequence.clone();

        while history.undo(&mut sequence).unwrap().is_some() {}
        assert_eq!(sequence.actions(), original.actions());
        assert!(!history.can_undo());

        while history.redo(&mut sequence).unwrap().is_some() {}
        assert_eq!(sequence.actions(), edited.actions());
        assert_eq!(sequence.message_text(1), Some("combined"));
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut sequence = sample();
        let mut history = EditHistory::new();

        history.set_kind(&mut sequence, 0, ActionKind::Drop).unwrap();
        history.undo(&mut sequence).unwrap();
        assert!(history.can_redo());

        history.move_action(&mut sequence, 2, 1).unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn test_failed_command_is_not_recorded() {
        let mut sequence = sample();
        let mut history = EditHistory::new();

        assert!(history.move_action(&mut sequence, 0, 10).is_err());
        assert!(!history.can_undo());
        assert!(history.set_kind(&mut sequence, 10, ActionKind::Drop).is_err());
    }

    #[test]
    fn test_inverse_of_inverse() {
        let command = EditCommand::SetKind {
            index: 2,
            from: ActionKind::Pick,
            to: ActionKind::Reword,
        };
        assert_eq!(command.inverse().inverse(), command);
    }
}
