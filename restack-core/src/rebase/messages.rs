/// Handle to an edited message; stays valid for the life of its store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(usize);

impl MessageId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Storage for user-edited commit messages.
///
/// Stores are append-only so an id handed out once never changes meaning,
/// whatever happens to the actions referring to it.
pub trait MessageStore {
    fn push(&mut self, text: String) -> MessageId;

    fn get(&self, id: MessageId) -> Option<&str>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory message store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageTable {
    messages: Vec<String>,
}

impl MessageTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageStore for MessageTable {
    fn push(&mut self, text: String) -> MessageId {
        self.messages.push(text);
        MessageId(self.messages.len() - 1)
    }

    fn get(&self, id: MessageId) -> Option<&str> {
        self.messages.get(id.0).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.messages.len()
    }
}
