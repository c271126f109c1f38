//! The textual todo script git's interactive rebase reads and writes.

use super::action::{Action, ActionKind};
use super::history::compose_messages;
use super::messages::MessageStore;
use super::sequence::ActionSequence;
use crate::error::{RestackError, Result};
use crate::store::CommitStore;
use git2::Oid;
use std::io::Write;
use tracing::debug;

/// Command line that rewrites the message of the commit just made
const AMEND_PREFIX: &str = "git commit --amend --only --allow-empty --cleanup=verbatim -m \"$(printf '%s\\n' ";
const AMEND_SUFFIX: &str = ")\"";

/// Commit lookups needed to read and write scripts
pub trait ScriptSource {
    fn resolve(&self, spec: &str) -> Result<Oid>;

    fn short_hash(&self, id: Oid) -> String;

    fn summary(&self, id: Oid) -> Result<String>;

    fn full_message(&self, id: Oid) -> Result<String>;
}

impl ScriptSource for CommitStore {
    fn resolve(&self, spec: &str) -> Result<Oid> {
        CommitStore::resolve(self, spec)
    }

    fn short_hash(&self, id: Oid) -> String {
        CommitStore::short_hash(self, id)
    }

    fn summary(&self, id: Oid) -> Result<String> {
        CommitStore::summary(self, id)
    }

    fn full_message(&self, id: Oid) -> Result<String> {
        CommitStore::full_message(self, id)
    }
}

/// One meaningful line of a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLine {
    Action {
        line: usize,
        kind: ActionKind,
        hash: String,
        summary: String,
    },
    /// A message amend for the preceding action
    Amend { line: usize, message: String },
}

impl ScriptLine {
    pub fn line(&self) -> usize {
        match self {
            ScriptLine::Action { line, .. } | ScriptLine::Amend { line, .. } => *line,
        }
    }
}

/// Parse a todo script without touching the repository.
///
/// Line numbers are 1-based. Blank lines and `#` comments are skipped.
pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>> {
    let mut lines = Vec::new();

    for (offset, raw) in text.lines().enumerate() {
        let line = offset + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (verb, rest) = split_word(trimmed);
        let kind = match verb {
            "pick" | "p" => ActionKind::Pick,
            "drop" | "d" => ActionKind::Drop,
            "squash" | "s" => ActionKind::Squash,
            "fixup" | "f" => ActionKind::Fixup,
            "reword" | "r" => ActionKind::Reword,
            "edit" | "e" => ActionKind::Edit,
            "exec" | "x" => {
                let message = parse_amend(rest).ok_or_else(|| RestackError::UnsupportedAction {
                    line,
                    directive: verb.to_string(),
                })?;
                lines.push(ScriptLine::Amend { line, message });
                continue;
            }
            "break" | "b" | "label" | "l" | "reset" | "t" | "merge" | "m" | "update-ref" | "u" => {
                return Err(RestackError::UnsupportedAction {
                    line,
                    directive: verb.to_string(),
                });
            }
            other => {
                return Err(RestackError::malformed_script(
                    line,
                    format!("unknown directive '{}'", other),
                ));
            }
        };

        let mut rest = rest;
        if kind == ActionKind::Fixup {
            let (flag, after) = split_word(rest);
            if flag == "-C" || flag == "-c" {
                rest = after;
            }
        }

        let (hash, summary) = split_word(rest);
        if hash.is_empty() {
            return Err(RestackError::malformed_script(line, format!("'{}' needs a commit", verb)));
        }

        lines.push(ScriptLine::Action {
            line,
            kind,
            hash: hash.to_string(),
            summary: summary.to_string(),
        });
    }

    Ok(lines)
}

/// Parse a script and resolve its commits into a sequence.
///
/// An amend line attaches its message to the action before it; a `pick`
/// followed by an amend becomes a `reword`.
pub fn import_script<M, S>(text: &str, source: &S, messages: M) -> Result<ActionSequence<M>>
where
    M: MessageStore,
    S: ScriptSource + ?Sized,
{
    let mut sequence = ActionSequence::with_store(messages);

    for entry in parse_script(text)? {
        match entry {
            ScriptLine::Action { line, kind, hash, .. } => {
                let target = source
                    .resolve(&hash)
                    .map_err(|_| RestackError::malformed_script(line, format!("unknown commit '{}'", hash)))?;
                sequence.append(Action::new(kind, target));
            }
            ScriptLine::Amend { line, message } => {
                let Some(index) = sequence.len().checked_sub(1) else {
                    return Err(RestackError::malformed_script(line, "message amend before any commit"));
                };
                match sequence.get(index).map(|action| action.kind) {
                    Some(ActionKind::Drop) => {
                        return Err(RestackError::malformed_script(line, "message amend after a drop"));
                    }
                    Some(ActionKind::Pick) => {
                        sequence.set_kind(index, ActionKind::Reword)?;
                    }
                    _ => {}
                }
                sequence.set_message(index, message)?;
            }
        }
    }

    debug!(actions = sequence.len(), "imported rebase script");
    Ok(sequence)
}

/// Write the script git would execute for this sequence
pub fn render_script<M, S, W>(sequence: &ActionSequence<M>, source: &S, out: &mut W) -> Result<()>
where
    M: MessageStore,
    S: ScriptSource + ?Sized,
    W: Write,
{
    // Message of the commit the next fold lands in
    let mut current: Option<String> = None;

    for action in sequence.iter() {
        let edited = action.message.and_then(|id| sequence.message(id));
        let hash = source.short_hash(action.target);
        let summary = source.summary(action.target)?;

        let (verb, amend) = match action.kind {
            ActionKind::Pick => {
                current = Some(source.full_message(action.target)?);
                ("pick", None)
            }
            ActionKind::Drop => ("drop", None),
            ActionKind::Reword | ActionKind::Edit => {
                // A reword is a pick plus an amend so git never opens an editor
                let verb = if action.kind == ActionKind::Edit { "edit" } else { "pick" };
                current = Some(match edited {
                    Some(text) => text.to_string(),
                    None => source.full_message(action.target)?,
                });
                (verb, edited.map(str::to_string))
            }
            ActionKind::Squash => {
                let message = match edited {
                    Some(text) => text.to_string(),
                    None => {
                        let folded = source.full_message(action.target)?;
                        match &current {
                            Some(base) => compose_messages(base, &folded),
                            None => folded,
                        }
                    }
                };
                current = Some(message.clone());
                ("fixup", Some(message))
            }
            ActionKind::Fixup => {
                if let Some(text) = edited {
                    current = Some(text.to_string());
                }
                ("fixup", edited.map(str::to_string))
            }
        };

        writeln!(out, "{} {} {}", verb, hash, summary)?;
        if let Some(message) = amend {
            writeln!(out, "exec {}", amend_command(&message)?)?;
        }
    }

    Ok(())
}

/// The `git commit --amend` command setting `message`
///
/// Each message line becomes one shell word; the message is kept verbatim so
/// lines starting with `#` survive.
pub fn amend_command(message: &str) -> Result<String> {
    let lines: Vec<&str> = if message.is_empty() { vec![""] } else { message.lines().collect() };
    let quoted = lines
        .into_iter()
        .map(shlex::try_quote)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| RestackError::Unquotable(e.to_string()))?;
    Ok(format!("{}{}{}", AMEND_PREFIX, quoted.join(" "), AMEND_SUFFIX))
}

/// Recover the message from an amend command this module rendered
fn parse_amend(command: &str) -> Option<String> {
    let words = command.trim().strip_prefix(AMEND_PREFIX)?.strip_suffix(AMEND_SUFFIX)?;
    let lines = shlex::split(words)?;
    Some(lines.join("\n"))
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(at) => (&text[..at], text[at..].trim()),
        None => (text, ""),
    }
}
