use crate::command::{Command, CommandId};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

/// Id-indexed registry of commands with a single designated entry point.
///
/// This is the logical view of a program, kept for id-based lookups
/// independent of spatial state; the connector graph
/// ([`BlockGraph`](crate::graph::BlockGraph)) is what execution traverses.
#[derive(Debug, Default, Clone)]
pub struct ProgramSequence {
    commands: AHashMap<CommandId, Command>,
    entry: Option<CommandId>,
}

impl ProgramSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command by id, overwriting any previous command with the
    /// same id. The first command added becomes the entry.
    pub fn add(&mut self, command: Command) {
        let id = command.id;
        self.commands.insert(id, command);
        if self.entry.is_none() {
            self.entry = Some(id);
        }
    }

    /// Sets `from`'s logical successor to `to`. Silent no-op unless both
    /// ids are registered.
    pub fn link(&mut self, from: CommandId, to: CommandId) {
        if !self.commands.contains_key(&to) {
            return;
        }
        if let Some(command) = self.commands.get_mut(&from) {
            command.next = Some(to);
        }
    }

    /// Re-designates the entry. Silent no-op if `id` is not registered.
    pub fn set_entry(&mut self, id: CommandId) {
        if self.commands.contains_key(&id) {
            self.entry = Some(id);
        }
    }

    /// When `changed` is the current entry, re-picks the entry as the
    /// lowest-id command that is nobody's successor (`None` if every
    /// command is someone's successor).
    pub fn reconcile_entry(&mut self, changed: CommandId) {
        if self.entry != Some(changed) {
            return;
        }
        let successors: AHashSet<CommandId> =
            self.commands.values().filter_map(|c| c.next).collect();
        self.entry = self
            .commands
            .keys()
            .copied()
            .sorted()
            .find(|id| !successors.contains(id));
    }

    pub fn entry_id(&self) -> Option<CommandId> {
        self.entry
    }

    pub fn entry(&self) -> Option<&Command> {
        self.commands.get(&self.entry?)
    }

    pub fn get(&self, id: CommandId) -> Option<&Command> {
        self.commands.get(&id)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.entry = None;
    }
}
