use std::collections::{HashMap, VecDeque};

use crate::net::{ClientCommand, CommandKind};

pub const MAX_UNCONFIRMED_COMMANDS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingCommand {
    pub command: ClientCommand,
    pub sent_at_ms: f64,
}

/// Unconfirmed commands are only pruned; prediction replay would hook in here.
#[derive(Debug)]
pub struct CommandTracker {
    next_id: u32,
    control_state: HashMap<CommandKind, bool>,
    unconfirmed: VecDeque<PendingCommand>,
}

impl Default for CommandTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTracker {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            control_state: HashMap::new(),
            unconfirmed: VecDeque::with_capacity(MAX_UNCONFIRMED_COMMANDS),
        }
    }

    pub fn on_edge_event(
        &mut self,
        kind: CommandKind,
        active: bool,
        now_ms: f64,
    ) -> Option<ClientCommand> {
        if self.is_active(kind) == active {
            return None;
        }
        self.control_state.insert(kind, active);

        let command = ClientCommand {
            id: self.next_id,
            command: kind,
            active,
        };
        self.next_id = self.next_id.wrapping_add(1);

        while self.unconfirmed.len() >= MAX_UNCONFIRMED_COMMANDS {
            self.unconfirmed.pop_front();
        }
        self.unconfirmed.push_back(PendingCommand {
            command,
            sent_at_ms: now_ms,
        });

        Some(command)
    }

    pub fn acknowledge(&mut self, last_input: u32) -> Option<PendingCommand> {
        let mut newest = None;
        while self
            .unconfirmed
            .front()
            .is_some_and(|pending| pending.command.id <= last_input)
        {
            newest = self.unconfirmed.pop_front();
        }
        newest
    }

    pub fn is_active(&self, kind: CommandKind) -> bool {
        self.control_state.get(&kind).copied().unwrap_or(false)
    }

    pub fn unconfirmed(&self) -> impl Iterator<Item = &ClientCommand> {
        self.unconfirmed.iter().map(|pending| &pending.command)
    }

    pub fn unconfirmed_len(&self) -> usize {
        self.unconfirmed.len()
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn clear_unconfirmed(&mut self) {
        self.unconfirmed.clear();
    }
}
