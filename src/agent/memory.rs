use std::collections::VecDeque;

pub const MEMORY_CAPACITY: usize = 10;

/// One completed user turn: the input, the serialized command set the
/// generator produced, and the serialized execution results.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub user: String,
    pub commands: String,
    pub results: String,
}

/// Bounded short-term memory: the last `capacity` turns in insertion order,
/// oldest evicted first. Order matters — the prompt composer replays the
/// transcript chronologically.
#[derive(Debug)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::with_capacity(MEMORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ConversationMemory {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, turn: ConversationTurn) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Transcript block injected into the prompt. Empty string when no turns
    /// are stored so the composer can append it unconditionally.
    pub fn render(&self) -> String {
        if self.turns.is_empty() {
            return String::new();
        }
        let mut out = String::from("Recent conversation:\n");
        for turn in &self.turns {
            out.push_str(&format!(
                "User: {}\nLLM: {}\nAgent: {}\n",
                turn.user, turn.commands, turn.results
            ));
        }
        out.push('\n');
        out
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}
