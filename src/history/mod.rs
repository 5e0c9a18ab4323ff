use crate::models::chat::Turn;
use log::debug;
use std::collections::VecDeque;

pub const DEFAULT_MAX_TURNS: usize = 10;

/// Rolling conversation log used as generation context.
///
/// The buffer itself does no locking; the agent keeps it behind a mutex.
#[derive(Debug, Clone)]
pub struct ConversationBuffer {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl Default for ConversationBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl ConversationBuffer {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_turns + 2),
            max_turns,
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
    }

    /// Evicts the oldest turns until the buffer is back at its cap.
    pub fn trim(&mut self) {
        let mut evicted = 0;
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            debug!("History trimmed: evicted {} turn(s), {} remain", evicted, self.turns.len());
        }
    }

    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}
