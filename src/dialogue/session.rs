use std::collections::VecDeque;

use super::script::Token;
use super::TriggerId;

/// One run-through of a parsed script, owned by exactly one trigger.
///
/// Sessions are created by [`SessionArbiter::begin`] and mutated only
/// through [`SessionArbiter::advance`]; at most one exists at a time.
///
/// [`SessionArbiter::begin`]: super::arbiter::SessionArbiter::begin
/// [`SessionArbiter::advance`]: super::arbiter::SessionArbiter::advance
#[derive(Debug)]
pub struct DialogueSession {
    owner: TriggerId,
    queue: VecDeque<Token>,
}

impl DialogueSession {
    pub(crate) fn new(owner: TriggerId, tokens: Vec<Token>) -> Self {
        Self {
            owner,
            queue: tokens.into(),
        }
    }

    pub fn owner(&self) -> TriggerId {
        self.owner
    }

    /// Removes and returns the front token. Popping [`Token::EndOfScript`]
    /// means the session is over; popping again after that is a host-loop
    /// logic error that trips an assertion in debug builds and re-yields
    /// `EndOfScript` in release builds.
    pub fn pop_next(&mut self) -> Token {
        debug_assert!(
            !self.queue.is_empty(),
            "pop_next called again after EndOfScript"
        );
        self.queue.pop_front().unwrap_or(Token::EndOfScript)
    }

    /// Tokens left in the queue, the end marker included. Diagnostic only.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}
