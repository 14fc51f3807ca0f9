use std::collections::HashSet;
use std::time::Duration;

use bevy::prelude::*;
use thiserror::Error;

use crate::events::EventBus;

use super::script::Token;
use super::session::DialogueSession;
use super::TriggerId;

/// Why a `begin` call was rejected. Non-fatal: callers drop the error and
/// the active conversation, if any, is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BeginError {
    /// The trigger is single-use and has already started a conversation.
    #[error("single-use trigger has already been used")]
    AlreadyUsed,
    /// A different trigger owns the active conversation.
    #[error("another conversation is already active")]
    SessionBusy,
}

/// What an [`SessionArbiter::advance`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// A tag or line was popped and forwarded; the conversation continues.
    Next(Token),
    /// The end marker was popped; the conversation is over.
    Ended,
    /// No-op: idle, wrong owner, or inside the debounce window.
    Ignored,
}

struct ActiveConversation {
    session: DialogueSession,
    wait_time: Duration,
    /// Earliest instant at which the next advance is accepted. Unarmed
    /// until the first successful advance of the session.
    deadline: Option<Duration>,
}

/// The single authority over which trigger owns the active conversation.
///
/// Exactly one conversation runs at a time. A trigger begins one, advances
/// it token by token, and either drains it to its end marker or force-ends
/// it early; every call from anything other than the current owner is a
/// no-op, so unrelated triggers can never perturb a running conversation.
///
/// The arbiter is an ordinary value (and a Bevy resource), never an
/// ambient global; hosts and tests construct as many independent ones as
/// they like. Time enters only through the `now` parameters, which the
/// driving system sources from [`Time::elapsed`].
#[derive(Resource, Default)]
pub struct SessionArbiter {
    active: Option<ActiveConversation>,
    used: HashSet<TriggerId>,
}

impl SessionArbiter {
    /// Starts a conversation owned by `trigger`, with sink notification
    /// `dialogue_began`.
    ///
    /// From idle: rejects a spent single-use trigger with
    /// [`BeginError::AlreadyUsed`], otherwise marks it used (when
    /// single-use) and takes ownership. While a conversation is active, a
    /// re-entrant call by the owner is an `Ok` no-op and anything else is
    /// [`BeginError::SessionBusy`]; begins never queue and never
    /// interrupt.
    pub fn begin(
        &mut self,
        trigger: TriggerId,
        single_use: bool,
        wait_time: Duration,
        tokens: Vec<Token>,
        events: &mut EventBus,
    ) -> Result<(), BeginError> {
        if let Some(active) = &self.active {
            if active.session.owner() == trigger {
                return Ok(());
            }
            return Err(BeginError::SessionBusy);
        }
        if single_use && !self.used.insert(trigger) {
            return Err(BeginError::AlreadyUsed);
        }
        self.active = Some(ActiveConversation {
            session: DialogueSession::new(trigger, tokens),
            wait_time,
            deadline: None,
        });
        events.emit(
            "dialogue_began",
            serde_json::json!({ "trigger": trigger.0 }),
            Some(trigger.0),
        );
        Ok(())
    }

    /// Pops and forwards the next token, if `trigger` owns the conversation
    /// and its debounce window has passed.
    ///
    /// A popped tag or line goes to the sink (`dialogue_tag` /
    /// `dialogue_line`) and the debounce deadline re-arms to
    /// `now + wait_time`. Popping the end marker destroys the session,
    /// emits `dialogue_ended` and returns the arbiter to idle. Calls from
    /// non-owners are [`AdvanceOutcome::Ignored`], deliberately not an
    /// error, as are calls while idle or inside the debounce window.
    pub fn advance(
        &mut self,
        trigger: TriggerId,
        now: Duration,
        events: &mut EventBus,
    ) -> AdvanceOutcome {
        let Some(active) = self.active.as_mut() else {
            return AdvanceOutcome::Ignored;
        };
        if active.session.owner() != trigger {
            return AdvanceOutcome::Ignored;
        }
        if let Some(deadline) = active.deadline {
            if now < deadline {
                return AdvanceOutcome::Ignored;
            }
        }
        active.deadline = Some(now + active.wait_time);

        match active.session.pop_next() {
            Token::EndOfScript => {
                self.active = None;
                events.emit(
                    "dialogue_ended",
                    serde_json::json!({ "trigger": trigger.0 }),
                    Some(trigger.0),
                );
                AdvanceOutcome::Ended
            }
            Token::Tag(tag) => {
                events.emit(
                    "dialogue_tag",
                    serde_json::json!({ "trigger": trigger.0, "tag": &tag }),
                    Some(trigger.0),
                );
                AdvanceOutcome::Next(Token::Tag(tag))
            }
            Token::Line(text) => {
                events.emit(
                    "dialogue_line",
                    serde_json::json!({ "trigger": trigger.0, "text": &text }),
                    Some(trigger.0),
                );
                AdvanceOutcome::Next(Token::Line(text))
            }
        }
    }

    /// Unconditionally ends the conversation owned by `trigger`, whatever
    /// is left in its queue (the zone-exit path). Returns whether a
    /// conversation actually ended; calls from non-owners or while idle are
    /// silent no-ops.
    pub fn force_end(&mut self, trigger: TriggerId, events: &mut EventBus) -> bool {
        match &self.active {
            Some(active) if active.session.owner() == trigger => {
                self.active = None;
                events.emit(
                    "dialogue_ended",
                    serde_json::json!({ "trigger": trigger.0 }),
                    Some(trigger.0),
                );
                true
            }
            _ => false,
        }
    }

    /// The trigger owning the active conversation, if one is running.
    pub fn owner(&self) -> Option<TriggerId> {
        self.active.as_ref().map(|a| a.session.owner())
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// Whether a single-use trigger has spent its one activation.
    pub fn is_used(&self, trigger: TriggerId) -> bool {
        self.used.contains(&trigger)
    }

    /// Queue depth of the active session, end marker included. Diagnostic.
    pub fn session_remaining(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.session.remaining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::script::tokenize;

    const WAIT: Duration = Duration::from_millis(300);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn begin(arbiter: &mut SessionArbiter, id: u64, script: &str, bus: &mut EventBus) {
        arbiter
            .begin(TriggerId(id), false, WAIT, tokenize(script), bus)
            .expect("begin should succeed");
    }

    #[test]
    fn owner_exists_exactly_while_a_session_is_active() {
        let mut bus = EventBus::default();
        let mut arbiter = SessionArbiter::default();
        assert!(arbiter.is_idle());
        assert_eq!(arbiter.owner(), None);

        begin(&mut arbiter, 1, "hi", &mut bus);
        assert!(!arbiter.is_idle());
        assert_eq!(arbiter.owner(), Some(TriggerId(1)));

        assert_eq!(arbiter.advance(TriggerId(1), ms(0), &mut bus), AdvanceOutcome::Next(Token::Line("hi".into())));
        assert_eq!(arbiter.owner(), Some(TriggerId(1)));

        assert_eq!(arbiter.advance(TriggerId(1), ms(500), &mut bus), AdvanceOutcome::Ended);
        assert!(arbiter.is_idle());
        assert_eq!(arbiter.owner(), None);
    }

    #[test]
    fn begin_while_busy_is_rejected_and_leaves_the_session_untouched() {
        let mut bus = EventBus::default();
        let mut arbiter = SessionArbiter::default();
        begin(&mut arbiter, 1, "one\ntwo", &mut bus);
        let depth = arbiter.session_remaining();

        let err = arbiter
            .begin(TriggerId(2), false, WAIT, tokenize("intruder"), &mut bus)
            .expect_err("a second trigger must not steal the session");
        assert_eq!(err, BeginError::SessionBusy);
        assert_eq!(arbiter.owner(), Some(TriggerId(1)));
        assert_eq!(arbiter.session_remaining(), depth);
    }

    #[test]
    fn reentrant_begin_by_the_owner_is_a_noop() {
        let mut bus = EventBus::default();
        let mut arbiter = SessionArbiter::default();
        begin(&mut arbiter, 1, "one\ntwo", &mut bus);
        let depth = arbiter.session_remaining();

        arbiter
            .begin(TriggerId(1), false, WAIT, tokenize("restart?"), &mut bus)
            .expect("re-entrant begin is not an error");
        assert_eq!(arbiter.session_remaining(), depth);
        // Only the first begin notified the sink.
        assert_eq!(bus.named("dialogue_began").count(), 1);
    }

    #[test]
    fn single_use_trigger_rejects_every_later_begin() {
        let mut bus = EventBus::default();
        let mut arbiter = SessionArbiter::default();
        arbiter
            .begin(TriggerId(7), true, WAIT, tokenize("once"), &mut bus)
            .expect("first activation");

        // Drain to the end marker.
        assert_eq!(arbiter.advance(TriggerId(7), ms(0), &mut bus), AdvanceOutcome::Next(Token::Line("once".into())));
        assert_eq!(arbiter.advance(TriggerId(7), ms(400), &mut bus), AdvanceOutcome::Ended);
        assert!(arbiter.is_used(TriggerId(7)));

        let err = arbiter
            .begin(TriggerId(7), true, WAIT, tokenize("again"), &mut bus)
            .expect_err("single-use trigger must stay spent");
        assert_eq!(err, BeginError::AlreadyUsed);
        assert!(arbiter.is_idle());
    }

    #[test]
    fn advance_from_idle_or_by_non_owner_is_ignored() {
        let mut bus = EventBus::default();
        let mut arbiter = SessionArbiter::default();
        assert_eq!(arbiter.advance(TriggerId(1), ms(0), &mut bus), AdvanceOutcome::Ignored);

        begin(&mut arbiter, 1, "one\ntwo", &mut bus);
        let depth = arbiter.session_remaining();
        assert_eq!(arbiter.advance(TriggerId(2), ms(0), &mut bus), AdvanceOutcome::Ignored);
        assert_eq!(arbiter.session_remaining(), depth);
    }

    #[test]
    fn debounce_swallows_the_second_rapid_advance() {
        let mut bus = EventBus::default();
        let mut arbiter = SessionArbiter::default();
        begin(&mut arbiter, 1, "one\ntwo\nthree", &mut bus);

        // First advance of a session is never debounced.
        assert_eq!(arbiter.advance(TriggerId(1), ms(0), &mut bus), AdvanceOutcome::Next(Token::Line("one".into())));
        // 100ms later: inside the 300ms window, no pop.
        assert_eq!(arbiter.advance(TriggerId(1), ms(100), &mut bus), AdvanceOutcome::Ignored);
        assert_eq!(arbiter.session_remaining(), Some(3));
        // At the deadline exactly: accepted, window re-arms from here.
        assert_eq!(arbiter.advance(TriggerId(1), ms(300), &mut bus), AdvanceOutcome::Next(Token::Line("two".into())));
        assert_eq!(arbiter.advance(TriggerId(1), ms(550), &mut bus), AdvanceOutcome::Ignored);
        assert_eq!(arbiter.advance(TriggerId(1), ms(600), &mut bus), AdvanceOutcome::Next(Token::Line("three".into())));
    }

    #[test]
    fn rejected_advance_does_not_rearm_the_window() {
        let mut bus = EventBus::default();
        let mut arbiter = SessionArbiter::default();
        begin(&mut arbiter, 1, "one\ntwo", &mut bus);
        assert_eq!(arbiter.advance(TriggerId(1), ms(0), &mut bus), AdvanceOutcome::Next(Token::Line("one".into())));

        // Hammer the window; the deadline must stay at 300ms, not creep.
        assert_eq!(arbiter.advance(TriggerId(1), ms(150), &mut bus), AdvanceOutcome::Ignored);
        assert_eq!(arbiter.advance(TriggerId(1), ms(299), &mut bus), AdvanceOutcome::Ignored);
        assert_eq!(arbiter.advance(TriggerId(1), ms(301), &mut bus), AdvanceOutcome::Next(Token::Line("two".into())));
    }

    #[test]
    fn force_end_returns_to_idle_from_any_queue_depth() {
        let mut bus = EventBus::default();
        let mut arbiter = SessionArbiter::default();

        // Deep queue.
        begin(&mut arbiter, 1, "one\ntwo\nthree\nfour", &mut bus);
        assert!(arbiter.force_end(TriggerId(1), &mut bus));
        assert!(arbiter.is_idle());

        // Nothing left but the end marker.
        begin(&mut arbiter, 2, "", &mut bus);
        assert_eq!(arbiter.session_remaining(), Some(1));
        assert!(arbiter.force_end(TriggerId(2), &mut bus));
        assert!(arbiter.is_idle());
        assert_eq!(bus.named("dialogue_ended").count(), 2);
    }

    #[test]
    fn force_end_by_non_owner_or_while_idle_is_ignored() {
        let mut bus = EventBus::default();
        let mut arbiter = SessionArbiter::default();
        assert!(!arbiter.force_end(TriggerId(1), &mut bus));

        begin(&mut arbiter, 1, "one", &mut bus);
        assert!(!arbiter.force_end(TriggerId(2), &mut bus));
        assert_eq!(arbiter.owner(), Some(TriggerId(1)));
        assert_eq!(bus.named("dialogue_ended").count(), 0);
    }

    #[test]
    fn sink_hears_began_tokens_and_ended_in_order() {
        let mut bus = EventBus::default();
        let mut arbiter = SessionArbiter::default();
        begin(&mut arbiter, 9, "[wave]Hi!", &mut bus);
        arbiter.advance(TriggerId(9), ms(0), &mut bus);
        arbiter.advance(TriggerId(9), ms(400), &mut bus);
        arbiter.advance(TriggerId(9), ms(800), &mut bus);

        let names: Vec<&str> = bus.recent.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["dialogue_began", "dialogue_tag", "dialogue_line", "dialogue_ended"]
        );
        assert_eq!(bus.recent[1].data["tag"], "[wave]");
        assert_eq!(bus.recent[2].data["text"], "Hi!");
        assert!(bus.recent.iter().all(|e| e.source == Some(9)));
    }

    #[test]
    fn non_single_use_trigger_can_run_many_sessions() {
        let mut bus = EventBus::default();
        let mut arbiter = SessionArbiter::default();
        for _ in 0..3 {
            begin(&mut arbiter, 4, "hello", &mut bus);
            assert_eq!(arbiter.advance(TriggerId(4), ms(0), &mut bus), AdvanceOutcome::Next(Token::Line("hello".into())));
            assert_eq!(arbiter.advance(TriggerId(4), ms(400), &mut bus), AdvanceOutcome::Ended);
        }
        assert!(!arbiter.is_used(TriggerId(4)));
        assert_eq!(bus.named("dialogue_began").count(), 3);
    }
}
