use std::collections::VecDeque;

use crate::api::ChatMessage;
use crate::core::message::{Message, Role};

/// State of the input surface.
///
/// `Idle -> Submitting` happens only on a user-role submit;
/// `Submitting -> Idle` happens only when the matching worker's completion
/// arrives. Success and error completions are indistinguishable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Submitting,
}

impl TurnState {
    pub fn input_enabled(self) -> bool {
        self == TurnState::Idle
    }
}

/// The conversation memory: an append-only ordered message list that is
/// the literal prompt context sent to the daemon on every request. Only
/// the explicit purge operation clears it.
#[derive(Debug, Default)]
pub struct Session {
    messages: VecDeque<Message>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    pub fn purge(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// Snapshot the session in the daemon's wire format. The worker is
    /// bound to this copy; later session mutations do not affect an
    /// in-flight request.
    pub fn api_messages(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .map(|msg| ChatMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

/// What a submit attempt did, so the caller knows whether a worker must
/// be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only input; nothing changed.
    Rejected,
    /// Message appended with a non-user role; no model call follows.
    Appended,
    /// User message appended; the caller must start exactly one worker.
    NeedsCompletion,
}

/// Append `input` to the session under `role`, per the submit contract.
///
/// Content is trimmed before appending; the trimmed text is what the
/// daemon will see as prompt context.
pub fn submit(session: &mut Session, role: Role, input: &str) -> SubmitOutcome {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return SubmitOutcome::Rejected;
    }

    session.push(Message::new(role, trimmed));
    if role.is_user() {
        SubmitOutcome::NeedsCompletion
    } else {
        SubmitOutcome::Appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_appends_exactly_one_message() {
        let mut session = Session::new();
        let outcome = submit(&mut session, Role::User, "hi");
        assert_eq!(outcome, SubmitOutcome::NeedsCompletion);
        assert_eq!(session.len(), 1);
        assert_eq!(session.last().unwrap(), &Message::user("hi"));
    }

    #[test]
    fn submit_trims_content() {
        let mut session = Session::new();
        submit(&mut session, Role::User, "  hello there \n");
        assert_eq!(session.last().unwrap().content, "hello there");
    }

    #[test]
    fn whitespace_only_input_is_rejected() {
        let mut session = Session::new();
        for input in ["", "   ", "\t\n", " \r\n "] {
            assert_eq!(submit(&mut session, Role::User, input), SubmitOutcome::Rejected);
        }
        assert!(session.is_empty());
    }

    #[test]
    fn non_user_roles_do_not_need_completion() {
        let mut session = Session::new();
        assert_eq!(
            submit(&mut session, Role::System, "be terse"),
            SubmitOutcome::Appended
        );
        assert_eq!(
            submit(&mut session, Role::Assistant, "canned reply"),
            SubmitOutcome::Appended
        );
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn purge_empties_any_session() {
        let mut session = Session::new();
        for i in 0..20 {
            session.push(Message::user(format!("msg {i}")));
        }
        session.purge();
        assert!(session.is_empty());
    }

    #[test]
    fn api_messages_preserve_order_and_roles() {
        let mut session = Session::new();
        submit(&mut session, Role::System, "be terse");
        submit(&mut session, Role::User, "hi");
        session.push(Message::assistant("Hello"));

        let api = session.api_messages();
        let pairs: Vec<(&str, &str)> = api
            .iter()
            .map(|m| (m.role.as_str(), m.content.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("system", "be terse"), ("user", "hi"), ("assistant", "Hello")]
        );
    }

    #[test]
    fn turn_state_gates_input() {
        assert!(TurnState::Idle.input_enabled());
        assert!(!TurnState::Submitting.input_enabled());
    }
}
