//! Chat session state for the portfolio assistant
//!
//! `ChatSession` is UI-agnostic: the TUI drives it from its event loop, the
//! `ask` subcommand drives it directly, and the tests drive it with a stub
//! backend. Sending is split into `begin_send` (synchronous, appends the
//! question) and `settle` (appends the reply once the request finishes) so the
//! caller decides where the network await happens.

use async_trait::async_trait;
use log::{debug, warn};

use crate::api::ApiError;

/// Shown in place of any reply when the chat request fails
pub const FALLBACK_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Prompts offered while the transcript is empty
pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "What are Adam's main skills?",
    "Tell me about Adam's projects",
    "What technologies does Adam work with?",
    "What is Adam's experience?",
];

/// A chat message in the assistant conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Anything that can answer a single chat message
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, message: &str) -> Result<String, ApiError>;
}

pub fn project_question(name: &str) -> String {
    format!("Tell me about the project: {}", name)
}

pub fn skill_question(skill: &str) -> String {
    format!("What experience does Adam have with {}?", skill)
}

pub fn experience_question(company: &str) -> String {
    format!("Tell me about your experience at {}", company)
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    pending: bool,
    draft: String,
    cursor: usize, // char position in draft
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the submit affordance should be enabled
    pub fn can_submit(&self) -> bool {
        !self.pending && !self.draft.trim().is_empty()
    }

    /// Drop the transcript for a fresh conversation. An in-flight request is
    /// not cancelled; its reply lands in the new transcript.
    pub fn reset(&mut self) {
        self.transcript.clear();
    }

    // Draft editing

    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        self.cursor = self.draft.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.draft.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.draft.chars().count();
    }

    // Request lifecycle

    /// Start a send. Uses `text` when it is non-blank, otherwise the draft.
    ///
    /// Returns the text to transmit, or `None` when there is nothing to send or
    /// a request is already in flight. On `Some`, the user message is already
    /// in the transcript, the draft is cleared and the session is pending;
    /// the caller must eventually hand the outcome to [`ChatSession::settle`].
    pub fn begin_send(&mut self, text: Option<&str>) -> Option<String> {
        let resolved = match text.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => self.draft.trim().to_string(),
        };

        if resolved.is_empty() || self.pending {
            debug!("Ignoring send (empty: {}, pending: {})", resolved.is_empty(), self.pending);
            return None;
        }

        self.transcript.push(ChatMessage::user(resolved.clone()));
        self.draft.clear();
        self.cursor = 0;
        self.pending = true;

        Some(resolved)
    }

    /// Finish the in-flight request. Failures become the fallback message.
    pub fn settle(&mut self, result: Result<String, ApiError>) {
        let content = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chat request failed: {}", e);
                FALLBACK_MESSAGE.to_string()
            }
        };

        self.transcript.push(ChatMessage::assistant(content));
        self.pending = false;
    }

    /// Send and wait for the reply in one go.
    ///
    /// Returns false when the call was a no-op.
    pub async fn send<B>(&mut self, text: Option<&str>, backend: &B) -> bool
    where
        B: ChatBackend + ?Sized,
    {
        let Some(message) = self.begin_send(text) else {
            return false;
        };

        let result = backend.chat(&message).await;
        self.settle(result);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// Replies from a script, recording what it was asked
    struct ScriptedBackend {
        replies: Mutex<Vec<Result<String, ApiError>>>,
        received: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, ApiError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                received: Mutex::new(Vec::new()),
            }
        }

        fn received(&self) -> Vec<String> {
            self.received.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn chat(&self, message: &str) -> Result<String, ApiError> {
            self.received.lock().unwrap().push(message.to_string());
            self.replies.lock().unwrap().remove(0)
        }
    }

    #[tokio::test]
    async fn test_send_success_appends_exchange() {
        let backend = ScriptedBackend::new(vec![Ok("Hi there".to_string())]);
        let mut session = ChatSession::new();

        assert!(session.send(Some("Hello"), &backend).await);

        assert_eq!(
            session.transcript(),
            &[ChatMessage::user("Hello"), ChatMessage::assistant("Hi there")]
        );
        assert!(!session.is_pending());
        assert_eq!(backend.received(), vec!["Hello".to_string()]);
    }

    #[tokio::test]
    async fn test_send_failure_appends_fallback() {
        let backend = ScriptedBackend::new(vec![Err(ApiError::Status(
            StatusCode::INTERNAL_SERVER_ERROR,
        ))]);
        let mut session = ChatSession::new();

        session.send(Some("Hello"), &backend).await;

        assert_eq!(
            session.transcript(),
            &[ChatMessage::user("Hello"), ChatMessage::assistant(FALLBACK_MESSAGE)]
        );
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_blank_sends_are_noops() {
        let backend = ScriptedBackend::new(Vec::new());
        let mut session = ChatSession::new();

        assert!(!session.send(Some(""), &backend).await);
        assert!(!session.send(Some("   "), &backend).await);
        assert!(!session.send(None, &backend).await);

        assert!(session.transcript().is_empty());
        assert!(!session.is_pending());
        assert!(backend.received().is_empty());
    }

    #[test]
    fn test_begin_send_sets_pending_and_clears_draft() {
        let mut session = ChatSession::new();
        session.update_draft("  What is Rust?  ");

        let sent = session.begin_send(None);

        assert_eq!(sent.as_deref(), Some("What is Rust?"));
        assert!(session.is_pending());
        assert_eq!(session.draft(), "");
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.transcript(), &[ChatMessage::user("What is Rust?")]);
    }

    #[test]
    fn test_explicit_text_wins_over_draft() {
        let mut session = ChatSession::new();
        session.update_draft("from draft");

        let sent = session.begin_send(Some(" from button "));

        assert_eq!(sent.as_deref(), Some("from button"));
        // draft is cleared on any successful start
        assert_eq!(session.draft(), "");
    }

    #[test]
    fn test_blank_text_falls_back_to_draft() {
        let mut session = ChatSession::new();
        session.update_draft("draft question");

        assert_eq!(session.begin_send(Some("  ")).as_deref(), Some("draft question"));
    }

    #[test]
    fn test_send_while_pending_is_ignored() {
        let mut session = ChatSession::new();
        assert!(session.begin_send(Some("first")).is_some());

        session.update_draft("second");
        assert!(session.begin_send(None).is_none());
        assert!(session.begin_send(Some("third")).is_none());

        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.draft(), "second");
        assert!(session.is_pending());

        session.settle(Ok("reply".to_string()));
        assert!(!session.is_pending());
        assert!(session.begin_send(None).is_some());
    }

    #[test]
    fn test_transcript_is_append_only() {
        let mut session = ChatSession::new();
        let mut seen: Vec<ChatMessage> = Vec::new();

        let outcomes = [
            Ok("one".to_string()),
            Err(ApiError::Status(StatusCode::BAD_GATEWAY)),
            Ok("three".to_string()),
        ];

        for (i, outcome) in outcomes.into_iter().enumerate() {
            session.begin_send(Some(&format!("question {}", i)));
            session.settle(outcome);

            let transcript = session.transcript();
            assert!(transcript.len() >= seen.len());
            assert_eq!(&transcript[..seen.len()], seen.as_slice());
            seen = transcript.to_vec();
        }

        assert_eq!(seen.len(), 6);
        assert_eq!(seen[3], ChatMessage::assistant(FALLBACK_MESSAGE));
    }

    #[test]
    fn test_reset_clears_transcript_only() {
        let mut session = ChatSession::new();
        session.begin_send(Some("a"));
        session.settle(Ok("b".to_string()));
        session.update_draft("unsent");

        session.reset();

        assert!(session.transcript().is_empty());
        assert_eq!(session.draft(), "unsent");
    }

    #[test]
    fn test_draft_editing_is_utf8_safe() {
        let mut session = ChatSession::new();
        for c in "héllo".chars() {
            session.insert_char(c);
        }
        session.cursor_left();
        session.cursor_left();
        session.backspace();
        assert_eq!(session.draft(), "hélo");

        session.cursor_home();
        session.delete();
        assert_eq!(session.draft(), "élo");

        session.cursor_end();
        session.insert_newline();
        session.insert_char('!');
        assert_eq!(session.draft(), "élo\n!");
        assert!(session.can_submit());
    }

    #[test]
    fn test_question_builders() {
        assert_eq!(project_question("Foo"), "Tell me about the project: Foo");
        assert_eq!(skill_question("Rust"), "What experience does Adam have with Rust?");
        assert_eq!(experience_question("Acme"), "Tell me about your experience at Acme");
    }
}
