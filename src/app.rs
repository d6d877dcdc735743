use std::sync::Arc;

use log::{info, warn};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;

use crate::api::{ApiClient, ApiError};
use crate::chat::{
    experience_question, project_question, skill_question, ChatBackend, ChatSession,
    SUGGESTED_QUESTIONS,
};
use crate::portfolio::{load_portfolio, Experience, PortfolioData, Project};
use crate::render::MessageRenderer;
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeSection {
    Projects,
    Experience,
    Skills,
}

impl HomeSection {
    pub fn all() -> [HomeSection; 3] {
        [HomeSection::Projects, HomeSection::Experience, HomeSection::Skills]
    }

    pub fn title(&self) -> &'static str {
        match self {
            HomeSection::Projects => "Projects",
            HomeSection::Experience => "Experience",
            HomeSection::Skills => "Skills",
        }
    }

    fn next(self) -> Self {
        match self {
            HomeSection::Projects => HomeSection::Experience,
            HomeSection::Experience => HomeSection::Skills,
            HomeSection::Skills => HomeSection::Projects,
        }
    }

    fn prev(self) -> Self {
        match self {
            HomeSection::Projects => HomeSection::Skills,
            HomeSection::Experience => HomeSection::Projects,
            HomeSection::Skills => HomeSection::Experience,
        }
    }
}

/// A skill together with the category it is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillEntry<'a> {
    pub category: &'a str,
    pub skill: &'a str,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub view: View,
    pub session: ChatSession,
    pub portfolio: Option<PortfolioData>,

    // Home state
    pub section: HomeSection,
    pub project_state: ListState,
    pub experience_state: ListState,
    pub skill_state: ListState,

    // Chat state
    pub suggestion_state: ListState,
    pub chat_scroll: u16,
    pub chat_follow: bool, // keep the newest message in view
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub list_area: Option<Rect>,
    pub detail_area: Option<Rect>,
    pub chat_area: Option<Rect>,

    // Services
    pub client: ApiClient,
    pub renderer: Box<dyn MessageRenderer>,
    backend: Arc<dyn ChatBackend>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        client: ApiClient,
        renderer: Box<dyn MessageRenderer>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let backend: Arc<dyn ChatBackend> = Arc::new(client.clone());

        Self {
            should_quit: false,
            view: View::Home,
            session: ChatSession::new(),
            portfolio: None,

            section: HomeSection::Projects,
            project_state: ListState::default(),
            experience_state: ListState::default(),
            skill_state: ListState::default(),

            suggestion_state: ListState::default(),
            chat_scroll: 0,
            chat_follow: true,
            animation_frame: 0,

            list_area: None,
            detail_area: None,
            chat_area: None,

            client,
            renderer,
            backend,
            events,
        }
    }

    /// Answer chat messages with something other than the HTTP client
    pub fn with_backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.backend = backend;
        self
    }

    // View controller

    pub fn navigate(&mut self, view: View) {
        self.view = view;
        if view == View::Chat {
            self.chat_follow = true;
        }
    }

    /// Switch to the chat and send `text` in one step.
    ///
    /// The composite always lands in the chat view; `view` is accepted so
    /// callers read the same as a plain `navigate`.
    pub fn navigate_and_send(&mut self, view: View, text: &str) {
        if view != View::Chat {
            warn!("navigate_and_send({:?}) always opens the chat view", view);
        }
        self.navigate(View::Chat);
        self.send(Some(text));
    }

    pub fn start_new_chat(&mut self) {
        self.session.reset();
        self.chat_scroll = 0;
        self.chat_follow = true;
        self.suggestion_state.select(None);
    }

    // Chat session

    /// Start a send and run the request in the background. The reply comes
    /// back through the event channel as `AppEvent::ChatSettled`.
    pub fn send(&mut self, text: Option<&str>) {
        let Some(message) = self.session.begin_send(text) else {
            return;
        };

        info!("Sending chat message ({} chars)", message.chars().count());
        self.chat_follow = true;
        self.suggestion_state.select(None);

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.chat(&message).await;
            // Receiver is gone when the app has quit; nothing to deliver to
            let _ = events.send(AppEvent::ChatSettled(result));
        });
    }

    pub fn chat_settled(&mut self, result: Result<String, ApiError>) {
        self.session.settle(result);
        self.chat_follow = true;
    }

    /// Send the highlighted suggestion, if any
    pub fn send_selected_suggestion(&mut self) -> bool {
        let Some(question) = self
            .suggestion_state
            .selected()
            .and_then(|i| SUGGESTED_QUESTIONS.get(i).copied())
        else {
            return false;
        };
        self.navigate_and_send(View::Chat, question);
        true
    }

    pub fn suggestions_visible(&self) -> bool {
        self.session.transcript().is_empty() && !self.session.is_pending()
    }

    pub fn suggestion_nav_down(&mut self) {
        let len = SUGGESTED_QUESTIONS.len();
        let i = self.suggestion_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.suggestion_state.select(Some(i));
    }

    pub fn suggestion_nav_up(&mut self) {
        let i = self.suggestion_state.selected().unwrap_or(0);
        self.suggestion_state.select(Some(i.saturating_sub(1)));
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_follow = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    // Portfolio data

    /// Fetch the portfolio in the background, delivered as `AppEvent::PortfolioLoaded`
    pub fn spawn_portfolio_load(&self) {
        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let data = load_portfolio(&client).await;
            let _ = events.send(AppEvent::PortfolioLoaded(data));
        });
    }

    pub fn portfolio_loaded(&mut self, data: Option<PortfolioData>) {
        self.portfolio = data;
        if let Some(portfolio) = &self.portfolio {
            if !portfolio.projects.is_empty() {
                self.project_state.select(Some(0));
            }
            if !portfolio.experience.is_empty() {
                self.experience_state.select(Some(0));
            }
            if !self.skill_entries().is_empty() {
                self.skill_state.select(Some(0));
            }
        }
    }

    pub fn projects(&self) -> &[Project] {
        self.portfolio.as_ref().map(|p| p.projects.as_slice()).unwrap_or_default()
    }

    pub fn experience(&self) -> &[Experience] {
        self.portfolio.as_ref().map(|p| p.experience.as_slice()).unwrap_or_default()
    }

    /// All skills flattened in category order
    pub fn skill_entries(&self) -> Vec<SkillEntry<'_>> {
        self.portfolio
            .iter()
            .flat_map(|p| p.skills.iter())
            .flat_map(|c| {
                c.skills.iter().map(move |s| SkillEntry {
                    category: c.category.as_str(),
                    skill: s.as_str(),
                })
            })
            .collect()
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.project_state.selected().and_then(|i| self.projects().get(i))
    }

    pub fn selected_experience(&self) -> Option<&Experience> {
        self.experience_state.selected().and_then(|i| self.experience().get(i))
    }

    pub fn selected_skill(&self) -> Option<SkillEntry<'_>> {
        self.skill_state
            .selected()
            .and_then(|i| self.skill_entries().get(i).copied())
    }

    // Home navigation

    pub fn next_section(&mut self) {
        self.section = self.section.next();
    }

    pub fn prev_section(&mut self) {
        self.section = self.section.prev();
    }

    fn section_len(&self) -> usize {
        match self.section {
            HomeSection::Projects => self.projects().len(),
            HomeSection::Experience => self.experience().len(),
            HomeSection::Skills => self.skill_entries().len(),
        }
    }

    fn section_state(&mut self) -> &mut ListState {
        match self.section {
            HomeSection::Projects => &mut self.project_state,
            HomeSection::Experience => &mut self.experience_state,
            HomeSection::Skills => &mut self.skill_state,
        }
    }

    pub fn home_nav_down(&mut self) {
        let len = self.section_len();
        if len > 0 {
            let state = self.section_state();
            let i = state.selected().unwrap_or(0);
            state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn home_nav_up(&mut self) {
        let state = self.section_state();
        let i = state.selected().unwrap_or(0);
        state.select(Some(i.saturating_sub(1)));
    }

    /// The question the "Ask AI" affordance would send for the selection
    pub fn selected_question(&self) -> Option<String> {
        match self.section {
            HomeSection::Projects => self.selected_project().map(|p| project_question(&p.name)),
            HomeSection::Experience => {
                self.selected_experience().map(|e| experience_question(&e.company))
            }
            HomeSection::Skills => self.selected_skill().map(|s| skill_question(s.skill)),
        }
    }

    pub fn ask_about_selection(&mut self) {
        if let Some(question) = self.selected_question() {
            self.navigate_and_send(View::Chat, &question);
        }
    }

    /// URL of the selected experience's report, if it has one
    pub fn selected_report_url(&self) -> Option<String> {
        if self.section != HomeSection::Experience {
            return None;
        }
        self.selected_experience()
            .and_then(|e| e.report.as_deref())
            .map(|report| self.client.report_url(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatMessage, ChatRole, FALLBACK_MESSAGE};
    use crate::render::PlainTextRenderer;
    use crate::tui::EventHandler;
    use async_trait::async_trait;
    use reqwest::StatusCode;

    struct Echo;

    #[async_trait]
    impl ChatBackend for Echo {
        async fn chat(&self, message: &str) -> Result<String, ApiError> {
            Ok(format!("echo: {}", message))
        }
    }

    struct Broken;

    #[async_trait]
    impl ChatBackend for Broken {
        async fn chat(&self, _message: &str) -> Result<String, ApiError> {
            Err(ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }

    fn test_app(backend: Arc<dyn ChatBackend>) -> (App, EventHandler) {
        let events = EventHandler::detached();
        let app = App::new(
            ApiClient::new("http://localhost:8000"),
            Box::new(PlainTextRenderer),
            events.sender(),
        )
        .with_backend(backend);
        (app, events)
    }

    /// Pump one background result into the app
    async fn settle_next(app: &mut App, events: &mut EventHandler) {
        match events.next().await {
            Some(AppEvent::ChatSettled(result)) => app.chat_settled(result),
            other => panic!("expected ChatSettled, got {:?}", other),
        }
    }

    fn sample_portfolio() -> PortfolioData {
        serde_json::from_str(
            r#"{
                "projects": [{"name": "Foo", "description": "d", "technologies": []}],
                "experience": [{"title": "Intern", "company": "Acme", "report": "files/acme.pdf"}],
                "skills": {"languages": ["Rust", "Go"], "tools": ["Docker"]}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_navigate() {
        let (mut app, _events) = test_app(Arc::new(Echo));
        assert_eq!(app.view, View::Home);

        app.navigate(View::Chat);
        assert_eq!(app.view, View::Chat);
        app.navigate(View::Home);
        assert_eq!(app.view, View::Home);
        assert!(app.session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_navigate_and_send_seeds_chat() {
        let (mut app, mut events) = test_app(Arc::new(Echo));

        app.navigate_and_send(View::Chat, "Tell me about the project: Foo");

        assert_eq!(app.view, View::Chat);
        assert!(app.session.is_pending());
        assert_eq!(
            app.session.transcript()[0],
            ChatMessage::user("Tell me about the project: Foo")
        );

        settle_next(&mut app, &mut events).await;
        assert!(!app.session.is_pending());
        assert_eq!(
            app.session.transcript()[1],
            ChatMessage::assistant("echo: Tell me about the project: Foo")
        );
    }

    #[tokio::test]
    async fn test_failure_becomes_fallback() {
        let (mut app, mut events) = test_app(Arc::new(Broken));

        app.send(Some("Hello"));
        settle_next(&mut app, &mut events).await;

        let transcript = app.session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, ChatRole::Assistant);
        assert_eq!(transcript[1].content, FALLBACK_MESSAGE);
        assert!(!app.session.is_pending());
    }

    #[tokio::test]
    async fn test_second_send_while_pending_is_dropped() {
        let (mut app, mut events) = test_app(Arc::new(Echo));

        app.send(Some("one"));
        app.send(Some("two"));
        assert_eq!(app.session.transcript().len(), 1);

        settle_next(&mut app, &mut events).await;
        app.send(Some("three"));
        settle_next(&mut app, &mut events).await;

        let users: Vec<&str> = app
            .session
            .transcript()
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(users, vec!["one", "three"]);
    }

    #[tokio::test]
    async fn test_start_new_chat_keeps_view() {
        let (mut app, mut events) = test_app(Arc::new(Echo));
        app.navigate(View::Chat);

        for question in ["a", "b"] {
            app.send(Some(question));
            settle_next(&mut app, &mut events).await;
        }
        assert_eq!(app.session.transcript().len(), 4);

        app.start_new_chat();
        assert!(app.session.transcript().is_empty());
        assert_eq!(app.view, View::Chat);
    }

    #[tokio::test]
    async fn test_suggestion_is_sent() {
        let (mut app, mut events) = test_app(Arc::new(Echo));
        assert!(!app.send_selected_suggestion());

        app.suggestion_nav_down();
        app.suggestion_nav_down();
        assert!(app.send_selected_suggestion());
        settle_next(&mut app, &mut events).await;

        assert_eq!(app.session.transcript()[0].content, SUGGESTED_QUESTIONS[1]);
    }

    #[test]
    fn test_nothing_to_ask_before_portfolio_loads() {
        let (mut app, _events) = test_app(Arc::new(Echo));
        assert!(app.selected_question().is_none());

        app.portfolio_loaded(None);
        app.ask_about_selection();
        assert_eq!(app.view, View::Home);
        assert!(app.session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_ask_about_each_section() {
        let (mut app, _events) = test_app(Arc::new(Echo));
        app.portfolio_loaded(Some(sample_portfolio()));

        assert_eq!(
            app.selected_question().as_deref(),
            Some("Tell me about the project: Foo")
        );

        app.next_section();
        assert_eq!(
            app.selected_question().as_deref(),
            Some("Tell me about your experience at Acme")
        );
        assert_eq!(
            app.selected_report_url().as_deref(),
            Some("http://localhost:8000/api/reports/acme.pdf")
        );

        app.next_section();
        app.home_nav_down();
        app.home_nav_down();
        app.home_nav_down();
        let skill = app.selected_skill().unwrap();
        assert_eq!(skill, SkillEntry { category: "tools", skill: "Docker" });

        app.ask_about_selection();
        assert_eq!(app.view, View::Chat);
        assert_eq!(
            app.session.transcript()[0].content,
            "What experience does Adam have with Docker?"
        );
    }
}
