pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod handler;
pub mod portfolio;
pub mod render;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use api::{ApiClient, ApiError};
pub use app::{App, View};
pub use chat::{ChatBackend, ChatMessage, ChatRole, ChatSession, FALLBACK_MESSAGE};
pub use config::Config;
pub use portfolio::PortfolioData;
pub use render::{MarkdownRenderer, MessageRenderer, PlainTextRenderer};
