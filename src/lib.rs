//! AgentX Assistant - rule-based yield optimization chat
//!
//! A conversational assistant for the AgentX dashboard that answers from
//! ordered pattern rules and a keyword catalog. No model, no network calls:
//! every reply is canned, but shaped by what the user has said so far.
//!
//! ```
//! use agentx_assistant::DialogueEngine;
//!
//! let mut engine = DialogueEngine::new();
//! let reply = engine.send_message("I want to invest 50 EGLD");
//! assert!(reply.contains("50 EGLD"));
//! assert_eq!(engine.history().len(), 3);
//! ```

use std::sync::Arc;

pub mod config;
pub mod conversation;
pub mod core;
pub mod routes;

pub use crate::config::Config;
pub use crate::conversation::{Speaker, Turn};
pub use crate::core::{ConversationContext, DialogueEngine, ResponseCatalog, RuleSet, SessionStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionStore>,
}
