//! Core dialogue components
//!
//! This module contains the rule-based assistant: its catalog, pattern rules,
//! per-session context, the engine that ties them together, and the store
//! that keeps one engine per live conversation.

pub mod catalog;
pub mod context;
pub mod engine;
pub mod rules;
pub mod sessions;

pub use catalog::{CatalogError, ResponseCatalog, TopicEntry};
pub use context::{ConversationContext, Currency, Protocol, RiskTolerance, TimeHorizon};
pub use engine::{DialogueEngine, Reply, ReplySource};
pub use rules::{Rule, RuleSet};
pub use sessions::{SessionError, SessionInfo, SessionStore};
