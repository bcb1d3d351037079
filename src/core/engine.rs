//! Dialogue engine
//!
//! The DialogueEngine owns one conversation. For every user message it:
//! 1. Records the user turn
//! 2. Runs the pattern rules in order, first answer wins
//! 3. Falls back to the first matching catalog topic
//! 4. Falls back again to a generic probing reply
//! 5. Records and returns the agent turn
//!
//! It never fails and never returns an empty reply.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::conversation::{History, Turn};

use super::catalog::{builtin, ResponseCatalog};
use super::context::ConversationContext;
use super::rules::RuleSet;

/// Which tier produced a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    Rule(&'static str),
    Topic(String),
    Fallback,
}

impl fmt::Display for ReplySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplySource::Rule(name) => write!(f, "rule:{}", name),
            ReplySource::Topic(keyword) => write!(f, "topic:{}", keyword),
            ReplySource::Fallback => f.write_str("fallback"),
        }
    }
}

impl Serialize for ReplySource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An agent reply along with where it came from
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

/// Rule-based assistant for a single conversation
pub struct DialogueEngine<R = StdRng> {
    catalog: Arc<ResponseCatalog>,
    rules: Arc<RuleSet>,
    context: ConversationContext,
    history: History,
    rng: R,
}

impl DialogueEngine<StdRng> {
    /// Built-in catalog, standard rules, entropy-seeded replies
    pub fn new() -> Self {
        Self::from_parts(
            Arc::new(ResponseCatalog::default()),
            Arc::new(RuleSet::standard()),
            None,
        )
    }

    /// Built-in catalog and rules with reproducible reply selection
    pub fn seeded(seed: u64) -> Self {
        Self::from_parts(
            Arc::new(ResponseCatalog::default()),
            Arc::new(RuleSet::standard()),
            Some(seed),
        )
    }

    /// Shared catalog and rules, seeded when `seed` is given
    pub fn from_parts(
        catalog: Arc<ResponseCatalog>,
        rules: Arc<RuleSet>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(catalog, rules, rng)
    }
}

impl Default for DialogueEngine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> DialogueEngine<R> {
    /// Create an engine drawing replies from `rng`
    pub fn with_rng(catalog: Arc<ResponseCatalog>, rules: Arc<RuleSet>, rng: R) -> Self {
        let history = History::with_greeting(&catalog.greeting);
        Self {
            catalog,
            rules,
            context: ConversationContext::new(),
            history,
            rng,
        }
    }

    /// Answer a user message and record both turns
    pub fn send_message(&mut self, text: &str) -> String {
        self.respond(text).text
    }

    /// Like `send_message`, also reporting which tier answered
    pub fn respond(&mut self, text: &str) -> Reply {
        self.history.add_user(text);

        let reply = self.generate_reply(text);
        tracing::debug!(source = %reply.source, "Reply selected");

        self.history.add_agent(&reply.text);
        reply
    }

    fn generate_reply(&mut self, message: &str) -> Reply {
        if let Some((name, text)) = self.rules.evaluate(message, &mut self.context) {
            return Reply {
                text,
                source: ReplySource::Rule(name),
            };
        }

        if let Some(topic) = self.catalog.find_topic(message) {
            if let Some(text) = topic.responses.choose(&mut self.rng) {
                return Reply {
                    text: text.clone(),
                    source: ReplySource::Topic(topic.keyword.clone()),
                };
            }
        }

        let text = self
            .catalog
            .fallbacks
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| builtin::FALLBACKS[0].to_string());

        Reply {
            text,
            source: ReplySource::Fallback,
        }
    }

    /// All turns so far, oldest first
    pub fn history(&self) -> &[Turn] {
        self.history.turns()
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn catalog(&self) -> &ResponseCatalog {
        &self.catalog
    }

    /// Forget everything and start over from the greeting
    pub fn reset(&mut self) {
        self.context.clear();
        self.history = History::with_greeting(&self.catalog.greeting);
    }
}
