//! Per-session conversation context
//!
//! Attributes inferred from what the user has said so far. Each one is unset
//! until a rule infers it, keeps its latest value, and only goes away on reset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much volatility the user is comfortable with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeHorizon {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Egld,
    Usd,
}

impl Currency {
    /// Normalize a matched currency token ("egld", "dollars", "usd", "$")
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("egld") {
            Currency::Egld
        } else {
            Currency::Usd
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Egld => f.write_str("EGLD"),
            Currency::Usd => f.write_str("USD"),
        }
    }
}

/// The six protocols the assistant can describe, in matching order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Maiar,
    Hatom,
    AshSwap,
    XExchange,
    OneDex,
    JexChange,
}

impl Protocol {
    pub const ALL: [Protocol; 6] = [
        Protocol::Maiar,
        Protocol::Hatom,
        Protocol::AshSwap,
        Protocol::XExchange,
        Protocol::OneDex,
        Protocol::JexChange,
    ];

    /// Lowercase name searched for in user messages
    pub fn keyword(&self) -> &'static str {
        match self {
            Protocol::Maiar => "maiar",
            Protocol::Hatom => "hatom",
            Protocol::AshSwap => "ashswap",
            Protocol::XExchange => "xexchange",
            Protocol::OneDex => "onedex",
            Protocol::JexChange => "jexchange",
        }
    }
}

/// Inferred user attributes for one conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_tolerance: Option<RiskTolerance>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_currency: Option<Currency>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_horizon: Option<TimeHorizon>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_protocol_discussed: Option<Protocol>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Risk tolerance to plan around, `balanced` when nothing was inferred
    pub fn effective_risk_tolerance(&self) -> RiskTolerance {
        self.risk_tolerance.unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
