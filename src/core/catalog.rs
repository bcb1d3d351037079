//! Keyword topics, fallback replies and the greeting
//!
//! The catalog is the tier consulted when no pattern rule answers. Topics are
//! kept in an ordered list: the first keyword contained in the message wins,
//! regardless of where in the message it appears.
//!
//! A catalog can be replaced with a TOML file of the same shape:
//!
//! ```toml
//! greeting = "Hello! How can I help?"
//! fallbacks = ["Tell me more about your goals."]
//!
//! [[topics]]
//! keyword = "yield"
//! responses = ["Yields vary by protocol."]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A keyword and the replies it can produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEntry {
    pub keyword: String,
    pub responses: Vec<String>,
}

impl TopicEntry {
    pub fn new(keyword: &str, responses: &[&str]) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            responses: responses.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Ordered topics plus fallbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseCatalog {
    /// Canonical first agent turn of every session
    pub greeting: String,

    #[serde(default)]
    pub topics: Vec<TopicEntry>,

    /// Replies used when nothing else matches
    pub fallbacks: Vec<String>,
}

impl ResponseCatalog {
    /// Parse and validate a catalog from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let mut catalog: ResponseCatalog = toml::from_str(content)?;
        for topic in &mut catalog.topics {
            topic.keyword = topic.keyword.to_lowercase();
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Every tier must be able to produce a non-empty reply
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.greeting.trim().is_empty() {
            return Err(CatalogError::Validation("greeting is empty".into()));
        }

        if self.fallbacks.is_empty() {
            return Err(CatalogError::Validation(
                "at least one fallback reply is required".into(),
            ));
        }

        if self.fallbacks.iter().any(|f| f.trim().is_empty()) {
            return Err(CatalogError::Validation("fallback reply is empty".into()));
        }

        for topic in &self.topics {
            if topic.keyword.is_empty() {
                return Err(CatalogError::Validation("topic keyword is empty".into()));
            }
            if topic.responses.is_empty() || topic.responses.iter().any(|r| r.trim().is_empty()) {
                return Err(CatalogError::Validation(format!(
                    "topic '{}' needs at least one non-empty response",
                    topic.keyword
                )));
            }
        }

        Ok(())
    }

    /// First topic, in declared order, whose keyword occurs in the message
    pub fn find_topic(&self, message: &str) -> Option<&TopicEntry> {
        let lower = message.to_lowercase();
        self.topics.iter().find(|t| lower.contains(&t.keyword))
    }

    pub fn topic(&self, keyword: &str) -> Option<&TopicEntry> {
        self.topics.iter().find(|t| t.keyword == keyword)
    }
}

impl Default for ResponseCatalog {
    fn default() -> Self {
        builtin::catalog()
    }
}

/// Errors from catalog loading
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Built-in catalog for the AgentX yield assistant
pub mod builtin {
    use super::{ResponseCatalog, TopicEntry};

    pub const GREETING: &str = "Hello! I'm your AgentX yield optimization assistant. I can help you maximize returns while managing risk. What would you like to know about yield opportunities?";

    pub const FALLBACKS: &[&str] = &[
        "I'm analyzing the best yield opportunities for you. Can you tell me more about your investment goals?",
        "That's interesting. Would you prefer higher yields with more risk, or stable returns with lower risk?",
        "I can help optimize your MultiversX portfolio. What's your time horizon for these investments?",
        "Several protocols on MultiversX offer competitive yields. Are you interested in any specific tokens or protocols?",
        "I'm here to help you navigate the MultiversX DeFi ecosystem. What aspects are you most interested in learning about?",
        "Based on current market conditions, I'd recommend diversifying across 3-4 protocols. Would you like specific suggestions?",
        "Your yield agent can automatically rebalance your portfolio. How frequently would you prefer this to happen?",
        "I'm continuously monitoring MultiversX protocols for the best opportunities. What's your primary investment goal?",
        "To provide better recommendations, could you share your risk tolerance level? Are you conservative, moderate, or aggressive?",
        "I'd like to understand your needs better. Are you looking for long-term growth, stable income, or maximum short-term yields?",
        "Different protocols excel at different strategies. Are you more interested in lending, liquidity provision, or yield farming?",
        "I can provide more personalized advice if you share your investment timeframe. Are you looking at weeks, months, or years?",
        "The MultiversX ecosystem offers various yield opportunities. Which aspect would you like me to explain in more detail?",
    ];

    const TOPICS: &[(&str, &[&str])] = &[
        ("yield", &[
            "Currently, the highest APY is offered by JEXchange at 28.5% for JEX-USDC Farm, though it carries higher risk.",
            "For lower risk options, consider Hatom Protocol's EGLD Lending at 5.8% APY.",
            "The average APY across all MultiversX protocols is currently around 14.2%.",
            "Would you prefer stable yields or are you comfortable with more volatile returns?",
            "I can help you find the optimal yield strategy based on your risk tolerance. What's your preferred risk level?",
        ]),
        ("apy", &[
            "Currently, the highest APY is offered by JEXchange at 28.5% for JEX-USDC Farm, though it carries higher risk.",
            "For lower risk options, consider Hatom Protocol's EGLD Lending at 5.8% APY.",
            "The average APY across all MultiversX protocols is currently around 14.2%.",
            "APY rates vary by protocol. Maiar Exchange offers around 12.5% APY with medium risk, while xExchange offers 14.3% with similar risk.",
            "Would you like me to compare APY rates across different protocols for a specific token?",
        ]),
        ("risk", &[
            "I can adjust your portfolio to focus on low-risk opportunities like stablecoin pools.",
            "Medium risk options like EGLD-MEX LP offer a balance of security and returns.",
            "High risk pools can offer APYs above 20% but with greater volatility and potential impermanent loss.",
            "What's your risk tolerance on a scale from conservative to aggressive?",
            "For a conservative strategy, I recommend allocating at least 60% to low-risk options like Hatom's lending pools.",
        ]),
        ("rebalance", &[
            "I can automatically rebalance your portfolio daily, weekly, or monthly.",
            "When would you like me to rebalance your positions to maximize returns?",
            "Frequent rebalancing can capture more yield but may incur higher transaction costs.",
            "I'll monitor market conditions and rebalance when significant opportunities arise.",
            "The optimal rebalancing frequency depends on market volatility and your investment size. For most users, weekly is a good balance.",
        ]),
        ("strategy", &[
            "I recommend diversifying across at least 3-4 different protocols for optimal risk management.",
            "A barbell strategy with both stable assets and higher-yield opportunities might work well for you.",
            "Would you like me to focus on a particular token or spread investments across the ecosystem?",
            "I can create a custom strategy based on your time horizon and financial goals.",
            "For long-term growth, I suggest a balanced approach with 40% in lending, 40% in liquidity pools, and 20% in higher-risk yield farming.",
        ]),
        ("protocol", &[
            "The MultiversX ecosystem has several established protocols like Maiar Exchange, Hatom, and xExchange.",
            "Each protocol has different risk profiles and yield opportunities.",
            "Would you like me to recommend specific protocols based on your investment goals?",
            "I can help you distribute your assets across multiple protocols for diversification.",
            "Hatom Protocol is excellent for lending, while Maiar Exchange offers strong liquidity pools. Which aspect interests you more?",
        ]),
        ("invest", &[
            "I can help you invest in the highest yielding opportunities while managing risk.",
            "What amount are you looking to invest in MultiversX DeFi?",
            "For new investors, I recommend starting with lower-risk protocols like Hatom's lending pools.",
            "Would you like me to create a diversified investment strategy across multiple protocols?",
            "With the current market conditions, a mix of stablecoin lending and EGLD liquidity pools offers a good balance of safety and returns.",
        ]),
        ("egld", &[
            "EGLD is the native token of the MultiversX blockchain with a current price of $42.75.",
            "There are several EGLD yield opportunities, including Hatom lending at 5.8% APY and EGLD-MEX LP at 18.5% APY.",
            "EGLD staking is also available with validator nodes offering around 8-10% APY.",
            "Would you like me to recommend specific EGLD yield strategies?",
            "For EGLD holders, I recommend diversifying between lending, liquidity provision, and staking to optimize returns while managing risk.",
        ]),
        ("stablecoin", &[
            "Stablecoin pools on AshSwap offer around 9.2% APY with low risk.",
            "USDC lending on Hatom Protocol provides 8.7% APY.",
            "Stablecoins provide lower but more consistent returns compared to volatile assets.",
            "Would you like me to allocate a portion of your portfolio to stablecoin strategies?",
            "Stablecoins are excellent for reducing portfolio volatility while still generating meaningful yield.",
        ]),
        ("hatom", &[
            "Hatom Protocol is a lending and borrowing platform on MultiversX.",
            "They offer competitive rates for EGLD (5.8% APY) and USDC (8.7% APY).",
            "Hatom has a medium risk profile with $78.3M in total value locked.",
            "Would you like to include Hatom in your yield strategy?",
            "Hatom Protocol is one of the most established lending platforms on MultiversX with a strong security track record.",
        ]),
        ("maiar", &[
            "Maiar Exchange (now xExchange) is the leading DEX on MultiversX.",
            "Their EGLD-MEX liquidity pool offers 18.5% APY with medium risk.",
            "They have $124.5M in total value locked across all pools.",
            "Would you like to explore Maiar Exchange liquidity pools?",
            "Maiar Exchange offers some of the most liquid trading pairs on MultiversX, which helps reduce impermanent loss risk.",
        ]),
        ("compare", &[
            "When comparing protocols, I look at APY, risk level, TVL, and historical performance.",
            "Would you like me to compare specific protocols or investment strategies?",
            "Hatom offers lower but more stable returns compared to xExchange, which has higher APY but greater volatility.",
            "For a fair comparison, we should consider both returns and risks. Which aspect is more important to you?",
            "I can provide a detailed comparison of any protocols you're interested in. Which ones would you like to compare?",
        ]),
        ("portfolio", &[
            "I can help you optimize your portfolio based on your risk tolerance and investment goals.",
            "A well-balanced portfolio typically includes a mix of lending, liquidity provision, and some yield farming.",
            "Would you like me to analyze your current positions and suggest improvements?",
            "For long-term growth, I recommend diversifying across at least 3-4 different protocols.",
            "What's your current portfolio allocation, and what are you looking to improve?",
        ]),
        ("impermanent", &[
            "Impermanent loss occurs when the price of your tokens changes compared to when you deposited them in a liquidity pool.",
            "To minimize impermanent loss, consider stable pairs or protocols with IL protection mechanisms.",
            "Would you like me to recommend pools with lower impermanent loss risk?",
            "Stablecoin pairs have minimal impermanent loss risk, making them ideal for risk-averse investors.",
            "Impermanent loss can be offset by trading fees and incentive rewards in high-volume pools.",
        ]),
        ("fees", &[
            "Transaction fees on MultiversX are typically very low, around 0.0005 EGLD per transaction.",
            "Some protocols charge performance fees on yields, usually between 5-20%.",
            "Would you like me to factor in fees when recommending yield strategies?",
            "When comparing APY across protocols, I always consider the net return after all fees.",
            "Gas fees for rebalancing are minimal on MultiversX, making frequent optimization viable.",
        ]),
        ("hello", &[
            "Hello! I'm your AgentX yield optimization assistant. How can I help you today?",
            "Hi there! I'm ready to help you maximize your MultiversX yields. What would you like to know?",
            "Greetings! I'm your personal DeFi assistant. What aspect of yield farming are you interested in?",
            "Hello! I'm here to help you navigate the MultiversX DeFi ecosystem. What can I assist you with?",
            "Hi! I'm your AgentX assistant. Would you like me to recommend some yield opportunities or explain how our platform works?",
        ]),
        ("help", &[
            "I can help with many things! I can recommend yield strategies, compare protocols, explain DeFi concepts, or analyze your portfolio.",
            "Need assistance? I can help you find the best yields, understand risks, or create a custom investment strategy.",
            "I'm here to help! You can ask me about specific protocols, APY rates, risk management, or portfolio optimization.",
            "How can I assist you today? I can provide information on MultiversX DeFi, recommend investment strategies, or explain yield farming concepts.",
            "I can help with yield optimization, risk assessment, protocol comparisons, and much more. What specific area are you interested in?",
        ]),
        ("thanks", &[
            "You're welcome! Is there anything else I can help you with?",
            "Happy to help! Let me know if you have any other questions.",
            "My pleasure! Is there anything else you'd like to know about MultiversX yield opportunities?",
            "Glad I could assist! Feel free to ask if you need more information.",
            "You're welcome! I'm here whenever you need DeFi guidance or yield recommendations.",
        ]),
    ];

    pub fn catalog() -> ResponseCatalog {
        ResponseCatalog {
            greeting: GREETING.to_string(),
            topics: TOPICS
                .iter()
                .map(|(keyword, responses)| TopicEntry::new(keyword, responses))
                .collect(),
            fallbacks: FALLBACKS.iter().map(|f| f.to_string()).collect(),
        }
    }
}
