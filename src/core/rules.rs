//! Pattern rules evaluated before the keyword catalog
//!
//! Each rule looks at the raw user message plus the session context and
//! either answers with a tailored reply (recording what it inferred) or
//! declines. Rules run in declared order and the first answer wins.

use regex::Regex;

use super::context::{
    ConversationContext, Currency, Protocol, RiskTolerance, TimeHorizon,
};

/// A named check that may turn a message into a tailored reply
pub trait Rule: Send + Sync {
    /// Stable identifier, used in logs and reply sources
    fn name(&self) -> &'static str;

    /// Reply to `message`, or `None` to let the next rule try.
    /// Context is only written when a reply is returned.
    fn evaluate(&self, message: &str, context: &mut ConversationContext) -> Option<String>;
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

// ============================================================================
// Risk tolerance
// ============================================================================

const RISK_TERMS: &[&str] = &["risk", "conservative", "aggressive", "moderate", "safe", "risky"];
const CONSERVATIVE_TERMS: &[&str] = &["conservative", "safe", "low risk"];
const AGGRESSIVE_TERMS: &[&str] = &["aggressive", "risky", "high risk"];
const BALANCED_TERMS: &[&str] = &["moderate", "balanced", "medium risk"];

/// Classifies the user's risk appetite.
///
/// A message that only mentions risk in general ("what about risk?") is not
/// classified, and evaluation moves on to the next rule.
pub struct RiskToleranceRule;

impl RiskToleranceRule {
    fn classify(lower: &str) -> Option<RiskTolerance> {
        if contains_any(lower, CONSERVATIVE_TERMS) {
            Some(RiskTolerance::Conservative)
        } else if contains_any(lower, AGGRESSIVE_TERMS) {
            Some(RiskTolerance::Aggressive)
        } else if contains_any(lower, BALANCED_TERMS) {
            Some(RiskTolerance::Balanced)
        } else {
            None
        }
    }

    fn reply(tolerance: RiskTolerance) -> &'static str {
        match tolerance {
            RiskTolerance::Conservative => "I understand you prefer a conservative approach. I'll focus on lower-risk opportunities like Hatom's lending pools and stablecoin strategies, which typically offer 5-9% APY with minimal volatility. Would you like specific recommendations for conservative strategies?",
            RiskTolerance::Aggressive => "I see you're comfortable with an aggressive strategy. I can recommend higher-yield opportunities like JEXchange's JEX-USDC farm (28.5% APY) and xExchange's EGLD-XEX farm (22.4% APY). These carry higher risk but potentially greater rewards. Would you like more details on these opportunities?",
            RiskTolerance::Balanced => "A balanced approach is a great choice. I recommend a mix of lending protocols like Hatom (8.7% APY for USDC) and established liquidity pools like EGLD-MEX on Maiar Exchange (18.5% APY). This gives you a good balance of stability and growth. Would you like me to create a sample portfolio with this approach?",
        }
    }
}

impl Rule for RiskToleranceRule {
    fn name(&self) -> &'static str {
        "risk_tolerance"
    }

    fn evaluate(&self, message: &str, context: &mut ConversationContext) -> Option<String> {
        let lower = message.to_lowercase();
        if !contains_any(&lower, RISK_TERMS) {
            return None;
        }

        let tolerance = Self::classify(&lower)?;
        context.risk_tolerance = Some(tolerance);
        Some(Self::reply(tolerance).to_string())
    }
}

// ============================================================================
// Investment amount
// ============================================================================

/// Picks up amounts like "50 EGLD", "2.5egld" or "1000 dollars"
pub struct InvestmentAmountRule {
    pattern: Regex,
}

impl InvestmentAmountRule {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)\s*(egld|dollars|usd|\$)")
                .expect("amount pattern is a valid regex"),
        }
    }

    /// First usable amount mentioned in the message. Digits are ASCII only;
    /// numbers too large to represent are skipped.
    pub fn extract(&self, message: &str) -> Option<(f64, Currency)> {
        self.pattern.captures_iter(message).find_map(|captures| {
            let amount: f64 = captures.get(1)?.as_str().parse().ok()?;
            if !amount.is_finite() {
                return None;
            }
            let currency = Currency::from_token(captures.get(2)?.as_str());
            Some((amount, currency))
        })
    }

    fn reply(amount: f64, currency: Currency) -> String {
        if amount < 10.0 {
            format!(
                "I see you're looking to invest {amount} {currency}. For smaller amounts, I recommend focusing on a single protocol to minimize transaction costs. Hatom's EGLD lending at 5.8% APY would be a good starting point. Would you like more options?"
            )
        } else if amount < 100.0 {
            format!(
                "With {amount} {currency}, you can start diversifying across 2-3 protocols. I'd suggest allocating 50% to Hatom lending and 50% to a stable liquidity pool like EGLD-USDC on Maiar Exchange. Would this approach work for you?"
            )
        } else {
            format!(
                "With {amount} {currency}, you can build a well-diversified portfolio. I recommend 40% in lending protocols, 40% in established liquidity pools, and 20% in higher-yield opportunities. Would you like me to create a detailed allocation plan?"
            )
        }
    }
}

impl Default for InvestmentAmountRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for InvestmentAmountRule {
    fn name(&self) -> &'static str {
        "investment_amount"
    }

    fn evaluate(&self, message: &str, context: &mut ConversationContext) -> Option<String> {
        let (amount, currency) = self.extract(message)?;
        context.investment_amount = Some(amount);
        context.investment_currency = Some(currency);
        Some(Self::reply(amount, currency))
    }
}

// ============================================================================
// Time horizon
// ============================================================================

const SHORT_TERM_TERMS: &[&str] = &[
    "short term",
    "short-term",
    "quick",
    "few days",
    "few weeks",
    "short period",
];
const MEDIUM_TERM_TERMS: &[&str] = &[
    "medium term",
    "medium-term",
    "few months",
    "half year",
    "months",
];
const LONG_TERM_TERMS: &[&str] = &["long term", "long-term", "year", "years", "long period"];

pub struct TimeHorizonRule;

impl TimeHorizonRule {
    fn classify(lower: &str) -> Option<TimeHorizon> {
        if contains_any(lower, SHORT_TERM_TERMS) {
            Some(TimeHorizon::Short)
        } else if contains_any(lower, MEDIUM_TERM_TERMS) {
            Some(TimeHorizon::Medium)
        } else if contains_any(lower, LONG_TERM_TERMS) {
            Some(TimeHorizon::Long)
        } else {
            None
        }
    }

    fn reply(horizon: TimeHorizon) -> &'static str {
        match horizon {
            TimeHorizon::Short => "For short-term investments, liquidity is key. I recommend stablecoin pools on AshSwap (9.2% APY) or USDC lending on Hatom (8.7% APY). These allow you to exit positions quickly with minimal price risk. Would you like more short-term options?",
            TimeHorizon::Medium => "For a medium-term horizon of a few months, balanced liquidity pools like EGLD-MEX on Maiar Exchange (18.5% APY) offer a good compromise between yield and stability. Would you like me to suggest a medium-term portfolio allocation?",
            TimeHorizon::Long => "With a long-term investment horizon, you can benefit from compounding and ride out short-term volatility. I recommend a diversified approach with 30% in lending, 40% in liquidity pools, and 30% in higher-yield farming opportunities. This could yield 15-20% APY on average over time. Would you like a detailed long-term strategy?",
        }
    }
}

impl Rule for TimeHorizonRule {
    fn name(&self) -> &'static str {
        "time_horizon"
    }

    fn evaluate(&self, message: &str, context: &mut ConversationContext) -> Option<String> {
        let horizon = Self::classify(&message.to_lowercase())?;
        context.time_horizon = Some(horizon);
        Some(Self::reply(horizon).to_string())
    }
}

// ============================================================================
// Specific protocol
// ============================================================================

/// Describes a named protocol. Only the first protocol in `Protocol::ALL`
/// order is answered when a message names several.
pub struct SpecificProtocolRule;

impl SpecificProtocolRule {
    fn reply(protocol: Protocol) -> &'static str {
        match protocol {
            Protocol::Maiar => "Maiar Exchange is the leading DEX on MultiversX with $124.5M TVL. Their EGLD-MEX liquidity pool offers 18.5% APY with medium risk. They also offer farms with additional MEX rewards. Would you like specific pool recommendations from Maiar?",
            Protocol::Hatom => "Hatom Protocol is a lending and borrowing platform with $78.3M TVL. They offer 5.8% APY for EGLD lending and 8.7% for USDC, both with relatively low risk. Their auto-compounding feature maximizes your returns. Would you like to know more about Hatom's lending options?",
            Protocol::AshSwap => "AshSwap is a stable swap AMM focused on minimal slippage with $45.6M TVL. Their stablecoin pool offers 9.2% APY with low risk, making it ideal for conservative investors. Would you like more details about AshSwap's pools?",
            Protocol::XExchange => "xExchange is a decentralized exchange with $92.1M TVL offering farming opportunities and governance. Their EGLD-XEX farm offers 22.4% APY but with higher risk. Would you like to explore xExchange's yield options?",
            Protocol::OneDex => "OneDex is an aggregator DEX providing optimal rates across MultiversX with $31.5M TVL. Their EGLD-ONE LP offers 14.8% APY with medium risk. Would you like more information about OneDex?",
            Protocol::JexChange => "JEXchange focuses on community governance and yield farming with $28.7M TVL. Their JEX-USDC farm offers the highest APY in the ecosystem at 28.5%, but with higher risk. Would you like to know more about JEXchange's high-yield opportunities?",
        }
    }
}

impl Rule for SpecificProtocolRule {
    fn name(&self) -> &'static str {
        "specific_protocol"
    }

    fn evaluate(&self, message: &str, context: &mut ConversationContext) -> Option<String> {
        let lower = message.to_lowercase();
        let protocol = Protocol::ALL
            .into_iter()
            .find(|p| lower.contains(p.keyword()))?;

        context.last_protocol_discussed = Some(protocol);
        Some(Self::reply(protocol).to_string())
    }
}

// ============================================================================
// Portfolio recommendation
// ============================================================================

const PORTFOLIO_TERMS: &[&str] = &["portfolio", "recommend", "suggest", "allocation"];

/// Builds an allocation for the risk tolerance inferred so far
pub struct PortfolioRecommendationRule;

impl PortfolioRecommendationRule {
    fn reply(tolerance: RiskTolerance) -> &'static str {
        match tolerance {
            RiskTolerance::Conservative => concat!(
                "Based on your conservative risk profile, I recommend this portfolio allocation:\n\n",
                "• 50% - Hatom USDC lending (8.7% APY)\n",
                "• 30% - AshSwap stablecoin pool (9.2% APY)\n",
                "• 20% - Maiar EGLD-USDC LP (12.3% APY)\n\n",
                "This gives you a weighted average APY of about 9.5% with minimal risk. Would you like me to explain any of these options in more detail?",
            ),
            RiskTolerance::Aggressive => concat!(
                "For your aggressive risk profile, I recommend this high-yield portfolio:\n\n",
                "• 40% - xExchange EGLD-XEX farm (22.4% APY)\n",
                "• 30% - JEXchange JEX-USDC farm (28.5% APY)\n",
                "• 20% - Maiar EGLD-MEX LP (18.5% APY)\n",
                "• 10% - Hatom EGLD lending (5.8% APY) as a safety buffer\n\n",
                "This gives you a weighted average APY of about 21.7%. Would you like me to adjust this allocation?",
            ),
            RiskTolerance::Balanced => concat!(
                "For a balanced approach, I recommend this diversified portfolio:\n\n",
                "• 30% - Hatom USDC lending (8.7% APY)\n",
                "• 30% - Maiar EGLD-MEX LP (18.5% APY)\n",
                "• 20% - OneDex EGLD-ONE LP (14.8% APY)\n",
                "• 20% - xExchange EGLD-XEX farm (22.4% APY)\n\n",
                "This gives you a weighted average APY of about 15.6% with moderate risk. Would you like me to explain the rationale behind this allocation?",
            ),
        }
    }
}

impl Rule for PortfolioRecommendationRule {
    fn name(&self) -> &'static str {
        "portfolio_recommendation"
    }

    fn evaluate(&self, message: &str, context: &mut ConversationContext) -> Option<String> {
        if !contains_any(&message.to_lowercase(), PORTFOLIO_TERMS) {
            return None;
        }
        Some(Self::reply(context.effective_risk_tolerance()).to_string())
    }
}

// ============================================================================
// Rule set
// ============================================================================

/// Ordered collection of rules
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The five assistant rules in evaluation order
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(RiskToleranceRule)
            .with_rule(InvestmentAmountRule::new())
            .with_rule(TimeHorizonRule)
            .with_rule(SpecificProtocolRule)
            .with_rule(PortfolioRecommendationRule)
    }

    /// Append a rule after the existing ones
    pub fn with_rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Run rules in order; returns the first reply and the rule that gave it
    pub fn evaluate(
        &self,
        message: &str,
        context: &mut ConversationContext,
    ) -> Option<(&'static str, String)> {
        self.rules
            .iter()
            .find_map(|rule| rule.evaluate(message, context).map(|reply| (rule.name(), reply)))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate(message: &str) -> (Option<(&'static str, String)>, ConversationContext) {
        let mut context = ConversationContext::new();
        let result = RuleSet::standard().evaluate(message, &mut context);
        (result, context)
    }

    #[test]
    fn test_standard_order() {
        assert_eq!(
            RuleSet::standard().names(),
            vec![
                "risk_tolerance",
                "investment_amount",
                "time_horizon",
                "specific_protocol",
                "portfolio_recommendation",
            ]
        );
    }

    #[test]
    fn test_risk_sub_classification() {
        let (result, context) = evaluate("I have a low risk tolerance");
        assert_eq!(result.unwrap().0, "risk_tolerance");
        assert_eq!(context.risk_tolerance, Some(RiskTolerance::Conservative));

        let (_, context) = evaluate("I'm fine with something RISKY");
        assert_eq!(context.risk_tolerance, Some(RiskTolerance::Aggressive));

        let (_, context) = evaluate("let's keep it moderate");
        assert_eq!(context.risk_tolerance, Some(RiskTolerance::Balanced));
    }

    #[test]
    fn test_general_risk_term_declines() {
        let mut context = ConversationContext::new();
        assert!(RiskToleranceRule.evaluate("risk", &mut context).is_none());
        assert!(context.is_empty());
    }

    #[test]
    fn test_declined_risk_rule_falls_through_to_next_rule() {
        let (result, context) = evaluate("what is the risk with 5 egld?");
        let (name, reply) = result.unwrap();
        assert_eq!(name, "investment_amount");
        assert!(reply.contains("5 EGLD"));
        assert!(context.risk_tolerance.is_none());
    }

    #[test]
    fn test_balanced_alone_does_not_trigger_risk_rule() {
        let mut context = ConversationContext::new();
        assert!(RiskToleranceRule.evaluate("balanced", &mut context).is_none());
    }

    #[test]
    fn test_amount_extraction() {
        let rule = InvestmentAmountRule::new();
        assert_eq!(rule.extract("I want to invest 50 EGLD"), Some((50.0, Currency::Egld)));
        assert_eq!(rule.extract("about 2.5egld"), Some((2.5, Currency::Egld)));
        assert_eq!(rule.extract("1000 Dollars"), Some((1000.0, Currency::Usd)));
        assert_eq!(rule.extract("250$"), Some((250.0, Currency::Usd)));
        assert_eq!(rule.extract("$250"), None);
        assert_eq!(rule.extract("some egld"), None);
    }

    #[test]
    fn test_amount_ignores_non_ascii_digits() {
        let rule = InvestmentAmountRule::new();
        assert_eq!(rule.extract("\u{0665} egld"), None);

        let (result, context) = evaluate("\u{0665} egld now, then 50 egld");
        assert_eq!(result.unwrap().0, "investment_amount");
        assert_eq!(context.investment_amount, Some(50.0));
        assert_eq!(context.investment_currency, Some(Currency::Egld));
    }

    #[test]
    fn test_unrepresentable_amount_declines() {
        let huge = format!("{} egld", "9".repeat(400));

        let mut context = ConversationContext::new();
        assert!(InvestmentAmountRule::new().evaluate(&huge, &mut context).is_none());
        assert!(context.is_empty());

        let (result, context) = evaluate(&format!("{huge}, or maybe 5 usd"));
        assert!(result.unwrap().1.starts_with("I see you're looking to invest 5 USD"));
        assert_eq!(context.investment_amount, Some(5.0));
    }

    #[test]
    fn test_amount_bands() {
        let (result, context) = evaluate("I want to invest 50 EGLD");
        let reply = result.unwrap().1;
        assert!(reply.starts_with("With 50 EGLD, you can start diversifying"));
        assert_eq!(context.investment_amount, Some(50.0));
        assert_eq!(context.investment_currency, Some(Currency::Egld));

        let (result, _) = evaluate("just 2.5 usd");
        assert!(result.unwrap().1.starts_with("I see you're looking to invest 2.5 USD"));

        let (result, _) = evaluate("100 dollars");
        assert!(result.unwrap().1.contains("well-diversified portfolio"));
    }

    #[test]
    fn test_time_horizon() {
        let (_, context) = evaluate("I need something quick");
        assert_eq!(context.time_horizon, Some(TimeHorizon::Short));

        let (_, context) = evaluate("maybe a few months");
        assert_eq!(context.time_horizon, Some(TimeHorizon::Medium));

        let (_, context) = evaluate("I'm holding for years");
        assert_eq!(context.time_horizon, Some(TimeHorizon::Long));
    }

    #[test]
    fn test_first_declared_protocol_wins() {
        let (result, context) = evaluate("compare JEXchange with Hatom");
        assert!(result.unwrap().1.starts_with("Hatom Protocol"));
        assert_eq!(context.last_protocol_discussed, Some(Protocol::Hatom));
    }

    #[test]
    fn test_portfolio_uses_context_tier() {
        let mut context = ConversationContext::new();
        let reply = PortfolioRecommendationRule
            .evaluate("suggest an allocation", &mut context)
            .unwrap();
        assert!(reply.starts_with("For a balanced approach"));

        context.risk_tolerance = Some(RiskTolerance::Aggressive);
        let reply = PortfolioRecommendationRule
            .evaluate("suggest an allocation", &mut context)
            .unwrap();
        assert!(reply.contains("10% - Hatom EGLD lending"));
    }

    #[test]
    fn test_no_rule_matches() {
        let (result, context) = evaluate("what's the weather like");
        assert!(result.is_none());
        assert!(context.is_empty());
    }
}
