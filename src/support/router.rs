//! Branch decision after triage.
//!
//! Sentiment outranks category: an upset customer goes to a human contact
//! no matter what they asked about. Only when the tone is acceptable does
//! the classified category pick the handler, with general support as the
//! fallback for anything unclassified.

use crate::state::{Category, StateSnapshot};

/// Route label for the escalation handler.
pub const ESCALATE: &str = "escalate";
/// Route label for the technical support handler.
pub const TECHNICAL: &str = "technical";
/// Route label for the billing support handler.
pub const BILLING: &str = "billing";
/// Route label for the general support handler.
pub const GENERAL: &str = "general";
/// Route label for the package advisor.
pub const PACKAGE: &str = "package";

/// Picks the handler for a triaged query.
#[must_use]
pub fn route(snapshot: &StateSnapshot) -> String {
    if snapshot.sentiment.is_some_and(|sentiment| sentiment.is_negative()) {
        return ESCALATE.to_string();
    }
    match snapshot.category {
        Some(Category::Package) => PACKAGE.to_string(),
        Some(Category::Technical) => TECHNICAL.to_string(),
        Some(Category::Billing) => BILLING.to_string(),
        Some(Category::General) | None => GENERAL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Sentiment, SupportState};

    fn snapshot(category: Option<Category>, sentiment: Option<Sentiment>) -> StateSnapshot {
        let mut state = SupportState::new("test query");
        state.category = category;
        state.sentiment = sentiment;
        state.snapshot()
    }

    #[test]
    fn negative_sentiment_escalates_regardless_of_category() {
        for category in [
            None,
            Some(Category::Technical),
            Some(Category::Billing),
            Some(Category::General),
            Some(Category::Package),
        ] {
            let snap = snapshot(category, Some(Sentiment::Negative));
            assert_eq!(route(&snap), ESCALATE, "category {category:?}");
        }
    }

    #[test]
    fn categories_map_to_their_handlers() {
        let cases = [
            (Category::Technical, TECHNICAL),
            (Category::Billing, BILLING),
            (Category::General, GENERAL),
            (Category::Package, PACKAGE),
        ];
        for (category, label) in cases {
            let snap = snapshot(Some(category), Some(Sentiment::Neutral));
            assert_eq!(route(&snap), label);
        }
    }

    #[test]
    fn missing_triage_falls_back_to_general() {
        assert_eq!(route(&snapshot(None, None)), GENERAL);
        assert_eq!(route(&snapshot(None, Some(Sentiment::Positive))), GENERAL);
    }
}
