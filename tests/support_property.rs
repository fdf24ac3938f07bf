#[macro_use]
extern crate proptest;

use proptest::prelude::{Just, Strategy, prop};

use supportflow::state::{Category, Sentiment, StatePatch, SupportState};
use supportflow::support::router::{self, BILLING, ESCALATE, GENERAL, PACKAGE, TECHNICAL};

fn category_strategy() -> impl Strategy<Value = Option<Category>> {
    prop_oneof![
        Just(None),
        Just(Some(Category::Technical)),
        Just(Some(Category::Billing)),
        Just(Some(Category::General)),
        Just(Some(Category::Package)),
    ]
}

fn sentiment_strategy() -> impl Strategy<Value = Option<Sentiment>> {
    prop_oneof![
        Just(None),
        Just(Some(Sentiment::Positive)),
        Just(Some(Sentiment::Neutral)),
        Just(Some(Sentiment::Negative)),
    ]
}

fn patch_strategy() -> impl Strategy<Value = StatePatch> {
    (
        category_strategy(),
        sentiment_strategy(),
        prop::option::of(prop::collection::vec("[a-z]{0,6}", 0..4)),
        prop::option::of("[a-z]{0,8}"),
    )
        .prop_map(|(category, sentiment, context, response)| {
            let mut patch = StatePatch::default();
            patch.category = category;
            patch.sentiment = sentiment;
            patch.context = context;
            patch.response = response;
            patch
        })
}

fn triaged_state(
    category: Option<Category>,
    sentiment: Option<Sentiment>,
) -> SupportState {
    let mut state = SupportState::new("any query");
    state.category = category;
    state.sentiment = sentiment;
    state
}

proptest! {
    /// The router is total: every triage combination yields a label the
    /// support graph has wired, so a routing failure is impossible there.
    #[test]
    fn prop_route_label_is_always_wired(
        category in category_strategy(),
        sentiment in sentiment_strategy(),
    ) {
        let label = router::route(&triaged_state(category, sentiment).snapshot());
        prop_assert!(
            [ESCALATE, TECHNICAL, BILLING, GENERAL, PACKAGE].contains(&label.as_str()),
            "unwired label {label:?}"
        );
    }

    /// Escalation happens exactly when the sentiment is negative.
    #[test]
    fn prop_escalation_iff_negative_sentiment(
        category in category_strategy(),
        sentiment in sentiment_strategy(),
    ) {
        let label = router::route(&triaged_state(category, sentiment).snapshot());
        prop_assert_eq!(label == ESCALATE, sentiment == Some(Sentiment::Negative));
    }

    /// Classifier output normalization never panics and never leaves the
    /// category set; unknown shapes land on the general bucket.
    #[test]
    fn prop_category_normalization_is_total(raw in ".{0,24}") {
        let category = Category::normalize(&raw);
        prop_assert!(matches!(
            category,
            Category::Technical | Category::Billing | Category::General | Category::Package
        ));
    }

    /// Canonical forms survive a normalize round trip.
    #[test]
    fn prop_canonical_categories_round_trip(category in category_strategy()) {
        if let Some(category) = category {
            prop_assert_eq!(Category::normalize(category.as_str()), category);
        }
    }

    /// A rejected patch leaves the state byte-for-byte unchanged; an
    /// accepted one lands exactly the present fields.
    #[test]
    fn prop_patch_merge_is_atomic(
        category in category_strategy(),
        sentiment in sentiment_strategy(),
        response in prop::option::of("[a-z]{1,8}"),
        patch in patch_strategy(),
    ) {
        let mut state = triaged_state(category, sentiment);
        state.response = response;
        let before = state.clone();

        match state.apply(patch.clone()) {
            Ok(()) => {
                prop_assert_eq!(&state.query, &before.query);
                match patch.category {
                    Some(incoming) => prop_assert_eq!(state.category, Some(incoming)),
                    None => prop_assert_eq!(state.category, before.category),
                }
                match patch.sentiment {
                    Some(incoming) => prop_assert_eq!(state.sentiment, Some(incoming)),
                    None => prop_assert_eq!(state.sentiment, before.sentiment),
                }
                match patch.context {
                    Some(incoming) => prop_assert_eq!(&state.context, &incoming),
                    None => prop_assert_eq!(&state.context, &before.context),
                }
                match patch.response {
                    Some(incoming) => prop_assert_eq!(state.response.as_deref(), Some(incoming.as_str())),
                    None => prop_assert_eq!(&state.response, &before.response),
                }
            }
            Err(_) => prop_assert_eq!(state, before),
        }
    }
}
