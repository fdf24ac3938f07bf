//! State management for the supportflow workflow engine.
//!
//! This module provides the typed, mutable record that flows through a
//! support workflow run: the query under consideration, the classified
//! [`Category`], the assessed [`Sentiment`], retrieved context snippets,
//! and the final response.
//!
//! # Core Types
//!
//! - [`SupportState`]: The mutable state container owned by the executor
//! - [`StateSnapshot`]: Immutable view handed to nodes and routers
//! - [`StatePatch`]: Partial update produced by a node invocation
//!
//! # Merge Model
//!
//! Nodes never mutate state directly. Each node returns a [`StatePatch`]
//! containing only the fields it changed; the executor applies the patch as
//! a shallow union. `category`, `sentiment`, and `response` are set-once:
//! re-applying an identical value is a no-op, while a conflicting value is
//! rejected with [`StateError`] and leaves the state untouched.
//!
//! # Examples
//!
//! ```rust
//! use supportflow::state::{Category, Sentiment, StatePatch, SupportState};
//!
//! let mut state = SupportState::new("ราคาแพ็คเกจ S เท่าไหร่");
//!
//! let patch = StatePatch::default()
//!     .with_category(Category::Package)
//!     .with_sentiment(Sentiment::Neutral);
//! state.apply(patch).unwrap();
//!
//! let snapshot = state.snapshot();
//! assert_eq!(snapshot.category, Some(Category::Package));
//! assert!(snapshot.response.is_none());
//! ```

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classified intent of a customer query.
///
/// Set exactly once per run by the classify node. Raw classifier output is
/// free text, so [`Category::normalize`] applies the documented fallback:
/// anything that does not match a known category becomes
/// [`General`](Self::General).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Product malfunctions, setup problems, integrations.
    Technical,
    /// Invoices, charges, refunds, payment methods.
    Billing,
    /// Anything that fits no other bucket.
    General,
    /// Subscription package inquiries (pricing, plan contents, upgrades).
    Package,
}

impl Category {
    /// The canonical string form, matching the persisted representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "Technical",
            Category::Billing => "Billing",
            Category::General => "General",
            Category::Package => "Package",
        }
    }

    /// Parse the exact canonical form, without fallback.
    #[must_use]
    pub fn parse_exact(s: &str) -> Option<Self> {
        match s {
            "Technical" => Some(Category::Technical),
            "Billing" => Some(Category::Billing),
            "General" => Some(Category::General),
            "Package" => Some(Category::Package),
            _ => None,
        }
    }

    /// Normalize raw classifier output into a category.
    ///
    /// Trims surrounding whitespace and title-cases the text (first letter
    /// uppercased, remainder lowercased) before parsing, so `" billing "`
    /// and `"BILLING"` both resolve to [`Billing`](Self::Billing).
    /// Unrecognized output falls back to [`General`](Self::General).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use supportflow::state::Category;
    ///
    /// assert_eq!(Category::normalize("package"), Category::Package);
    /// assert_eq!(Category::normalize("  Technical\n"), Category::Technical);
    /// assert_eq!(Category::normalize("Unknown"), Category::General);
    /// assert_eq!(Category::normalize(""), Category::General);
    /// ```
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        Self::parse_exact(&title_case(raw)).unwrap_or(Category::General)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assessed emotional tone of a customer query.
///
/// Set exactly once per run by the sentiment node. Only an explicit
/// [`Negative`](Self::Negative) escalates; unrecognized assessor output
/// normalizes to the non-escalating [`Neutral`](Self::Neutral).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// The canonical string form, matching the persisted representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }

    /// Parse the exact canonical form, without fallback.
    #[must_use]
    pub fn parse_exact(s: &str) -> Option<Self> {
        match s {
            "Positive" => Some(Sentiment::Positive),
            "Neutral" => Some(Sentiment::Neutral),
            "Negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }

    /// Normalize raw assessor output into a sentiment.
    ///
    /// Same trimming and title-casing as [`Category::normalize`];
    /// unrecognized output falls back to [`Neutral`](Self::Neutral) so that
    /// escalation only ever happens on an explicit `Negative`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use supportflow::state::Sentiment;
    ///
    /// assert_eq!(Sentiment::normalize("negative"), Sentiment::Negative);
    /// assert_eq!(Sentiment::normalize("meh"), Sentiment::Neutral);
    /// ```
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        Self::parse_exact(&title_case(raw)).unwrap_or(Sentiment::Neutral)
    }

    /// Returns `true` for [`Negative`](Self::Negative).
    #[must_use]
    pub fn is_negative(&self) -> bool {
        matches!(self, Sentiment::Negative)
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trim and title-case model output the way the classifier prompts expect:
/// first character uppercased, the rest lowercased.
fn title_case(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// The mutable state record for one workflow run.
///
/// Owned by the executor; nodes and routers only ever see a
/// [`StateSnapshot`]. The field set is closed: a patch cannot introduce
/// fields outside this schema, and the persisted form rejects unknown
/// fields on decode.
///
/// # Invariants
///
/// - `query` is immutable after construction (no patch field exists for it).
/// - `category`, `sentiment`, and `response` are set-once (see
///   [`SupportState::apply`]).
/// - `response` is `None` until a handler node has executed.
///
/// # Examples
///
/// ```rust
/// use supportflow::state::{Sentiment, StatePatch, SupportState};
///
/// let mut state = SupportState::new("my invoice is wrong");
/// state
///     .apply(StatePatch::default().with_sentiment(Sentiment::Neutral))
///     .unwrap();
///
/// // Re-applying the same value is a no-op...
/// state
///     .apply(StatePatch::default().with_sentiment(Sentiment::Neutral))
///     .unwrap();
///
/// // ...but a conflicting value is rejected.
/// let err = state
///     .apply(StatePatch::default().with_sentiment(Sentiment::Negative))
///     .unwrap_err();
/// assert!(err.to_string().contains("sentiment"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupportState {
    /// The customer query this run is answering.
    pub query: String,
    /// Classified intent, set once by the classify node.
    pub category: Option<Category>,
    /// Assessed tone, set once by the sentiment node.
    pub sentiment: Option<Sentiment>,
    /// Retrieved text snippets grounding the response, in retrieval order.
    pub context: Vec<String>,
    /// Final answer, set exactly once by a terminal handler node.
    pub response: Option<String>,
}

/// Immutable view of [`SupportState`] handed to nodes and routers.
///
/// Snapshots are taken by the executor before each node invocation and
/// again after the node's patch is applied (for router evaluation), so
/// routing always observes post-patch state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateSnapshot {
    /// The customer query this run is answering.
    pub query: String,
    /// Classified intent, if the classify node has run.
    pub category: Option<Category>,
    /// Assessed tone, if the sentiment node has run.
    pub sentiment: Option<Sentiment>,
    /// Retrieved text snippets, in retrieval order.
    pub context: Vec<String>,
    /// Final answer, if a handler node has run.
    pub response: Option<String>,
}

impl SupportState {
    /// Creates the initial state for a run from a customer query.
    ///
    /// All other fields start unset; nodes fill them in through patches.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            sentiment: None,
            context: Vec::new(),
            response: None,
        }
    }

    /// Creates a builder for states with pre-populated fields.
    ///
    /// Useful for resuming from a checkpoint or constructing test
    /// fixtures mid-workflow.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use supportflow::state::{Category, Sentiment, SupportState};
    ///
    /// let state = SupportState::builder("ขอใบเสร็จย้อนหลัง")
    ///     .with_category(Category::Billing)
    ///     .with_sentiment(Sentiment::Neutral)
    ///     .build();
    ///
    /// assert_eq!(state.category, Some(Category::Billing));
    /// assert!(state.response.is_none());
    /// ```
    pub fn builder(query: impl Into<String>) -> SupportStateBuilder {
        SupportStateBuilder::new(query)
    }

    /// Creates an immutable snapshot of the current state.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            query: self.query.clone(),
            category: self.category,
            sentiment: self.sentiment,
            context: self.context.clone(),
            response: self.response.clone(),
        }
    }

    /// Applies a node's patch as a shallow union.
    ///
    /// Present patch fields overwrite the corresponding state fields;
    /// absent fields are untouched. Set-once fields (`category`,
    /// `sentiment`, `response`) accept an identical re-set as a no-op and
    /// reject a conflicting re-set.
    ///
    /// The merge is atomic: every conflict check runs before any field is
    /// written, so a rejected patch leaves the state exactly as it was.
    pub fn apply(&mut self, patch: StatePatch) -> Result<(), StateError> {
        if let (Some(current), Some(incoming)) = (self.category, patch.category)
            && current != incoming
        {
            return Err(StateError::CategoryConflict { current, incoming });
        }
        if let (Some(current), Some(incoming)) = (self.sentiment, patch.sentiment)
            && current != incoming
        {
            return Err(StateError::SentimentConflict { current, incoming });
        }
        if let (Some(current), Some(incoming)) = (&self.response, &patch.response)
            && current != incoming
        {
            return Err(StateError::ResponseConflict);
        }

        if let Some(category) = patch.category {
            self.category = Some(category);
        }
        if let Some(sentiment) = patch.sentiment {
            self.sentiment = Some(sentiment);
        }
        if let Some(context) = patch.context {
            self.context = context;
        }
        if let Some(response) = patch.response {
            self.response = Some(response);
        }
        Ok(())
    }
}

/// Partial state update produced by one node invocation.
///
/// Contains only the fields the node changed; everything else is `None`
/// and left untouched by the merge. The field set is closed, which is what
/// keeps patches inside the state schema by construction.
///
/// # Examples
///
/// ```rust
/// use supportflow::state::{Category, StatePatch};
///
/// let patch = StatePatch::default().with_category(Category::Technical);
/// assert!(!patch.is_empty());
/// assert!(patch.response.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatePatch {
    /// Classified intent to record, if the node produced one.
    pub category: Option<Category>,
    /// Assessed tone to record, if the node produced one.
    pub sentiment: Option<Sentiment>,
    /// Retrieved snippets to record, replacing the previous list.
    pub context: Option<Vec<String>>,
    /// Final answer to record, if the node produced one.
    pub response: Option<String>,
}

impl StatePatch {
    /// Builder-style helper to set the category field.
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Builder-style helper to set the sentiment field.
    #[must_use]
    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    /// Builder-style helper to set the context field.
    #[must_use]
    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = Some(context);
        self
    }

    /// Builder-style helper to set the response field.
    #[must_use]
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Returns `true` when the patch changes nothing.
    ///
    /// Resume-aware nodes return an empty patch when their output field is
    /// already populated in the snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.sentiment.is_none()
            && self.context.is_none()
            && self.response.is_none()
    }
}

/// Builder for constructing [`SupportState`] with pre-populated fields.
#[derive(Debug)]
pub struct SupportStateBuilder {
    query: String,
    category: Option<Category>,
    sentiment: Option<Sentiment>,
    context: Vec<String>,
    response: Option<String>,
}

impl SupportStateBuilder {
    fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            sentiment: None,
            context: Vec::new(),
            response: None,
        }
    }

    /// Pre-populates the category field.
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Pre-populates the sentiment field.
    #[must_use]
    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    /// Pre-populates the context list.
    #[must_use]
    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = context;
        self
    }

    /// Pre-populates the response field.
    #[must_use]
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Builds the final state.
    pub fn build(self) -> SupportState {
        SupportState {
            query: self.query,
            category: self.category,
            sentiment: self.sentiment,
            context: self.context,
            response: self.response,
        }
    }
}

/// Errors raised when a patch violates the state's set-once rules.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum StateError {
    #[error("category is already {current}, a patch may not change it to {incoming}")]
    #[diagnostic(
        code(supportflow::state::category_conflict),
        help("category is set once per run; resume-aware nodes should skip when it is populated")
    )]
    CategoryConflict {
        current: Category,
        incoming: Category,
    },

    #[error("sentiment is already {current}, a patch may not change it to {incoming}")]
    #[diagnostic(
        code(supportflow::state::sentiment_conflict),
        help("sentiment is set once per run; resume-aware nodes should skip when it is populated")
    )]
    SentimentConflict {
        current: Sentiment,
        incoming: Sentiment,
    },

    #[error("response is already set, a patch may not replace it with different text")]
    #[diagnostic(
        code(supportflow::state::response_conflict),
        help("exactly one handler node sets the response per run")
    )]
    ResponseConflict,
}
