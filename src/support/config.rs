//! Tunables for the support workflow.

use serde::{Deserialize, Serialize};

use super::catalog::PackageCatalog;

/// Language the customer-facing handler nodes answer in.
///
/// Classification and sentiment analysis always run against the raw query;
/// only the drafted reply is language-steered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Thai,
    English,
}

impl Language {
    /// English name of the language, as spliced into prompts.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Thai => "Thai",
            Language::English => "English",
        }
    }
}

/// Configuration shared by the handler nodes.
///
/// The default matches the production deployment: Thai replies, the call
/// center number for escalations, and the published package lineup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupportConfig {
    /// Language the handlers reply in.
    pub language: Language,
    /// Phone number handed out when a conversation is escalated.
    pub escalation_contact: String,
    /// How many knowledge-base hits the package handler retrieves.
    pub retrieval_k: usize,
    /// Plan lineup used for retrieval seeding and package prompts.
    pub catalog: PackageCatalog,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            escalation_contact: "02-123-4567".to_string(),
            retrieval_k: 5,
            catalog: PackageCatalog::default(),
        }
    }
}

impl SupportConfig {
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn with_escalation_contact(mut self, contact: impl Into<String>) -> Self {
        self.escalation_contact = contact.into();
        self
    }

    #[must_use]
    pub fn with_retrieval_k(mut self, k: usize) -> Self {
        self.retrieval_k = k;
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: PackageCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}
