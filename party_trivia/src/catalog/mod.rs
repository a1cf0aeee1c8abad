//! Question catalog collaborator.
//!
//! The session asks the catalog for one question per round and never
//! accepts the same question id twice. Where the questions come from is up
//! to the implementation; [`InMemoryCatalog`] serves a fixed set loaded
//! from JSON or built in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::game::{Difficulty, MediaRef, PrecisionQuestion, Question, QuestionId, QuestionType};

pub mod memory;

pub use memory::InMemoryCatalog;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no unused question matches the filters")]
    Exhausted,
    #[error("need {needed} precision questions, catalog has {available}")]
    NotEnoughPrecisionQuestions { needed: usize, available: usize },
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// A question together with its optional track preview.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub question: Question,
    #[serde(default)]
    pub media: Option<MediaRef>,
}

/// Restricts which questions a session draws. Empty lists mean "any".
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct QuestionFilters {
    pub question_types: Vec<QuestionType>,
    pub difficulties: Vec<Difficulty>,
}

impl QuestionFilters {
    #[must_use]
    pub fn matches(&self, question: &Question) -> bool {
        (self.question_types.is_empty() || self.question_types.contains(&question.question_type))
            && (self.difficulties.is_empty() || self.difficulties.contains(&question.difficulty))
    }
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Next question not in `used` that passes `filters`.
    async fn next_question(
        &self,
        used: &HashSet<QuestionId>,
        filters: &QuestionFilters,
    ) -> CatalogResult<CatalogEntry>;

    /// Questions for a precision quiz.
    async fn precision_questions(&self, count: usize) -> CatalogResult<Vec<PrecisionQuestion>>;
}
