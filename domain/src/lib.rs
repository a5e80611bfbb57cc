//! Domain layer for form-solver
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Question
//!
//! Heterogeneous form items are normalized into a uniform [`Question`] model:
//! a prompt, a detected kind, an ordered option list and any embedded images.
//!
//! ## Reconciliation
//!
//! Each question is answered by two independent providers. Their answers are
//! bound onto the declared options ([`matcher`]) and combined into a single
//! decision ([`Reconciliation`]): on agreement the shared answer is selected,
//! on disagreement the union of both picks is surfaced on the form.

pub mod error;
pub mod matcher;
pub mod model;
pub mod prompt;
pub mod question;
pub mod reconcile;

// Re-export commonly used types
pub use error::DomainError;
pub use model::{ApiVersion, GeminiModel, ProviderKind};
pub use prompt::PromptTemplate;
pub use question::{AnswerOption, ImageRef, Question, QuestionKind};
pub use reconcile::{MatchedAnswer, Reconciliation};
