//! Form adapter port
//!
//! A form adapter translates between one form flavor's page structure and the
//! uniform [`Question`] model: extraction of questions from the page, and
//! application of a reconciled answer back onto it.

use async_trait::async_trait;
use solver_domain::{Question, Reconciliation};
use thiserror::Error;

use super::form_page::PageError;

/// Errors raised by a form adapter
#[derive(Error, Debug)]
pub enum FormError {
    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error(transparent)]
    Page(#[from] PageError),
}

/// One form flavor bound to a live page.
///
/// `apply_answer` may fail for a single question (for example when the
/// expected control disappeared from the page); the caller logs and moves on
/// to the next question rather than aborting the page.
#[async_trait]
pub trait FormAdapter: Send + Sync {
    /// Scan the page and produce every detected question in document order.
    fn extract_questions(&self) -> Result<Vec<Question>, FormError>;

    /// Mutate the page so question `index` reflects the reconciled decision.
    async fn apply_answer(
        &self,
        index: usize,
        question: &Question,
        outcome: &Reconciliation,
    ) -> Result<(), FormError>;

    /// Replace the visible answer annotation under question `index`.
    fn annotate(&self, index: usize, text: &str, visible: bool);

    /// Remove the answer annotation under question `index`, if present.
    fn clear_annotation(&self, index: usize);

    /// Enable or disable the injected solve control.
    fn set_control_enabled(&self, enabled: bool);

    /// Reflect the process-wide UI-visibility flag on injected elements.
    fn set_ui_visible(&self, visible: bool);
}
