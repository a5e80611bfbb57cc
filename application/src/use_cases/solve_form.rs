//! Solve Form use case
//!
//! Drives one form page end to end: read credentials, extract questions,
//! query both providers per question, reconcile, and write the decisions
//! back onto the page.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use solver_domain::{ImageRef, PromptTemplate, Question, Reconciliation};

use crate::ports::answer_gateway::AnswerGateway;
use crate::ports::form_adapter::{FormAdapter, FormError};
use crate::ports::settings::{SettingsError, SettingsStore, keys};
use crate::ui::UiState;

/// Default pause between questions, to stay under provider rate limits.
const QUESTION_DELAY: Duration = Duration::from_millis(500);

/// Terminal success status reported to the invoking side.
pub const STATUS_OK: &str = "Script executed";

/// Errors that can occur while solving a form
#[derive(Error, Debug)]
pub enum SolveFormError {
    /// One or both provider credentials are absent from the settings store.
    #[error("Please set your {0} API key(s) in the settings first!")]
    MissingApiKeys(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Form(#[from] FormError),
}

/// Use case for solving one form page.
///
/// Questions are processed strictly in document order, one at a time; only
/// the two provider calls within a question run concurrently. A provider or
/// page failure never aborts the loop — the question proceeds with whatever
/// is left.
pub struct SolveFormUseCase {
    openai: Arc<dyn AnswerGateway>,
    gemini: Arc<dyn AnswerGateway>,
    settings: Arc<dyn SettingsStore>,
    ui: UiState,
    question_delay: Duration,
}

impl SolveFormUseCase {
    pub fn new(
        openai: Arc<dyn AnswerGateway>,
        gemini: Arc<dyn AnswerGateway>,
        settings: Arc<dyn SettingsStore>,
        ui: UiState,
    ) -> Self {
        Self {
            openai,
            gemini,
            settings,
            ui,
            question_delay: QUESTION_DELAY,
        }
    }

    /// Override the inter-question pause.
    pub fn with_question_delay(mut self, delay: Duration) -> Self {
        self.question_delay = delay;
        self
    }

    /// Solve every question on the page behind `form`.
    ///
    /// The solve control is disabled for the duration of the run and
    /// re-enabled on every exit path, including failures.
    pub async fn execute(&self, form: &dyn FormAdapter) -> Result<(), SolveFormError> {
        form.set_control_enabled(false);
        let result = self.run(form).await;
        form.set_control_enabled(true);
        result
    }

    async fn run(&self, form: &dyn FormAdapter) -> Result<(), SolveFormError> {
        let openai_key = self.settings.get_string(keys::OPENAI_API_KEY).await?;
        let gemini_key = self.settings.get_string(keys::GEMINI_API_KEY).await?;

        let (openai_key, gemini_key) = match (openai_key, gemini_key) {
            (Some(o), Some(g)) if !o.is_empty() && !g.is_empty() => (o, g),
            (openai, gemini) => {
                let mut missing = Vec::new();
                if openai.as_deref().unwrap_or_default().is_empty() {
                    missing.push(self.openai.provider().display_name());
                }
                if gemini.as_deref().unwrap_or_default().is_empty() {
                    missing.push(self.gemini.provider().display_name());
                }
                return Err(SolveFormError::MissingApiKeys(missing.join(" and ")));
            }
        };

        let questions = form.extract_questions()?;
        info!("Found {} questions", questions.len());

        for (index, question) in questions.iter().enumerate() {
            info!(
                "Processing question {}/{} ({})",
                index + 1,
                questions.len(),
                question.kind
            );
            if let Err(e) = question.validate() {
                warn!("Question {}: {}", index + 1, e);
            }

            let prompt = PromptTemplate::question_prompt(question);
            let images = PromptTemplate::request_images(question);
            debug!(
                "Question {} prompt: {} chars, {} image(s)",
                index + 1,
                prompt.len(),
                images.len()
            );

            let (openai_answer, gemini_answer) = tokio::join!(
                self.ask(self.openai.as_ref(), &openai_key, &prompt, &images),
                self.ask(self.gemini.as_ref(), &gemini_key, &prompt, &images),
            );

            let outcome = Reconciliation::reconcile(
                question,
                openai_answer.as_deref(),
                gemini_answer.as_deref(),
            );
            if question.kind.is_choice() && !outcome.agree {
                info!(
                    "Question {}: providers disagree, marking the union of both picks",
                    index + 1
                );
            }

            if let Err(e) = form.apply_answer(index, question, &outcome).await {
                warn!("Question {} could not be filled: {}", index + 1, e);
            }

            form.clear_annotation(index);
            if let Some(text) = outcome.display_text() {
                form.annotate(index, &text, self.ui.visible());
            }

            if index + 1 < questions.len() {
                tokio::time::sleep(self.question_delay).await;
            }
        }

        Ok(())
    }

    /// One provider call; failures are logged and reduced to `None` so the
    /// question proceeds with the other provider's answer.
    async fn ask(
        &self,
        gateway: &dyn AnswerGateway,
        api_key: &str,
        prompt: &str,
        images: &[ImageRef],
    ) -> Option<String> {
        match gateway.answer(api_key, prompt, images).await {
            Ok(answer) => Some(answer),
            Err(e) => {
                warn!("{} call failed: {}", gateway.provider().display_name(), e);
                None
            }
        }
    }
}
