//! Microsoft Forms adapter.
//!
//! MS Forms marks its structure with `data-automation-id` attributes and
//! carries option labels in `data-automation-value`, so extraction does not
//! depend on obfuscated class names. There is no dropdown flavor here.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use solver_application::ports::form_adapter::{FormAdapter, FormError};
use solver_application::ports::form_page::FormPage;
use solver_domain::{AnswerOption, ImageRef, Question, QuestionKind, Reconciliation};
use tracing::debug;

use super::{apply_choice, apply_text, element_text, image_src};

pub struct MsFormAdapter {
    page: Arc<dyn FormPage>,
}

impl MsFormAdapter {
    pub fn new(page: Arc<dyn FormPage>) -> Self {
        Self { page }
    }

    fn extract_one(&self, item: scraper::ElementRef<'_>) -> Question {
        let title = Selector::parse(r#"[data-automation-id="questionTitle"]"#).unwrap();
        let radio = Selector::parse(r#"[data-automation-id="radio"]"#).unwrap();
        let checkbox = Selector::parse(r#"[data-automation-id="checkbox"]"#).unwrap();
        let short_text = Selector::parse(r#"input[aria-label="Single line text"]"#).unwrap();
        let long_text = Selector::parse("textarea").unwrap();
        let img = Selector::parse("img").unwrap();

        let text = item.select(&title).next().map(element_text).unwrap_or_default();

        let images: Vec<ImageRef> = item
            .select(&img)
            .filter_map(image_src)
            .map(ImageRef::remote)
            .collect();

        let (kind, options) = if item.select(&radio).next().is_some() {
            (QuestionKind::SingleChoice, valued_options(item, &radio))
        } else if item.select(&checkbox).next().is_some() {
            (QuestionKind::MultiChoice, valued_options(item, &checkbox))
        } else if item.select(&short_text).next().is_some() {
            (QuestionKind::ShortText, Vec::new())
        } else if item.select(&long_text).next().is_some() {
            (QuestionKind::LongText, Vec::new())
        } else {
            (QuestionKind::Unknown, Vec::new())
        };

        Question::new(text, kind)
            .with_options(options)
            .with_images(images)
    }
}

/// Option labels live in the control's `data-automation-value` attribute.
fn valued_options(item: scraper::ElementRef<'_>, control: &Selector) -> Vec<AnswerOption> {
    item.select(control)
        .filter_map(|c| c.value().attr("data-automation-value"))
        .map(|value| AnswerOption::plain(value.trim()))
        .collect()
}

#[async_trait]
impl FormAdapter for MsFormAdapter {
    fn extract_questions(&self) -> Result<Vec<Question>, FormError> {
        let html = Html::parse_document(&self.page.html());
        let container = Selector::parse(r#"div[data-automation-id="questionItem"]"#).unwrap();
        let questions: Vec<Question> = html
            .select(&container)
            .map(|item| self.extract_one(item))
            .collect();
        debug!("Extracted {} MS Forms questions", questions.len());
        Ok(questions)
    }

    async fn apply_answer(
        &self,
        index: usize,
        question: &Question,
        outcome: &Reconciliation,
    ) -> Result<(), FormError> {
        match question.kind {
            QuestionKind::SingleChoice | QuestionKind::MultiChoice => {
                apply_choice(self.page.as_ref(), index, question, outcome).await?
            }
            QuestionKind::ShortText | QuestionKind::LongText => {
                apply_text(self.page.as_ref(), index, outcome).await?
            }
            // MS Forms has no dropdown flavor; treat a stray one as unknown.
            QuestionKind::Dropdown | QuestionKind::Unknown => {}
        }
        Ok(())
    }

    fn annotate(&self, index: usize, text: &str, visible: bool) {
        self.page.replace_annotation(index, text, visible);
    }

    fn clear_annotation(&self, index: usize) {
        self.page.clear_annotation(index);
    }

    fn set_control_enabled(&self, enabled: bool) {
        self.page.set_control_enabled(enabled);
    }

    fn set_ui_visible(&self, visible: bool) {
        self.page.set_annotations_visible(visible);
        self.page.set_control_visible(visible);
    }
}
