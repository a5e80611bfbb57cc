//! Google Forms adapter.
//!
//! Containers are `.Qr7Oae` elements; the question kind is detected from
//! marker elements in a fixed priority order. Dropdowns need special care at
//! apply time: the host page renders the option list only after the control
//! is clicked, and concurrent openings step on each other, so openings are
//! staggered and each one waits for its options to appear.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use solver_application::ports::form_adapter::{FormAdapter, FormError};
use solver_application::ports::form_page::{FormPage, PageError};
use solver_application::util::wait_until;
use solver_domain::{AnswerOption, ImageRef, Question, QuestionKind, Reconciliation};
use tokio::time::sleep;
use tracing::debug;

use super::{apply_choice, apply_text, element_text, image_src};

/// Delay between successive dropdown openings.
const DROPDOWN_STAGGER: Duration = Duration::from_millis(500);

/// How long to wait for an opened dropdown to render its options.
const DROPDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct GoogleFormAdapter {
    page: Arc<dyn FormPage>,
    dropdown_stagger: Duration,
    dropdown_timeout: Duration,
    /// Dropdowns applied in the current run, for the stagger offset.
    dropdowns_applied: AtomicUsize,
}

impl GoogleFormAdapter {
    pub fn new(page: Arc<dyn FormPage>) -> Self {
        Self::with_timing(page, DROPDOWN_STAGGER, DROPDOWN_TIMEOUT)
    }

    pub fn with_timing(
        page: Arc<dyn FormPage>,
        dropdown_stagger: Duration,
        dropdown_timeout: Duration,
    ) -> Self {
        Self {
            page,
            dropdown_stagger,
            dropdown_timeout,
            dropdowns_applied: AtomicUsize::new(0),
        }
    }

    fn extract_one(&self, item: scraper::ElementRef<'_>) -> Question {
        let title = Selector::parse("span.M7eMe").unwrap();
        let radio_marker = Selector::parse("div.oyXaNc").unwrap();
        let checkbox_marker = Selector::parse("div.Y6Myld").unwrap();
        let dropdown_marker = Selector::parse("div.ry3kXd").unwrap();
        let short_text = Selector::parse(r#"input[type="text"]"#).unwrap();
        let long_text = Selector::parse("textarea").unwrap();
        let img = Selector::parse("img").unwrap();
        let label = Selector::parse("label").unwrap();
        let span = Selector::parse("span").unwrap();

        let text = item
            .select(&title)
            .next()
            .map(element_text)
            .unwrap_or_else(|| "No question text".to_string());

        let images: Vec<ImageRef> = item
            .select(&img)
            .filter_map(image_src)
            .map(ImageRef::remote)
            .collect();

        let (kind, options) = if item.select(&radio_marker).next().is_some() {
            (
                QuestionKind::SingleChoice,
                labeled_options(item, &label, &img),
            )
        } else if item.select(&checkbox_marker).next().is_some() {
            (
                QuestionKind::MultiChoice,
                labeled_options(item, &label, &img),
            )
        } else if item.select(&dropdown_marker).next().is_some() {
            (QuestionKind::Dropdown, dropdown_options(item, &span))
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

    async fn apply_dropdown(
        &self,
        index: usize,
        outcome: &Reconciliation,
    ) -> Result<(), PageError> {
        let Some(text) = outcome.display_text() else {
            return Ok(());
        };

        let slot = self.dropdowns_applied.fetch_add(1, Ordering::SeqCst) as u32;
        sleep(self.dropdown_stagger * slot).await;

        self.page.open_dropdown(index).await?;
        let options = wait_until(self.dropdown_timeout, || async {
            match self.page.dropdown_options(index) {
                Ok(options) if !options.is_empty() => Some(Ok(options)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        })
        .await
        .ok_or_else(|| PageError::Timeout(format!("dropdown options of question {}", index)))??;

        // Only an exact match is clicked; anything else leaves the control as is.
        if options.iter().any(|option| *option == text) {
            self.page.choose_dropdown_option(index, &text).await?;
        } else {
            debug!("No dropdown option matches {:?} on question {}", text, index);
        }
        Ok(())
    }
}

/// Options declared as `label` elements, keeping a per-label image when one
/// is present.
fn labeled_options(
    item: scraper::ElementRef<'_>,
    label: &Selector,
    img: &Selector,
) -> Vec<AnswerOption> {
    item.select(label)
        .map(|l| {
            let text = element_text(l);
            match l.select(img).next().and_then(image_src) {
                Some(src) => AnswerOption::with_image(text, ImageRef::remote(src)),
                None => AnswerOption::plain(text),
            }
        })
        .collect()
}

/// Dropdown options are the span texts following the "Choose" sentinel.
fn dropdown_options(item: scraper::ElementRef<'_>, span: &Selector) -> Vec<AnswerOption> {
    let mut past_sentinel = false;
    let mut options = Vec::new();
    for element in item.select(span) {
        let text = element_text(element);
        if !past_sentinel {
            past_sentinel = text == "Choose";
            continue;
        }
        options.push(AnswerOption::plain(text));
    }
    options
}

#[async_trait]
impl FormAdapter for GoogleFormAdapter {
    fn extract_questions(&self) -> Result<Vec<Question>, FormError> {
        self.dropdowns_applied.store(0, Ordering::SeqCst);

        let html = Html::parse_document(&self.page.html());
        let container = Selector::parse(".Qr7Oae").unwrap();
        let questions: Vec<Question> = html
            .select(&container)
            .map(|item| self.extract_one(item))
            .collect();
        debug!("Extracted {} Google Forms questions", questions.len());
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
            QuestionKind::Dropdown => self.apply_dropdown(index, outcome).await?,
            QuestionKind::ShortText | QuestionKind::LongText => {
                apply_text(self.page.as_ref(), index, outcome).await?
            }
            QuestionKind::Unknown => {}
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
