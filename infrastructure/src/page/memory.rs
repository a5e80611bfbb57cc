//! In-memory form page.
//!
//! Holds a static markup snapshot for extraction and simulates the page
//! controls the adapters mutate: checkboxes, text inputs, dropdowns and the
//! injected annotations. Used by the CLI to dry-run a saved page and by the
//! adapter tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use solver_application::ports::form_page::{FormPage, PageError};
use solver_domain::{Question, QuestionKind};

/// Simulated dropdown control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownControl {
    pub options: Vec<String>,
    pub open: bool,
    pub chosen: Option<String>,
    /// Polls of `dropdown_options` to swallow before the options count as
    /// rendered, simulating the host page's lazy rendering.
    pub render_delay: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub text: String,
    pub visible: bool,
}

/// Control state of one question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionControls {
    pub checks: Vec<bool>,
    /// Toggle clicks received, across all options.
    pub toggles: usize,
    pub has_text_input: bool,
    pub text: Option<String>,
    /// Input-change notifications fired by `fill_text`.
    pub input_events: usize,
    pub dropdown: Option<DropdownControl>,
    pub annotation: Option<Annotation>,
}

pub struct MemoryFormPage {
    html: String,
    questions: Mutex<Vec<QuestionControls>>,
    control_enabled: AtomicBool,
    control_visible: AtomicBool,
}

impl MemoryFormPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            questions: Mutex::new(Vec::new()),
            control_enabled: AtomicBool::new(true),
            control_visible: AtomicBool::new(true),
        }
    }

    /// Create the simulated controls matching a set of extracted questions.
    pub fn register_questions(&self, questions: &[Question]) {
        let controls = questions
            .iter()
            .map(|q| {
                let mut c = QuestionControls::default();
                match q.kind {
                    QuestionKind::SingleChoice | QuestionKind::MultiChoice => {
                        c.checks = vec![false; q.options.len()];
                    }
                    QuestionKind::Dropdown => {
                        c.dropdown = Some(DropdownControl {
                            options: q.option_labels(),
                            open: false,
                            chosen: None,
                            render_delay: 0,
                        });
                    }
                    QuestionKind::ShortText | QuestionKind::LongText => {
                        c.has_text_input = true;
                    }
                    QuestionKind::Unknown => {}
                }
                c
            })
            .collect();
        *self.lock() = controls;
    }

    /// Seed an option's checked state, as if the user had clicked it.
    pub fn set_checked(&self, question: usize, option: usize, checked: bool) {
        if let Some(c) = self.lock().get_mut(question) {
            if let Some(slot) = c.checks.get_mut(option) {
                *slot = checked;
            }
        }
    }

    /// Delay dropdown option rendering by `polls` reads.
    pub fn set_dropdown_render_delay(&self, question: usize, polls: usize) {
        if let Some(dropdown) = self
            .lock()
            .get_mut(question)
            .and_then(|c| c.dropdown.as_mut())
        {
            dropdown.render_delay = polls;
        }
    }

    /// Current state of every simulated control.
    pub fn snapshot(&self) -> Vec<QuestionControls> {
        self.lock().clone()
    }

    pub fn control_enabled(&self) -> bool {
        self.control_enabled.load(Ordering::SeqCst)
    }

    pub fn control_visible(&self) -> bool {
        self.control_visible.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<QuestionControls>> {
        self.questions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn with_question<T>(
        &self,
        question: usize,
        f: impl FnOnce(&mut QuestionControls) -> Result<T, PageError>,
    ) -> Result<T, PageError> {
        let mut questions = self.lock();
        let controls = questions
            .get_mut(question)
            .ok_or(PageError::NoSuchQuestion(question))?;
        f(controls)
    }
}

#[async_trait]
impl FormPage for MemoryFormPage {
    fn html(&self) -> String {
        self.html.clone()
    }

    fn option_checked(&self, question: usize, option: usize) -> Result<bool, PageError> {
        self.with_question(question, |c| {
            c.checks
                .get(option)
                .copied()
                .ok_or_else(|| PageError::MissingControl(format!("option {}", option)))
        })
    }

    async fn toggle_option(&self, question: usize, option: usize) -> Result<(), PageError> {
        self.with_question(question, |c| {
            let slot = c
                .checks
                .get_mut(option)
                .ok_or_else(|| PageError::MissingControl(format!("option {}", option)))?;
            *slot = !*slot;
            c.toggles += 1;
            Ok(())
        })
    }

    async fn open_dropdown(&self, question: usize) -> Result<(), PageError> {
        self.with_question(question, |c| {
            let dropdown = c
                .dropdown
                .as_mut()
                .ok_or_else(|| PageError::MissingControl("dropdown".to_string()))?;
            dropdown.open = true;
            Ok(())
        })
    }

    fn dropdown_options(&self, question: usize) -> Result<Vec<String>, PageError> {
        self.with_question(question, |c| {
            let dropdown = c
                .dropdown
                .as_mut()
                .ok_or_else(|| PageError::MissingControl("dropdown".to_string()))?;
            if !dropdown.open {
                return Ok(Vec::new());
            }
            if dropdown.render_delay > 0 {
                dropdown.render_delay -= 1;
                return Ok(Vec::new());
            }
            Ok(dropdown.options.clone())
        })
    }

    async fn choose_dropdown_option(&self, question: usize, text: &str) -> Result<(), PageError> {
        self.with_question(question, |c| {
            let dropdown = c
                .dropdown
                .as_mut()
                .ok_or_else(|| PageError::MissingControl("dropdown".to_string()))?;
            if !dropdown.open || !dropdown.options.iter().any(|o| o == text) {
                return Err(PageError::MissingControl(format!(
                    "dropdown option {:?}",
                    text
                )));
            }
            dropdown.chosen = Some(text.to_string());
            dropdown.open = false;
            Ok(())
        })
    }

    async fn fill_text(&self, question: usize, value: &str) -> Result<(), PageError> {
        self.with_question(question, |c| {
            if !c.has_text_input {
                return Err(PageError::MissingControl("text input".to_string()));
            }
            c.text = Some(value.to_string());
            c.input_events += 1;
            Ok(())
        })
    }

    fn replace_annotation(&self, question: usize, text: &str, visible: bool) {
        if let Some(c) = self.lock().get_mut(question) {
            c.annotation = Some(Annotation {
                text: text.to_string(),
                visible,
            });
        }
    }

    fn clear_annotation(&self, question: usize) {
        if let Some(c) = self.lock().get_mut(question) {
            c.annotation = None;
        }
    }

    fn set_annotations_visible(&self, visible: bool) {
        for c in self.lock().iter_mut() {
            if let Some(annotation) = c.annotation.as_mut() {
                annotation.visible = visible;
            }
        }
    }

    fn set_control_enabled(&self, enabled: bool) {
        self.control_enabled.store(enabled, Ordering::SeqCst);
    }

    fn set_control_visible(&self, visible: bool) {
        self.control_visible.store(visible, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solver_domain::AnswerOption;

    fn page_with(kind: QuestionKind, options: &[&str]) -> MemoryFormPage {
        let page = MemoryFormPage::new("<html></html>");
        let question = Question::new("q", kind)
            .with_options(options.iter().map(|o| AnswerOption::plain(*o)).collect());
        page.register_questions(&[question]);
        page
    }

    #[tokio::test]
    async fn test_toggle_flips_and_counts() {
        let page = page_with(QuestionKind::SingleChoice, &["a", "b"]);

        assert!(!page.option_checked(0, 0).unwrap());
        page.toggle_option(0, 0).await.unwrap();
        assert!(page.option_checked(0, 0).unwrap());
        page.toggle_option(0, 0).await.unwrap();
        assert!(!page.option_checked(0, 0).unwrap());
        assert_eq!(page.snapshot()[0].toggles, 2);
    }

    #[tokio::test]
    async fn test_unknown_question_index_errors() {
        let page = page_with(QuestionKind::SingleChoice, &["a"]);
        assert!(matches!(
            page.option_checked(3, 0),
            Err(PageError::NoSuchQuestion(3))
        ));
        assert!(matches!(
            page.fill_text(0, "x").await,
            Err(PageError::MissingControl(_))
        ));
    }

    #[tokio::test]
    async fn test_dropdown_renders_only_after_open() {
        let page = page_with(QuestionKind::Dropdown, &["Red", "Blue"]);
        page.set_dropdown_render_delay(0, 1);

        assert!(page.dropdown_options(0).unwrap().is_empty());
        page.open_dropdown(0).await.unwrap();
        // First poll is swallowed by the render delay.
        assert!(page.dropdown_options(0).unwrap().is_empty());
        assert_eq!(page.dropdown_options(0).unwrap(), vec!["Red", "Blue"]);

        page.choose_dropdown_option(0, "Blue").await.unwrap();
        let dropdown = page.snapshot()[0].dropdown.clone().unwrap();
        assert_eq!(dropdown.chosen.as_deref(), Some("Blue"));
        assert!(!dropdown.open);
    }

    #[tokio::test]
    async fn test_choosing_unlisted_option_fails() {
        let page = page_with(QuestionKind::Dropdown, &["Red"]);
        page.open_dropdown(0).await.unwrap();
        assert!(page.choose_dropdown_option(0, "Mauve").await.is_err());
    }

    #[tokio::test]
    async fn test_fill_text_fires_one_event_per_call() {
        let page = page_with(QuestionKind::ShortText, &[]);

        page.fill_text(0, "hello").await.unwrap();
        page.fill_text(0, "world").await.unwrap();

        let state = page.snapshot();
        assert_eq!(state[0].text.as_deref(), Some("world"));
        assert_eq!(state[0].input_events, 2);
    }

    #[test]
    fn test_annotation_visibility_sweep() {
        let page = page_with(QuestionKind::ShortText, &[]);

        page.replace_annotation(0, "Paris", true);
        page.set_annotations_visible(false);
        assert!(!page.snapshot()[0].annotation.as_ref().unwrap().visible);

        page.clear_annotation(0);
        assert!(page.snapshot()[0].annotation.is_none());
    }

    #[test]
    fn test_solve_control_flags() {
        let page = MemoryFormPage::new("");
        assert!(page.control_enabled());
        page.set_control_enabled(false);
        assert!(!page.control_enabled());

        assert!(page.control_visible());
        page.set_control_visible(false);
        assert!(!page.control_visible());
    }
}
