//! Form page port
//!
//! The live form page is an external, rapidly-mutating surface owned by a
//! third party. This port narrows it to the operations the form adapters
//! need: a markup snapshot for extraction, and a small set of structured
//! mutations addressed by (question index, option index).

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by page operations
#[derive(Error, Debug)]
pub enum PageError {
    #[error("No such question: {0}")]
    NoSuchQuestion(usize),

    /// An expected sub-element (input, textarea, dropdown control) is absent
    /// at apply time.
    #[error("Missing control: {0}")]
    MissingControl(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),
}

/// One live form page.
///
/// Mutations mirror native user interaction: toggles are clicks, text fill
/// fires exactly one input-change notification, dropdown options only exist
/// after the host page has rendered them.
#[async_trait]
pub trait FormPage: Send + Sync {
    /// Current markup snapshot of the page.
    fn html(&self) -> String;

    /// Checked state of one on-screen option control.
    fn option_checked(&self, question: usize, option: usize) -> Result<bool, PageError>;

    /// Click one option control, flipping its checked state.
    async fn toggle_option(&self, question: usize, option: usize) -> Result<(), PageError>;

    /// Click the dropdown control so the host page starts rendering options.
    async fn open_dropdown(&self, question: usize) -> Result<(), PageError>;

    /// Dropdown options rendered so far; empty until the host page has
    /// populated the open dropdown.
    fn dropdown_options(&self, question: usize) -> Result<Vec<String>, PageError>;

    /// Click the rendered dropdown option whose text equals `text` exactly.
    async fn choose_dropdown_option(&self, question: usize, text: &str) -> Result<(), PageError>;

    /// Focus the question's text control, set its value, fire the control's
    /// input-change notification once and remove focus.
    async fn fill_text(&self, question: usize, value: &str) -> Result<(), PageError>;

    /// Replace the injected answer annotation for one question.
    fn replace_annotation(&self, question: usize, text: &str, visible: bool);

    /// Remove the injected answer annotation for one question, if any.
    fn clear_annotation(&self, question: usize);

    /// Show or hide every already-injected annotation.
    fn set_annotations_visible(&self, visible: bool);

    /// Enable or disable the injected solve control.
    fn set_control_enabled(&self, enabled: bool);

    /// Show or hide the injected solve control.
    fn set_control_visible(&self, visible: bool);
}
