//! Question model extracted from a live form page.

use serde::{Deserialize, Serialize};

/// Shape of a form question, derived from the DOM structure.
///
/// Detection runs in a fixed priority order (radio group, checkbox group,
/// dropdown, short text, long text); `Unknown` is the catch-all when no
/// recognized sub-structure is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultiChoice,
    Dropdown,
    ShortText,
    LongText,
    Unknown,
}

impl QuestionKind {
    /// Whether this kind carries a declared option list.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            QuestionKind::SingleChoice | QuestionKind::MultiChoice | QuestionKind::Dropdown
        )
    }

    /// Whether a model answer may name several options at once.
    pub fn is_multi(&self) -> bool {
        matches!(self, QuestionKind::MultiChoice)
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::MultiChoice => "multi_choice",
            QuestionKind::Dropdown => "dropdown",
            QuestionKind::ShortText => "short_text",
            QuestionKind::LongText => "long_text",
            QuestionKind::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// An image attached to a question or option.
///
/// `Remote` refs are inlined opportunistically before a provider call; when
/// fetching or encoding fails the raw URL is sent in place of the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Remote { url: String },
    Inline { mime_type: String, data: String },
}

impl ImageRef {
    pub fn remote(url: impl Into<String>) -> Self {
        ImageRef::Remote { url: url.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        ImageRef::Inline {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// One declared option of a choice question.
///
/// Order matches on-screen order and is the only identity; options are never
/// deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerOption {
    Plain(String),
    WithImage { label: String, image: ImageRef },
}

impl AnswerOption {
    pub fn plain(label: impl Into<String>) -> Self {
        AnswerOption::Plain(label.into())
    }

    pub fn with_image(label: impl Into<String>, image: ImageRef) -> Self {
        AnswerOption::WithImage {
            label: label.into(),
            image,
        }
    }

    /// The on-screen text of this option.
    pub fn label(&self) -> &str {
        match self {
            AnswerOption::Plain(label) => label,
            AnswerOption::WithImage { label, .. } => label,
        }
    }

    pub fn image(&self) -> Option<&ImageRef> {
        match self {
            AnswerOption::Plain(_) => None,
            AnswerOption::WithImage { image, .. } => Some(image),
        }
    }
}

/// One detected form item in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question prompt; a placeholder or empty string when not found.
    pub text: String,
    pub kind: QuestionKind,
    /// Empty for non-choice kinds.
    pub options: Vec<AnswerOption>,
    /// Images embedded in the prompt itself (option images are collected
    /// separately when the provider request is built).
    pub images: Vec<ImageRef>,
}

impl Question {
    pub fn new(text: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            text: text.into(),
            kind,
            options: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<AnswerOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_images(mut self, images: Vec<ImageRef>) -> Self {
        self.images = images;
        self
    }

    /// Check the kind/options invariant: choice kinds carry at least one
    /// option, text kinds carry none. `Unknown` is exempt.
    pub fn validate(&self) -> Result<(), crate::error::DomainError> {
        use crate::error::DomainError;
        match self.kind {
            QuestionKind::Unknown => Ok(()),
            kind if kind.is_choice() && self.options.is_empty() => Err(
                DomainError::InvalidQuestion(format!("{} question without options", kind)),
            ),
            kind if !kind.is_choice() && !self.options.is_empty() => Err(
                DomainError::InvalidQuestion(format!("{} question with options", kind)),
            ),
            _ => Ok(()),
        }
    }

    /// Option labels in on-screen order.
    pub fn option_labels(&self) -> Vec<String> {
        self.options.iter().map(|o| o.label().to_string()).collect()
    }

    /// Look up the declared option carrying the given label, first match wins.
    pub fn option_by_label(&self, label: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.label() == label)
    }
}
