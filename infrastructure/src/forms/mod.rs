//! Form adapters.
//!
//! Each adapter knows one form flavor's markup and drives a [`FormPage`]
//! accordingly. Extraction parses a markup snapshot with `scraper`; answer
//! application goes through the page's structured mutations.

pub mod google;
pub mod microsoft;

pub use google::GoogleFormAdapter;
pub use microsoft::MsFormAdapter;

use scraper::ElementRef;
use solver_application::ports::form_page::{FormPage, PageError};
use solver_domain::{Question, Reconciliation};

/// Concatenated trimmed text of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Usable image source of an `img` element. SVG placeholders (decorative
/// chrome on both form flavors) are dropped.
pub(crate) fn image_src(element: ElementRef<'_>) -> Option<String> {
    let src = element.value().attr("src")?;
    if src.is_empty() || src.contains("data:image/svg") {
        return None;
    }
    Some(src.to_string())
}

/// Bring every option control of a choice question to its target checked
/// state, touching only the ones that differ.
pub(crate) async fn apply_choice(
    page: &dyn FormPage,
    index: usize,
    question: &Question,
    outcome: &Reconciliation,
) -> Result<(), PageError> {
    let targets = outcome.selection_targets(question);
    for (option, want) in targets.iter().enumerate() {
        let checked = page.option_checked(index, option)?;
        if checked != *want {
            page.toggle_option(index, option).await?;
        }
    }
    Ok(())
}

/// Write the final answer into a text control, if there is one to write.
pub(crate) async fn apply_text(
    page: &dyn FormPage,
    index: usize,
    outcome: &Reconciliation,
) -> Result<(), PageError> {
    if let Some(text) = outcome.display_text() {
        page.fill_text(index, &text).await?;
    }
    Ok(())
}
