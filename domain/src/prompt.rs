//! Provider-agnostic prompt construction.

use crate::question::{ImageRef, Question};

/// Builds the prompt string sent to both providers for one question.
pub struct PromptTemplate;

impl PromptTemplate {
    /// Full prompt for a question.
    ///
    /// Choice questions enumerate every option and instruct the model to
    /// answer with the exact option text (comma-separated for multi-choice);
    /// everything else asks for a concise free-text answer. The image count
    /// covers only images embedded in the prompt itself.
    pub fn question_prompt(question: &Question) -> String {
        let mut prompt = String::from("Answer the following question");

        if !question.images.is_empty() {
            prompt.push_str(&format!(
                " ({} image(s) are included with this question)",
                question.images.len()
            ));
        }

        if !question.options.is_empty() {
            prompt.push_str(
                " by selecting from the given options. You MUST respond with the EXACT text \
                 of one or more options (comma-separated for multiple choice).\n\n",
            );
            prompt.push_str(&format!("Question: {}\n\n", question.text));
            prompt.push_str("Options:\n");
            for (idx, option) in question.options.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", idx + 1, option.label()));
            }
            prompt.push_str("\nRespond with ONLY the exact option text(s) from the list above.");
        } else {
            prompt.push_str(&format!(
                ":\n\n{}\n\nProvide a concise and accurate answer.",
                question.text
            ));
        }

        prompt
    }

    /// Images attached to the provider request: prompt images first, then any
    /// image carried by an option, in option order.
    pub fn request_images(question: &Question) -> Vec<ImageRef> {
        let mut images = question.images.clone();
        images.extend(question.options.iter().filter_map(|o| o.image().cloned()));
        images
    }
}
