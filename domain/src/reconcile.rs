//! Reconciling two providers' answers for one question into a single decision.
//!
//! Neither provider is authoritative. When they disagree on a choice question
//! the union of both picks is surfaced on the form instead of silently
//! choosing one.

use serde::{Deserialize, Serialize};

use crate::matcher;
use crate::question::{AnswerOption, Question};

/// A raw model answer bound onto the question's declared option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchedAnswer {
    /// Non-choice questions keep the answer as-is; also used for a choice
    /// answer that matched no declared option.
    FreeText(String),
    Single(AnswerOption),
    Multi(Vec<AnswerOption>),
}

impl MatchedAnswer {
    /// Option labels this answer selects, used for marking the form.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            MatchedAnswer::FreeText(text) => vec![text.as_str()],
            MatchedAnswer::Single(opt) => vec![opt.label()],
            MatchedAnswer::Multi(opts) => opts.iter().map(|o| o.label()).collect(),
        }
    }

    /// Human-readable form used for the on-page answer annotation.
    pub fn display_text(&self) -> String {
        match self {
            MatchedAnswer::FreeText(text) => text.clone(),
            MatchedAnswer::Single(opt) => opt.label().to_string(),
            MatchedAnswer::Multi(opts) => opts
                .iter()
                .map(|o| o.label())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Canonical comparison form: multi answers are order-insensitive.
    fn normalized(&self) -> String {
        let joined = match self {
            MatchedAnswer::FreeText(text) => text.clone(),
            MatchedAnswer::Single(opt) => opt.label().to_string(),
            MatchedAnswer::Multi(opts) => {
                let mut labels: Vec<&str> = opts.iter().map(|o| o.label()).collect();
                labels.sort_unstable();
                labels.join(",")
            }
        };
        joined.trim().to_lowercase()
    }
}

/// Outcome of reconciling both providers' answers for one question.
///
/// Constructed fresh per question and consumed once by the form-filling step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// The answer chosen for display and (on agreement) selection.
    pub final_answer: Option<MatchedAnswer>,
    /// OpenAI's matched answer, kept so disagreements can mark its picks too.
    pub openai: Option<MatchedAnswer>,
    /// Gemini's matched answer.
    pub gemini: Option<MatchedAnswer>,
    /// Whether both providers produced the same normalized answer.
    pub agree: bool,
}

impl Reconciliation {
    /// Combine both providers' raw answers for `question`.
    ///
    /// Non-choice questions skip matching entirely and prefer Gemini's raw
    /// answer. Choice questions match both answers onto the option list and
    /// compare the normalized forms; Gemini is the canonical source on
    /// agreement.
    pub fn reconcile(
        question: &Question,
        openai_raw: Option<&str>,
        gemini_raw: Option<&str>,
    ) -> Self {
        if question.options.is_empty() {
            let final_answer = gemini_raw
                .or(openai_raw)
                .map(|raw| MatchedAnswer::FreeText(raw.to_string()));
            return Self {
                final_answer,
                openai: None,
                gemini: None,
                agree: false,
            };
        }

        let multi = question.kind.is_multi();
        let openai = openai_raw.map(|raw| bind(question, raw, multi));
        let gemini = gemini_raw.map(|raw| bind(question, raw, multi));

        let normalize = |ans: &Option<MatchedAnswer>| {
            ans.as_ref().map(|a| a.normalized()).unwrap_or_default()
        };
        let agree = normalize(&openai) == normalize(&gemini) && openai.is_some();

        let final_answer = if agree {
            gemini.clone()
        } else {
            gemini.clone().or_else(|| openai.clone())
        };

        Self {
            final_answer,
            openai,
            gemini,
            agree,
        }
    }

    /// Target checked-state per on-screen option, in option order.
    ///
    /// On agreement only the final answer's options are selected; on
    /// disagreement every option either provider chose is selected, so the
    /// disagreement stays visible to the user.
    pub fn selection_targets(&self, question: &Question) -> Vec<bool> {
        let chosen: Vec<&str> = if self.agree && self.final_answer.is_some() {
            self.final_answer
                .as_ref()
                .map(|a| a.labels())
                .unwrap_or_default()
        } else {
            let mut union = Vec::new();
            for answer in [&self.openai, &self.gemini].into_iter().flatten() {
                union.extend(answer.labels());
            }
            union
        };

        question
            .options
            .iter()
            .map(|opt| chosen.contains(&opt.label()))
            .collect()
    }

    /// Text shown in the per-question answer annotation; `None` when there is
    /// nothing to show.
    pub fn display_text(&self) -> Option<String> {
        let text = self.final_answer.as_ref()?.display_text();
        if text.is_empty() { None } else { Some(text) }
    }
}

/// Bind a raw answer to the declared options, preserving any option image.
fn bind(question: &Question, raw: &str, multi: bool) -> MatchedAnswer {
    let labels = question.option_labels();
    if multi {
        let matched = matcher::match_multi(raw, &labels)
            .into_iter()
            .map(|label| {
                question
                    .option_by_label(&label)
                    .cloned()
                    .unwrap_or(AnswerOption::Plain(label))
            })
            .collect();
        MatchedAnswer::Multi(matched)
    } else {
        let label = matcher::match_one(raw, &labels);
        match question.option_by_label(&label) {
            Some(opt) => MatchedAnswer::Single(opt.clone()),
            None => MatchedAnswer::FreeText(label),
        }
    }
}
