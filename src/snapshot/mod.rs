//! Page adapter over captured HTML pages.
//!
//! Walks a list of saved pages in order and reads each question through CSS
//! selectors supplied by the caller, so the same adapter serves any layout
//! whose structure can be described by a [`SelectorSpec`].

mod adapter;

pub use adapter::SnapshotAdapter;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPage {
    pub link: String,
    pub html: String,
}

impl SnapshotPage {
    pub fn new<L: Into<String>, H: Into<String>>(link: L, html: H) -> Self {
        SnapshotPage {
            link: link.into(),
            html: html.into(),
        }
    }
}

/// CSS selectors describing one page layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSpec {
    pub question: String,
    pub passage: Option<String>,
    pub choices: Option<String>,
    /// Element holding an "N of M" indicator.
    pub progress: Option<String>,
    pub correct_marker: Option<String>,
    pub incorrect_marker: Option<String>,
}

impl SelectorSpec {
    pub fn new<S: Into<String>>(question: S) -> Self {
        SelectorSpec {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn with_passage<S: Into<String>>(mut self, selector: S) -> Self {
        self.passage = Some(selector.into());
        self
    }

    pub fn with_choices<S: Into<String>>(mut self, selector: S) -> Self {
        self.choices = Some(selector.into());
        self
    }

    pub fn with_progress<S: Into<String>>(mut self, selector: S) -> Self {
        self.progress = Some(selector.into());
        self
    }

    pub fn with_answer_markers<C: Into<String>, I: Into<String>>(
        mut self,
        correct: C,
        incorrect: I,
    ) -> Self {
        self.correct_marker = Some(correct.into());
        self.incorrect_marker = Some(incorrect.into());
        self
    }
}
