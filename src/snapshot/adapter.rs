use super::{SelectorSpec, SnapshotPage};
use crate::{utils, AdapterError, AnswerOutcome, ExtractionRecord, PageAdapter};
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Map, Value};
use tracing::debug;

fn parse_selector(selector: &str) -> Result<Selector, AdapterError> {
    Selector::parse(selector).map_err(|e| AdapterError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

fn parse_optional(selector: Option<&String>) -> Result<Option<Selector>, AdapterError> {
    selector.map(|s| parse_selector(s)).transpose()
}

fn text_of(el: ElementRef<'_>) -> String {
    utils::clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(text_of)
        .filter(|s| !s.is_empty())
}

#[derive(Debug)]
struct Selectors {
    question: Selector,
    passage: Option<Selector>,
    choices: Option<Selector>,
    progress: Option<Selector>,
    correct: Option<Selector>,
    incorrect: Option<Selector>,
}

#[derive(Debug)]
pub struct SnapshotAdapter {
    pages: Vec<SnapshotPage>,
    selectors: Selectors,
    labels: Map<String, Value>,
    cursor: usize,
}

impl SnapshotAdapter {
    pub fn new(pages: Vec<SnapshotPage>, spec: &SelectorSpec) -> Result<Self, AdapterError> {
        let selectors = Selectors {
            question: parse_selector(&spec.question)?,
            passage: parse_optional(spec.passage.as_ref())?,
            choices: parse_optional(spec.choices.as_ref())?,
            progress: parse_optional(spec.progress.as_ref())?,
            correct: parse_optional(spec.correct_marker.as_ref())?,
            incorrect: parse_optional(spec.incorrect_marker.as_ref())?,
        };
        Ok(SnapshotAdapter {
            pages,
            selectors,
            labels: Map::new(),
            cursor: 0,
        })
    }

    /// Adds a fixed field (section, category, source) to every record.
    pub fn with_label<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.labels.insert(key.into(), Value::String(value.into()));
        self
    }

    fn current(&self) -> Option<&SnapshotPage> {
        self.pages.get(self.cursor)
    }

    fn read_question(&self, page: &SnapshotPage) -> Option<ExtractionRecord> {
        let doc = Html::parse_document(&page.html);

        let Some(question) = first_text(&doc, &self.selectors.question) else {
            debug!("No question text on {}", page.link);
            return None;
        };

        let mut content = Map::new();
        if let Some(passage) = self
            .selectors
            .passage
            .as_ref()
            .and_then(|s| first_text(&doc, s))
        {
            content.insert("passage".to_string(), Value::String(passage));
        }
        content.insert("questionText".to_string(), Value::String(question));

        if let Some(selector) = self.selectors.choices.as_ref() {
            let mut choices: Vec<String> = doc
                .select(selector)
                .map(text_of)
                .filter(|s| !s.is_empty())
                .collect();
            choices.dedup();
            content.insert("answerChoices".to_string(), json!(choices));
        }

        let mut fields = Map::new();
        fields.insert("questionLink".to_string(), Value::String(page.link.clone()));
        fields.extend(self.labels.clone());
        fields.insert("content".to_string(), Value::Object(content));
        Some(ExtractionRecord::new(fields))
    }

    fn read_progress(&self, page: &SnapshotPage) -> Option<(u32, u32)> {
        let selector = self.selectors.progress.as_ref()?;
        let doc = Html::parse_document(&page.html);
        let text = first_text(&doc, selector)?;
        utils::parse_progress(&text)
    }

    fn read_outcome(&self, page: &SnapshotPage) -> AnswerOutcome {
        let doc = Html::parse_document(&page.html);
        let matches = |selector: Option<&Selector>| {
            selector.map_or(false, |s| doc.select(s).next().is_some())
        };

        if matches(self.selectors.correct.as_ref()) {
            AnswerOutcome::Correct
        } else if matches(self.selectors.incorrect.as_ref()) {
            AnswerOutcome::Incorrect
        } else {
            AnswerOutcome::Unknown
        }
    }
}

#[async_trait::async_trait]
impl PageAdapter for SnapshotAdapter {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn extract_current(&mut self) -> Result<Option<ExtractionRecord>, AdapterError> {
        Ok(self.current().and_then(|page| self.read_question(page)))
    }

    async fn advance(&mut self) -> Result<bool, AdapterError> {
        if self.cursor + 1 < self.pages.len() {
            self.cursor += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn is_complete(&self) -> Result<bool, AdapterError> {
        let progress = self.current().and_then(|page| self.read_progress(page));
        debug!("Progress: {:?}", progress);
        Ok(matches!(progress, Some((current, total)) if current == total))
    }

    async fn item_identity(&self) -> Option<String> {
        self.current().map(|page| page.link.clone())
    }

    async fn answer_outcome(&self) -> AnswerOutcome {
        self.current()
            .map(|page| self.read_outcome(page))
            .unwrap_or_default()
    }
}
