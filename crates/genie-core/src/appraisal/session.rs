//! Caller-owned state for one seller working through an appraisal.
//!
//! The flow is a fixed sequence of steps:
//!
//! ```text
//! Search → Specs → Condition → Photo → Result
//!    ▲                                    │
//!    └──────────────── reset ─────────────┘
//! ```
//!
//! The session holds no provider handles; the caller asks the `Appraiser`
//! for suggestions/specs/results and feeds the answers in. History lives
//! only as long as the session value does.

use super::types::{AppraisalRecord, AppraisalRequest, Condition};
use crate::error::SessionError;
use crate::llm::ImageInput;
use std::collections::BTreeMap;

/// Where the seller is in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Search,
    Specs,
    Condition,
    Photo,
    Result,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Search => "search",
            Step::Specs => "specs",
            Step::Condition => "condition",
            Step::Photo => "photo",
            Step::Result => "result",
        }
    }
}

/// State for one appraisal in progress plus the append-only history of
/// finished ones.
#[derive(Debug, Clone)]
pub struct AppraisalSession {
    step: Step,
    selected_item: Option<String>,
    spec_options: BTreeMap<String, Vec<String>>,
    user_specs: BTreeMap<String, String>,
    condition: Option<Condition>,
    photo: Option<ImageInput>,
    history: Vec<AppraisalRecord>,
}

impl Default for AppraisalSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AppraisalSession {
    pub fn new() -> Self {
        Self {
            step: Step::Search,
            selected_item: None,
            spec_options: BTreeMap::new(),
            user_specs: BTreeMap::new(),
            condition: None,
            photo: None,
            history: Vec::new(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn selected_item(&self) -> Option<&str> {
        self.selected_item.as_deref()
    }

    pub fn spec_options(&self) -> &BTreeMap<String, Vec<String>> {
        &self.spec_options
    }

    pub fn user_specs(&self) -> &BTreeMap<String, String> {
        &self.user_specs
    }

    pub fn condition(&self) -> Option<Condition> {
        self.condition
    }

    /// Finished appraisals, oldest first.
    pub fn history(&self) -> &[AppraisalRecord] {
        &self.history
    }

    fn require_step(&self, operation: &'static str, expected: Step) -> Result<(), SessionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(SessionError::WrongStep {
                operation,
                expected: expected.name(),
                actual: self.step.name(),
            })
        }
    }

    /// Pick the item (a suggestion or the seller's own wording). Search → Specs.
    pub fn select_item(&mut self, item: impl Into<String>) -> Result<(), SessionError> {
        self.require_step("select_item", Step::Search)?;
        self.selected_item = Some(item.into());
        self.step = Step::Specs;
        Ok(())
    }

    /// Record the attributes and options offered for the selected item.
    pub fn set_spec_options(
        &mut self,
        options: BTreeMap<String, Vec<String>>,
    ) -> Result<(), SessionError> {
        self.require_step("set_spec_options", Step::Specs)?;
        self.spec_options = options
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .collect();
        self.user_specs.clear();
        Ok(())
    }

    /// Choose one option for one attribute.
    pub fn choose_spec(&mut self, attribute: &str, value: &str) -> Result<(), SessionError> {
        self.require_step("choose_spec", Step::Specs)?;
        let options = self
            .spec_options
            .get(attribute)
            .ok_or_else(|| SessionError::UnknownAttribute(attribute.to_string()))?;
        if !options.iter().any(|o| o == value) {
            return Err(SessionError::InvalidOption {
                attribute: attribute.to_string(),
                value: value.to_string(),
            });
        }
        self.user_specs
            .insert(attribute.to_string(), value.to_string());
        Ok(())
    }

    /// Finish the specs step. Attributes left unchosen take their first option. Specs → Condition.
    pub fn confirm_specs(&mut self) -> Result<(), SessionError> {
        self.require_step("confirm_specs", Step::Specs)?;
        for (attribute, options) in &self.spec_options {
            if let Some(first) = options.first() {
                self.user_specs
                    .entry(attribute.clone())
                    .or_insert_with(|| first.clone());
            }
        }
        self.step = Step::Condition;
        Ok(())
    }

    /// Condition → Photo.
    pub fn set_condition(&mut self, condition: Condition) -> Result<(), SessionError> {
        self.require_step("set_condition", Step::Condition)?;
        self.condition = Some(condition);
        self.step = Step::Photo;
        Ok(())
    }

    /// Attach (or replace) the photo.
    pub fn attach_photo(&mut self, photo: ImageInput) -> Result<(), SessionError> {
        self.require_step("attach_photo", Step::Photo)?;
        self.photo = Some(photo);
        Ok(())
    }

    /// Freeze everything gathered so far into a request.
    pub fn build_request(&self) -> Result<AppraisalRequest, SessionError> {
        self.require_step("build_request", Step::Photo)?;
        // Reaching Photo implies an item was selected.
        let item = self.selected_item.clone().unwrap_or_default();
        let mut request = AppraisalRequest::new(item).with_specs(self.user_specs.clone());
        if let Some(condition) = self.condition {
            request = request.with_condition(condition);
        }
        if let Some(photo) = &self.photo {
            request = request.with_photo(photo.clone());
        }
        Ok(request)
    }

    /// Append a finished appraisal to history. Photo → Result.
    pub fn record_result(&mut self, record: AppraisalRecord) -> Result<(), SessionError> {
        self.require_step("record_result", Step::Photo)?;
        self.history.push(record);
        self.step = Step::Result;
        Ok(())
    }

    /// Start a new appraisal from any step. History is kept.
    pub fn reset(&mut self) {
        self.step = Step::Search;
        self.selected_item = None;
        self.spec_options.clear();
        self.user_specs.clear();
        self.condition = None;
        self.photo = None;
    }
}
