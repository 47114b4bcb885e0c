// src/wizard/form.rs
//! Shared section form contract. Every section is described by its field
//! specs, so one form controller serves all 13 of them and owns the
//! validate-then-submit handshake with the wizard.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app_log;
use crate::error::FormError;
use crate::types::cv_data::{empty_record, Record, SectionValue};
use crate::types::section::SectionKey;
use crate::wizard::controller::{DefaultValues, WizardController};
use crate::wizard::validation::{validate_section, FieldPath, ValidationErrors};

/// Brings an invalid field into view after a rejected submit.
pub trait FieldFocus {
    fn focus(&mut self, path: &FieldPath);
}

impl<F: FnMut(&FieldPath)> FieldFocus for F {
    fn focus(&mut self, path: &FieldPath) {
        self(path)
    }
}

/// Records the focused field, for callers that report it instead of scrolling.
#[derive(Debug, Default)]
pub struct FocusRecorder {
    pub focused: Vec<FieldPath>,
}

impl FieldFocus for FocusRecorder {
    fn focus(&mut self, path: &FieldPath) {
        self.focused.push(path.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Submitted { section: SectionKey, current_step: u32 },
    Rejected { errors: ValidationErrors, focus: FieldPath },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionForm {
    key: SectionKey,
    records: Vec<Record>,
}

impl SectionForm {
    /// Seeds the form from `defaults`, falling back to one empty record.
    pub fn mount<D: DefaultValues + ?Sized>(key: SectionKey, defaults: &D) -> Self {
        let records = defaults
            .default_values(key)
            .map(|v| v.shaped_for(key).into_records())
            .filter(|records| records.iter().any(|r| !r.is_empty()))
            .unwrap_or_else(|| SectionValue::template(key).into_records());

        Self { key, records }
    }

    pub fn key(&self) -> SectionKey {
        self.key
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Current (possibly invalid) values of the form.
    pub fn value(&self) -> SectionValue {
        if self.key.is_repeatable() {
            SectionValue::Repeated(self.records.clone())
        } else {
            SectionValue::Single(self.records.first().cloned().unwrap_or_default())
        }
    }

    pub fn set_field(
        &mut self,
        index: usize,
        field: &str,
        value: Value,
        wizard: &mut WizardController,
    ) -> Result<(), FormError> {
        if self.key.field(field).is_none() {
            return Err(FormError::UnknownField {
                section: self.key,
                field: field.to_string(),
            });
        }
        let record = self
            .records
            .get_mut(index)
            .ok_or(FormError::RecordOutOfRange {
                section: self.key,
                index,
            })?;
        record.insert(field.to_string(), value);
        self.changed(wizard);
        Ok(())
    }

    /// Replaces the whole form state, as reported by the client.
    pub fn replace(&mut self, value: SectionValue, wizard: &mut WizardController) {
        self.records = value.shaped_for(self.key).into_records();
        self.changed(wizard);
    }

    pub fn add_record(&mut self, wizard: &mut WizardController) -> Result<usize, FormError> {
        if !self.key.is_repeatable() {
            return Err(FormError::NotRepeatable(self.key));
        }
        self.records.push(empty_record(self.key));
        self.changed(wizard);
        Ok(self.records.len() - 1)
    }

    pub fn remove_record(
        &mut self,
        index: usize,
        wizard: &mut WizardController,
    ) -> Result<(), FormError> {
        if !self.key.is_repeatable() {
            return Err(FormError::NotRepeatable(self.key));
        }
        if index >= self.records.len() {
            return Err(FormError::RecordOutOfRange {
                section: self.key,
                index,
            });
        }
        self.records.remove(index);
        self.changed(wizard);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_section(self.key, &self.value())
    }

    /// Answers a raised submit request: on success the validated slice is
    /// handed to [`WizardController::advance`]; on failure the first invalid
    /// field is focused once and the failure reported. Returns `None` when no
    /// submit was requested.
    pub fn handle_submit_request(
        &mut self,
        wizard: &mut WizardController,
        focus: &mut dyn FieldFocus,
        is_draft_save: bool,
    ) -> Option<SubmitOutcome> {
        if !wizard.submit_requested() {
            return None;
        }
        Some(self.answer_submit(wizard, focus, is_draft_save))
    }

    /// Raises the submit request and answers it in one go.
    pub fn submit(
        &mut self,
        wizard: &mut WizardController,
        focus: &mut dyn FieldFocus,
        is_draft_save: bool,
    ) -> SubmitOutcome {
        wizard.request_validation_and_submit();
        self.answer_submit(wizard, focus, is_draft_save)
    }

    fn answer_submit(
        &mut self,
        wizard: &mut WizardController,
        focus: &mut dyn FieldFocus,
        is_draft_save: bool,
    ) -> SubmitOutcome {
        match self.validate() {
            Ok(()) => {
                wizard.advance(self.value(), self.key, is_draft_save);
                SubmitOutcome::Submitted {
                    section: self.key,
                    current_step: wizard.current_step(),
                }
            }
            Err(errors) => {
                // validate_section only fails with at least one error
                let first = errors.errors[0].path.clone();
                focus.focus(&first);
                wizard.report_submit_failure(errors.clone());
                SubmitOutcome::Rejected {
                    errors,
                    focus: first,
                }
            }
        }
    }

    fn changed(&self, wizard: &mut WizardController) {
        app_log!(trace, "Form change in section {}", self.key);
        wizard.on_section_change(self.key, self.value());
    }
}
