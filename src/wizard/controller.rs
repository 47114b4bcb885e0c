// src/wizard/controller.rs
//! Wizard state controller: step navigation, completion tracking, data
//! aggregation and the document generation request lifecycle

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app_log;
use crate::error::WizardError;
use crate::types::cv_data::{apply_personal_derivations, AggregatedCvData, SectionValue};
use crate::types::section::SectionKey;
use crate::wizard::notification::Notification;
use crate::wizard::step::{default_steps, CompletedSteps, Step, StepStatus, StepView};
use crate::wizard::validation::{validate_section, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    /// Finalized submission (`isBase64Request`).
    Final,
    /// Draft save (`isSavingDraft`).
    Draft,
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationKind::Final => f.write_str("final"),
            GenerationKind::Draft => f.write_str("draft"),
        }
    }
}

/// Identifies one generation request; a finish carrying a stale id is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTicket {
    pub id: u64,
    pub kind: GenerationKind,
}

/// Supplies the values a section form is seeded with.
pub trait DefaultValues {
    fn default_values(&self, key: SectionKey) -> Option<SectionValue>;
}

impl DefaultValues for AggregatedCvData {
    fn default_values(&self, key: SectionKey) -> Option<SectionValue> {
        self.get(key).cloned()
    }
}

#[derive(Debug, Clone)]
pub struct WizardController {
    steps: Vec<Step>,
    current_step: u32,
    data: AggregatedCvData,
    submit_requested: bool,
    last_submit_failure: Option<ValidationErrors>,
    generation: Option<GenerationTicket>,
    next_generation_id: u64,
    preview_open: bool,
    scroll_target: Option<u32>,
    notifications: Vec<Notification>,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    pub fn new() -> Self {
        Self {
            steps: default_steps(),
            current_step: 1,
            data: AggregatedCvData::new(),
            submit_requested: false,
            last_submit_failure: None,
            generation: None,
            next_generation_id: 1,
            preview_open: false,
            scroll_target: None,
            notifications: Vec::new(),
        }
    }

    /// Starts a wizard pre-populated from an uploaded CV or a saved draft.
    pub fn with_data(data: AggregatedCvData) -> Self {
        let mut wizard = Self::new();
        wizard.load(data);
        wizard
    }

    /// Replaces the aggregate wholesale and recomputes every step's status
    /// from the validity of its section.
    pub fn load(&mut self, mut data: AggregatedCvData) {
        if let Some(SectionValue::Single(record)) = data.get(SectionKey::PersonalInformation) {
            let mut record = record.clone();
            apply_personal_derivations(&mut record);
            data.set(SectionKey::PersonalInformation, SectionValue::Single(record));
        }

        for step in &mut self.steps {
            let status = match data.get(step.key_name) {
                Some(value) if !value.is_empty() => {
                    if validate_section(step.key_name, value).is_ok() {
                        StepStatus::Completed
                    } else {
                        StepStatus::InProgress
                    }
                }
                _ => StepStatus::NotStarted,
            };
            step.set_status(status);
        }

        self.data = data;
        self.current_step = 1;
        self.submit_requested = false;
        self.last_submit_failure = None;
        self.scroll_target = None;

        let progress = self.completed_steps();
        app_log!(
            info,
            "Loaded CV data, completed steps: {}, progress: {}%",
            progress.total,
            progress.progress_percentage
        );
    }

    // ===== Accessors =====

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, key: SectionKey) -> Option<&Step> {
        self.steps.iter().find(|s| s.key_name == key)
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn current_section(&self) -> SectionKey {
        self.steps
            .get(self.current_step as usize - 1)
            .map(|s| s.key_name)
            .unwrap_or(SectionKey::PersonalInformation)
    }

    pub fn total_steps(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == self.total_steps()
    }

    pub fn data(&self) -> &AggregatedCvData {
        &self.data
    }

    pub fn submit_requested(&self) -> bool {
        self.submit_requested
    }

    pub fn last_submit_failure(&self) -> Option<&ValidationErrors> {
        self.last_submit_failure.as_ref()
    }

    pub fn preview_open(&self) -> bool {
        self.preview_open
    }

    /// Step indicator that should be scrolled into view after the last advance.
    pub fn scroll_target(&self) -> Option<u32> {
        self.scroll_target
    }

    pub fn generation(&self) -> Option<GenerationTicket> {
        self.generation
    }

    pub fn is_base64_request(&self) -> bool {
        matches!(self.generation, Some(t) if t.kind == GenerationKind::Final)
    }

    pub fn is_saving_draft(&self) -> bool {
        matches!(self.generation, Some(t) if t.kind == GenerationKind::Draft)
    }

    pub fn completed_steps(&self) -> CompletedSteps {
        CompletedSteps::from_steps(&self.steps)
    }

    // ===== Navigation =====

    /// Merges a validated section into the aggregate and marks its step
    /// completed; moves forward unless this is a draft save or the last step.
    pub fn advance(&mut self, section_data: SectionValue, key_name: SectionKey, is_draft_save: bool) {
        let value = Self::transform_for_section(key_name, section_data);
        self.data.set(key_name, value);

        if let Some(step) = self.steps.iter_mut().find(|s| s.key_name == key_name) {
            step.set_status(StepStatus::Completed);
        }

        self.submit_requested = false;
        self.last_submit_failure = None;

        if !is_draft_save && !self.is_last_step() {
            self.current_step += 1;
            self.scroll_target = Some(self.current_step);
        }

        app_log!(
            debug,
            "Advanced from section {}, current step: {}, draft: {}",
            key_name,
            self.current_step,
            is_draft_save
        );
    }

    /// Raises the flag the active section form answers with a validated submit.
    pub fn request_validation_and_submit(&mut self) {
        self.submit_requested = true;
    }

    /// Explicit failure path of the submit handshake: stays on the step.
    pub fn report_submit_failure(&mut self, errors: ValidationErrors) {
        app_log!(
            debug,
            "Submit rejected on step {}: {} invalid field(s)",
            self.current_step,
            errors.len()
        );
        self.submit_requested = false;
        self.last_submit_failure = Some(errors);
    }

    pub fn retreat(&mut self) {
        if self.current_step > 1 {
            self.current_step -= 1;
        }
    }

    /// Moves forward without validating or persisting the current section.
    pub fn skip(&mut self) {
        if !self.is_last_step() {
            self.current_step += 1;
        }
    }

    pub fn jump_to_step(&mut self, step_id: u32) -> Result<(), WizardError> {
        if step_id == 0 || step_id > self.total_steps() {
            return Err(WizardError::UnknownStep(step_id));
        }
        self.current_step = step_id;
        self.submit_requested = false;
        if self.generation.is_none() {
            self.preview_open = false;
        }
        Ok(())
    }

    /// Live aggregation from the active form. A change to a completed
    /// section puts it back in progress.
    pub fn on_section_change(&mut self, key: SectionKey, value: SectionValue) {
        let value = Self::transform_for_section(key, value);
        if self.data.get(key) == Some(&value) {
            return;
        }
        self.data.set(key, value);

        if let Some(step) = self.steps.iter_mut().find(|s| s.key_name == key) {
            if step.status() != StepStatus::InProgress {
                app_log!(trace, "Section {} edited, status -> in progress", key);
            }
            step.set_status(StepStatus::InProgress);
        }
    }

    fn transform_for_section(key: SectionKey, value: SectionValue) -> SectionValue {
        match (key, value.shaped_for(key)) {
            (SectionKey::PersonalInformation, SectionValue::Single(mut record)) => {
                apply_personal_derivations(&mut record);
                SectionValue::Single(record)
            }
            (_, value) => value,
        }
    }

    // ===== Document Generation Requests =====

    /// Opens the preview and raises a final generation request. Progress is
    /// not checked here; see [`WizardController::try_complete`].
    pub fn complete(&mut self) -> Result<GenerationTicket, WizardError> {
        self.begin_generation(GenerationKind::Final)
    }

    /// Completion gate: refuses while any step is incomplete.
    pub fn try_complete(&mut self) -> Result<GenerationTicket, WizardError> {
        let progress = self.completed_steps();
        if !progress.is_complete() {
            let incomplete = self
                .steps
                .iter()
                .filter(|s| !s.completed())
                .map(|s| s.title.clone())
                .collect();
            return Err(WizardError::Incomplete {
                progress: progress.progress_percentage,
                incomplete,
            });
        }
        self.complete()
    }

    pub fn save_draft(&mut self) -> Result<GenerationTicket, WizardError> {
        self.begin_generation(GenerationKind::Draft)
    }

    fn begin_generation(&mut self, kind: GenerationKind) -> Result<GenerationTicket, WizardError> {
        if let Some(active) = self.generation {
            return Err(WizardError::GenerationInFlight {
                active: active.kind,
            });
        }
        let ticket = GenerationTicket {
            id: self.next_generation_id,
            kind,
        };
        self.next_generation_id += 1;
        self.generation = Some(ticket);
        self.preview_open = true;
        app_log!(info, "Started {} generation #{}", kind, ticket.id);
        Ok(ticket)
    }

    /// Clears the request flags and closes the preview surface.
    pub fn cancel_generation(&mut self) -> Result<GenerationTicket, WizardError> {
        let ticket = self
            .generation
            .take()
            .ok_or(WizardError::NoGenerationInFlight)?;
        self.preview_open = false;
        app_log!(info, "Cancelled {} generation #{}", ticket.kind, ticket.id);
        Ok(ticket)
    }

    /// Ends a generation on any outcome. Returns false when the ticket was
    /// superseded (cancelled, or replaced by a newer request).
    pub fn finish_generation(&mut self, ticket_id: u64, notification: Notification) -> bool {
        match self.generation {
            Some(active) if active.id == ticket_id => {
                self.generation = None;
                self.notifications.push(notification);
                true
            }
            _ => {
                app_log!(
                    debug,
                    "Ignoring finish of superseded generation #{}",
                    ticket_id
                );
                false
            }
        }
    }

    pub fn open_preview(&mut self) {
        self.preview_open = true;
    }

    pub fn close_preview(&mut self) {
        if self.generation.is_none() {
            self.preview_open = false;
        }
    }

    // ===== Notifications =====

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            steps: self.steps.iter().map(Step::view).collect(),
            current_step: self.current_step,
            current_section: self.current_section(),
            completed_steps: self.completed_steps(),
            submit_requested: self.submit_requested,
            is_base64_request: self.is_base64_request(),
            is_saving_draft: self.is_saving_draft(),
            preview_open: self.preview_open,
            scroll_target: self.scroll_target,
            last_submit_failure: self.last_submit_failure.clone(),
        }
    }
}

impl DefaultValues for WizardController {
    fn default_values(&self, key: SectionKey) -> Option<SectionValue> {
        self.data.default_values(key)
    }
}

/// Serializable view of the wizard state for the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub steps: Vec<StepView>,
    pub current_step: u32,
    pub current_section: SectionKey,
    pub completed_steps: CompletedSteps,
    pub submit_requested: bool,
    pub is_base64_request: bool,
    pub is_saving_draft: bool,
    pub preview_open: bool,
    pub scroll_target: Option<u32>,
    pub last_submit_failure: Option<ValidationErrors>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cv_data::Record;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn personal_information() -> SectionValue {
        SectionValue::Single(record(json!({
            "First Name": "Jane",
            "Middle Name": "",
            "Last Name": "Doe",
            "Degree Title": ["MD", "MPH"],
            "Email": "jane.doe@example.org",
            "Primary Specialty": "Internal Medicine"
        })))
    }

    fn language() -> SectionValue {
        SectionValue::Repeated(vec![record(json!({
            "Language": "Spanish",
            "Proficiency": "Fluent"
        }))])
    }

    fn completed_wizard() -> WizardController {
        let mut wizard = WizardController::new();
        for key in SectionKey::ALL {
            let mut value = SectionValue::template(key);
            if key == SectionKey::PersonalInformation {
                value = personal_information();
            }
            wizard.advance(value, key, true);
        }
        wizard
    }

    #[test]
    fn test_next_on_first_step_advances_and_derives() {
        let mut wizard = WizardController::new();
        wizard.request_validation_and_submit();
        wizard.advance(personal_information(), SectionKey::PersonalInformation, false);

        assert_eq!(wizard.current_step(), 2);
        assert_eq!(wizard.scroll_target(), Some(2));
        assert!(wizard.steps()[0].completed());
        assert!(!wizard.submit_requested());

        let info = wizard.data().personal_information().unwrap();
        assert_eq!(info["Credentials"], "MD, MPH");
        assert_eq!(info["Full Name"], "Jane Doe");
        assert_eq!(info["Email"], "jane.doe@example.org");
    }

    #[test]
    fn test_draft_save_does_not_move() {
        let mut wizard = WizardController::new();
        wizard.advance(personal_information(), SectionKey::PersonalInformation, true);
        assert_eq!(wizard.current_step(), 1);
        assert!(wizard.steps()[0].completed());
    }

    #[test]
    fn test_advance_on_last_step_stays() {
        let mut wizard = WizardController::new();
        wizard.jump_to_step(13).unwrap();
        wizard.advance(language(), SectionKey::Languages, false);
        assert_eq!(wizard.current_step(), 13);
        assert!(wizard.step(SectionKey::Languages).unwrap().completed());
    }

    #[test]
    fn test_retreat_is_noop_on_first_step() {
        let mut wizard = WizardController::new();
        wizard.retreat();
        assert_eq!(wizard.current_step(), 1);
        wizard.skip();
        wizard.retreat();
        assert_eq!(wizard.current_step(), 1);
    }

    #[test]
    fn test_skip_leaves_steps_and_data_untouched() {
        let mut wizard = WizardController::new();
        wizard.advance(personal_information(), SectionKey::PersonalInformation, true);
        let steps_before = wizard.steps().to_vec();
        let data_before = wizard.data().clone();

        wizard.skip();

        assert_eq!(wizard.current_step(), 2);
        assert_eq!(wizard.steps(), steps_before.as_slice());
        assert_eq!(wizard.data(), &data_before);
    }

    #[test]
    fn test_skip_on_last_step_is_noop() {
        let mut wizard = WizardController::new();
        wizard.jump_to_step(13).unwrap();
        wizard.skip();
        assert_eq!(wizard.current_step(), 13);
    }

    #[test]
    fn test_jump_to_step_bounds() {
        let mut wizard = WizardController::new();
        assert!(wizard.jump_to_step(7).is_ok());
        assert_eq!(wizard.current_section(), SectionKey::HospitalAffiliations);
        assert_eq!(wizard.jump_to_step(0), Err(WizardError::UnknownStep(0)));
        assert_eq!(wizard.jump_to_step(14), Err(WizardError::UnknownStep(14)));
        assert_eq!(wizard.current_step(), 7);
    }

    #[test]
    fn test_edit_clears_completion() {
        let mut wizard = WizardController::new();
        wizard.advance(language(), SectionKey::Languages, true);
        assert!(wizard.step(SectionKey::Languages).unwrap().completed());

        let mut edited = language().into_records();
        edited[0].insert("Proficiency".to_string(), json!("Native"));
        wizard.on_section_change(SectionKey::Languages, SectionValue::Repeated(edited));

        let step = wizard.step(SectionKey::Languages).unwrap();
        assert!(!step.completed());
        assert_eq!(step.status(), StepStatus::InProgress);
        assert_eq!(
            wizard.data().records(SectionKey::Languages)[0]["Proficiency"],
            "Native"
        );
    }

    #[test]
    fn test_unchanged_values_keep_completion() {
        let mut wizard = WizardController::new();
        wizard.advance(personal_information(), SectionKey::PersonalInformation, true);
        wizard.on_section_change(SectionKey::PersonalInformation, personal_information());
        assert!(wizard.steps()[0].completed());
    }

    #[test]
    fn test_complete_blocked_below_full_progress() {
        let mut wizard = WizardController::new();
        wizard.advance(personal_information(), SectionKey::PersonalInformation, false);
        wizard.jump_to_step(13).unwrap();

        let err = wizard.try_complete().unwrap_err();
        match &err {
            WizardError::Incomplete { progress, incomplete } => {
                assert_eq!(*progress, 8);
                assert_eq!(incomplete.len(), 12);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("Education"));
        assert!(!wizard.is_base64_request());
        assert!(!wizard.preview_open());
    }

    #[test]
    fn test_complete_when_all_steps_done() {
        let mut wizard = completed_wizard();
        assert_eq!(wizard.completed_steps().progress_percentage, 100);
        let ticket = wizard.try_complete().unwrap();
        assert_eq!(ticket.kind, GenerationKind::Final);
        assert!(wizard.is_base64_request());
        assert!(!wizard.is_saving_draft());
        assert!(wizard.preview_open());
    }

    #[test]
    fn test_generation_requests_are_exclusive() {
        let mut wizard = WizardController::new();
        let draft = wizard.save_draft().unwrap();
        assert!(wizard.is_saving_draft());
        assert_eq!(
            wizard.complete(),
            Err(WizardError::GenerationInFlight {
                active: GenerationKind::Draft
            })
        );
        assert!(!wizard.is_base64_request());

        assert!(wizard.finish_generation(draft.id, Notification::success("Draft saved")));
        assert!(!wizard.is_saving_draft());
        assert!(wizard.complete().is_ok());
    }

    #[test]
    fn test_stale_finish_does_not_clear_newer_request() {
        let mut wizard = WizardController::new();
        let first = wizard.save_draft().unwrap();
        wizard.cancel_generation().unwrap();
        assert!(!wizard.preview_open());

        let second = wizard.save_draft().unwrap();
        assert_ne!(first.id, second.id);
        assert!(!wizard.finish_generation(first.id, Notification::success("late")));
        assert!(wizard.is_saving_draft());
        assert!(wizard.take_notifications().is_empty());
    }

    #[test]
    fn test_cancel_without_request() {
        let mut wizard = WizardController::new();
        assert_eq!(
            wizard.cancel_generation(),
            Err(WizardError::NoGenerationInFlight)
        );
    }

    #[test]
    fn test_load_recomputes_statuses() {
        let mut data = AggregatedCvData::new();
        data.set(SectionKey::PersonalInformation, personal_information());
        data.set(SectionKey::Languages, language());
        data.set(
            SectionKey::Education,
            SectionValue::Repeated(vec![record(json!({ "Institution": "Yale" }))]),
        );

        let wizard = WizardController::with_data(data);
        assert!(wizard.steps()[0].completed());
        assert_eq!(
            wizard.step(SectionKey::Education).unwrap().status(),
            StepStatus::InProgress
        );
        assert_eq!(
            wizard.step(SectionKey::Publications).unwrap().status(),
            StepStatus::NotStarted
        );
        assert!(wizard.step(SectionKey::Languages).unwrap().completed());
        assert_eq!(wizard.completed_steps().total, 2);
        assert_eq!(
            wizard.data().personal_information().unwrap()["Full Name"],
            "Jane Doe"
        );
    }

    #[test]
    fn test_report_submit_failure_stays_on_step() {
        let mut wizard = WizardController::new();
        wizard.request_validation_and_submit();
        let errors = crate::wizard::validation::validate_section(
            SectionKey::PersonalInformation,
            &SectionValue::template(SectionKey::PersonalInformation),
        )
        .unwrap_err();
        wizard.report_submit_failure(errors);

        assert_eq!(wizard.current_step(), 1);
        assert!(!wizard.submit_requested());
        assert!(wizard.last_submit_failure().is_some());
    }
}
