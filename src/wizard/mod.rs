// src/wizard/mod.rs
pub mod context;
pub mod controller;
pub mod form;
pub mod notification;
pub mod step;
pub mod validation;

pub use context::{CvOwner, GenerationHandle, GenerationOutcome, WizardContext};
pub use controller::{
    DefaultValues, GenerationKind, GenerationTicket, WizardController, WizardSnapshot,
};
pub use form::{FieldFocus, FocusRecorder, SectionForm, SubmitOutcome};
pub use notification::{Notification, NotificationLevel};
pub use step::{CompletedSteps, Step, StepStatus, StepView};
pub use validation::{validate_section, FieldError, FieldPath, ValidationErrors};
