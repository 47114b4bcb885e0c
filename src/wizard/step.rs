// src/wizard/step.rs
use serde::{Deserialize, Serialize};

use crate::types::section::SectionKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// A wizard position and the section it governs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub id: u32,
    pub title: String,
    pub key_name: SectionKey,
    status: StepStatus,
}

impl Step {
    pub fn new(key_name: SectionKey) -> Self {
        Self {
            id: key_name.position(),
            title: key_name.name().to_string(),
            key_name,
            status: StepStatus::NotStarted,
        }
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn completed(&self) -> bool {
        self.status == StepStatus::Completed
    }

    pub(crate) fn set_status(&mut self, status: StepStatus) {
        self.status = status;
    }

    pub fn view(&self) -> StepView {
        StepView {
            id: self.id,
            title: self.title.clone(),
            completed: self.completed(),
            key_name: self.key_name,
            status: self.status,
        }
    }
}

/// Serializable snapshot of a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub id: u32,
    pub title: String,
    pub completed: bool,
    pub key_name: SectionKey,
    pub status: StepStatus,
}

/// The 13 wizard steps in order.
pub fn default_steps() -> Vec<Step> {
    SectionKey::ALL.iter().copied().map(Step::new).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSteps {
    pub total: usize,
    pub progress_percentage: u8,
}

impl CompletedSteps {
    pub fn from_steps(steps: &[Step]) -> Self {
        let total = steps.iter().filter(|s| s.completed()).count();
        let progress_percentage = if steps.is_empty() {
            0
        } else {
            (100.0 * total as f64 / steps.len() as f64).round() as u8
        };
        Self {
            total,
            progress_percentage,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress_percentage >= 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps_with_completed(count: usize) -> Vec<Step> {
        let mut steps = default_steps();
        for step in steps.iter_mut().take(count) {
            step.set_status(StepStatus::Completed);
        }
        steps
    }

    #[test]
    fn test_default_steps_are_ordered() {
        let steps = default_steps();
        assert_eq!(steps.len(), 13);
        assert_eq!(steps[0].id, 1);
        assert_eq!(steps[0].title, "Personal Information");
        assert_eq!(steps[12].key_name, SectionKey::Languages);
        assert!(steps.iter().all(|s| s.status() == StepStatus::NotStarted));
    }

    #[test]
    fn test_progress_percentage_rounds() {
        let progress = CompletedSteps::from_steps(&steps_with_completed(4));
        assert_eq!(progress.total, 4);
        assert_eq!(progress.progress_percentage, 31);
    }

    #[test]
    fn test_progress_bounds() {
        assert_eq!(
            CompletedSteps::from_steps(&steps_with_completed(0)).progress_percentage,
            0
        );
        let full = CompletedSteps::from_steps(&steps_with_completed(13));
        assert_eq!(full.progress_percentage, 100);
        assert!(full.is_complete());
        assert!(!CompletedSteps::from_steps(&steps_with_completed(12)).is_complete());
    }

    #[test]
    fn test_step_view_serializes_camel_case() {
        let view = Step::new(SectionKey::Education).view();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["keyName"], "Education");
        assert_eq!(json["completed"], false);
        assert_eq!(json["status"], "not_started");
    }
}
