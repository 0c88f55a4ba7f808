use crate::params::{MAX_WEEKS_PER_SPRINT, SchedulingParams};
use crate::plan::Epic;
use crate::team::TeamMember;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PlanValidationError {
    message: String,
}

impl PlanValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn validate_member(member: &TeamMember) -> Result<(), PlanValidationError> {
    if member.user_id.trim().is_empty() {
        return Err(PlanValidationError::new(
            "team member requires a non-empty user_id",
        ));
    }
    let capacity = member.story_points_per_sprint;
    if !capacity.is_finite() || capacity < 0.0 {
        return Err(PlanValidationError::new(format!(
            "team member '{}' has invalid story_points_per_sprint {} (must be a non-negative number)",
            member.user_id, capacity
        )));
    }
    Ok(())
}

pub fn validate_params(params: &SchedulingParams) -> Result<(), PlanValidationError> {
    if params.weeks_per_sprint == 0 || params.weeks_per_sprint > MAX_WEEKS_PER_SPRINT {
        return Err(PlanValidationError::new(format!(
            "weeks_per_sprint must be between 1 and {MAX_WEEKS_PER_SPRINT}, got {}",
            params.weeks_per_sprint
        )));
    }
    let mut seen = HashSet::with_capacity(params.team_members.len());
    for member in &params.team_members {
        validate_member(member)?;
        if !seen.insert(member.user_id.as_str()) {
            return Err(PlanValidationError::new(format!(
                "duplicate team member '{}'",
                member.user_id
            )));
        }
    }
    Ok(())
}

/// Keys must be unique across the whole tree; empty keys are allowed here
/// because they get generated before scheduling.
pub fn validate_epics(epics: &[Epic]) -> Result<(), PlanValidationError> {
    let keys = epics.iter().flat_map(|epic| {
        std::iter::once(("epic", epic.key.as_str())).chain(epic.stories.iter().flat_map(|story| {
            std::iter::once(("story", story.key.as_str()))
                .chain(story.tasks.iter().map(|task| ("task", task.key.as_str())))
        }))
    });
    let mut seen: HashSet<&str> = HashSet::new();
    for (kind, key) in keys {
        if !key.is_empty() && !seen.insert(key) {
            return Err(PlanValidationError::new(format!(
                "duplicate {kind} key '{key}'"
            )));
        }
    }
    Ok(())
}
