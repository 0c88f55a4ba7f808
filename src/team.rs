use crate::skill::{SkillPool, Specialty};
use serde::{Deserialize, Serialize};

/// A person available to the plan, with their per-sprint throughput.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    /// Identifier of the person; also what a task's fixed owner refers to.
    pub user_id: String,
    pub specialty: Specialty,
    /// Story points this person completes in one sprint. Must be non-negative.
    pub story_points_per_sprint: f64,
}

impl TeamMember {
    pub fn new(
        user_id: impl Into<String>,
        specialty: impl AsRef<str>,
        story_points_per_sprint: f64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            specialty: Specialty::from_label(specialty.as_ref()),
            story_points_per_sprint,
        }
    }

    pub fn serves(&self, pool: SkillPool) -> bool {
        self.specialty.serves(pool)
    }
}
