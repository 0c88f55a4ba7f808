use crate::dates;
use crate::team::TeamMember;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WEEKS_PER_SPRINT: u32 = 2;
pub const MAX_WEEKS_PER_SPRINT: u32 = 52;

/// What allocation does with a task that already names a sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreassignedSprintPolicy {
    /// Clear the existing sprint hint (logged) and allocate the task afresh.
    #[default]
    Reset,
    /// Leave the task where it is; it takes no part in this run's allocation.
    Keep,
}

/// Scheduling parameters persisted next to the plan blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulingParams {
    pub weeks_per_sprint: u32,
    pub team_members: Vec<TeamMember>,
    pub required_specialties: Vec<String>,
    #[serde(with = "dates::flexible")]
    pub sprint_start_date: NaiveDate,
    pub preassigned_sprint_policy: PreassignedSprintPolicy,
}

impl Default for SchedulingParams {
    fn default() -> Self {
        Self {
            weeks_per_sprint: DEFAULT_WEEKS_PER_SPRINT,
            team_members: Vec::new(),
            required_specialties: Vec::new(),
            sprint_start_date: dates::today(),
            preassigned_sprint_policy: PreassignedSprintPolicy::default(),
        }
    }
}

impl SchedulingParams {
    pub fn new(weeks_per_sprint: u32, sprint_start_date: NaiveDate) -> Self {
        Self {
            weeks_per_sprint,
            sprint_start_date,
            ..Self::default()
        }
    }

    pub fn with_member(mut self, member: TeamMember) -> Self {
        self.team_members.push(member);
        self
    }

    pub fn sprint_length_days(&self) -> i64 {
        i64::from(self.weeks_per_sprint.max(1)) * 7
    }

    /// Specialties required by the plan but absent from the roster.
    pub fn uncovered_specialties(&self) -> Vec<&str> {
        self.required_specialties
            .iter()
            .filter(|required| {
                let wanted = crate::skill::Specialty::from_label(required);
                !self.team_members.iter().any(|m| m.specialty == wanted)
            })
            .map(String::as_str)
            .collect()
    }
}
