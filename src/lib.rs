pub mod calculations;
pub mod dates;
pub mod params;
pub mod persistence;
pub mod plan;
pub mod scheduler;
pub mod skill;
pub mod team;
pub mod validation;

pub use calculations::capacity::{CapacityArena, CapacityModel, MemberCapacity, SkillCapacity};
pub use calculations::milestones::{MilestoneConfig, MilestoneGrouper};
pub use calculations::rollup::{Rollup, rollup};
pub use calculations::sprint_allocation::{Allocation, AllocatorConfig, SprintAllocator};
pub use params::{PreassignedSprintPolicy, SchedulingParams};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqlitePlanStore;
pub use persistence::{
    PersistenceError, PlanDocument, PlanStore, load_plan_from_json, load_team_from_csv,
    plan_from_blob, plan_to_blob, save_assignments_to_csv, save_plan_to_json, validate_document,
};
pub use plan::{Epic, Milestone, MilestoneEpic, Plan, Sprint, SprintStory, SprintTask, Story, Task};
pub use scheduler::{PlanScheduler, ScheduleReport, ScheduleSummary};
pub use skill::{SkillPool, Specialty};
pub use team::TeamMember;
pub use validation::PlanValidationError;
