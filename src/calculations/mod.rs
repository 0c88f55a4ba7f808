pub mod capacity;
pub mod milestones;
pub mod rollup;
pub mod sprint_allocation;
