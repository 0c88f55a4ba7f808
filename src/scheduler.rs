use crate::calculations::milestones::{MilestoneConfig, MilestoneGrouper};
use crate::calculations::rollup;
use crate::calculations::sprint_allocation::{AllocatorConfig, SprintAllocator};
use crate::params::SchedulingParams;
use crate::plan::{self, Plan};
use crate::validation;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub task_count: usize,
    pub scheduled_task_count: usize,
    pub sprint_count: usize,
    pub milestone_count: usize,
    pub total_story_points: u32,
    pub scheduled_story_points: u32,
    pub dropped_task_keys: Vec<String>,
    pub finish: Option<NaiveDate>,
}

impl ScheduleSummary {
    fn from_plan(plan: &Plan, dropped_task_keys: Vec<String>) -> Self {
        Self {
            task_count: plan.task_count(),
            scheduled_task_count: plan.sprints.iter().map(|s| s.tasks().count()).sum(),
            sprint_count: plan.sprints.len(),
            milestone_count: plan.milestones.len(),
            total_story_points: plan.epics.iter().map(|e| e.story_point).sum(),
            scheduled_story_points: plan.scheduled_story_points(),
            dropped_task_keys,
            finish: plan.sprints.iter().map(|s| s.end_date).max(),
        }
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!(
            "tasks={}/{}",
            self.scheduled_task_count, self.task_count
        ));
        parts.push(format!(
            "points={}/{}",
            self.scheduled_story_points, self.total_story_points
        ));
        parts.push(format!("sprints={}", self.sprint_count));
        parts.push(format!("milestones={}", self.milestone_count));
        if let Some(date) = self.finish {
            parts.push(format!("finish={}", date));
        }
        if !self.dropped_task_keys.is_empty() {
            parts.push(format!("dropped={}", self.dropped_task_keys.join(",")));
        }
        parts.join(", ")
    }
}

/// A scheduled plan and what happened while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleReport {
    pub plan: Plan,
    pub summary: ScheduleSummary,
}

impl ScheduleReport {
    /// False when at least one task could not be placed.
    pub fn is_complete(&self) -> bool {
        self.summary.dropped_task_keys.is_empty()
    }

    pub fn dropped_task_keys(&self) -> &[String] {
        &self.summary.dropped_task_keys
    }
}

/// Runs the whole pipeline: rollup, capacity, allocation, rollup, milestones.
#[derive(Debug, Clone, Default)]
pub struct PlanScheduler {
    sprint_buffer: Option<usize>,
    milestones: MilestoneConfig,
}

impl PlanScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sprint_buffer(mut self, sprint_buffer: usize) -> Self {
        self.sprint_buffer = Some(sprint_buffer);
        self
    }

    pub fn with_milestone_gap_days(mut self, gap_days: i64) -> Self {
        self.milestones.gap_days = gap_days;
        self
    }

    fn allocator_for(&self, params: &SchedulingParams) -> SprintAllocator {
        let defaults = AllocatorConfig::default();
        SprintAllocator::new(AllocatorConfig {
            sprint_buffer: self.sprint_buffer.unwrap_or(defaults.sprint_buffer),
            preassigned: params.preassigned_sprint_policy,
        })
    }

    pub fn schedule(&self, mut plan: Plan, params: &SchedulingParams) -> ScheduleReport {
        plan::prepare_work_tree(&mut plan.epics);
        if let Err(err) = validation::validate_epics(&plan.epics) {
            tracing::warn!(
                error = %err,
                "work tree has repeated keys; sprint stories are grouped per epic"
            );
        }
        rollup::rollup(&mut plan.epics);

        for specialty in params.uncovered_specialties() {
            tracing::warn!(specialty, "required specialty has nobody on the roster");
        }

        let allocation = self.allocator_for(params).allocate(
            &mut plan.epics,
            &params.team_members,
            params.sprint_length_days(),
            params.sprint_start_date,
        );
        rollup::rollup(&mut plan.epics);

        let (sprints, dropped_task_keys) = allocation.into_parts();
        let milestones = MilestoneGrouper::new(self.milestones).group(&sprints, &plan.epics);
        plan.sprints = sprints;
        plan.milestones = milestones;

        let summary = ScheduleSummary::from_plan(&plan, dropped_task_keys);
        tracing::info!(summary = %summary.to_cli_summary(), "plan scheduled");
        ScheduleReport { plan, summary }
    }

    /// Schedules independent plans side by side on the rayon pool.
    pub fn schedule_many(&self, jobs: Vec<(Plan, SchedulingParams)>) -> Vec<ScheduleReport> {
        jobs.into_par_iter()
            .map(|(plan, params)| self.schedule(plan, &params))
            .collect()
    }
}
