use crate::calculations::capacity::{CapacityArena, CapacityModel, SkillCapacity};
use crate::dates;
use crate::params::PreassignedSprintPolicy;
use crate::plan::{Epic, Sprint, SprintStory, SprintTask, Task};
use crate::skill::SkillPool;
use crate::team::TeamMember;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Extra sprint slots created on top of the capacity estimate, so that
/// imperfect first-fit packing still finds room.
pub const DEFAULT_SPRINT_BUFFER: usize = 6;

/// Upper bound on sprint slots created for one run, buffer included.
pub const MAX_SPRINT_SLOTS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
    pub sprint_buffer: usize,
    pub preassigned: PreassignedSprintPolicy,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            sprint_buffer: DEFAULT_SPRINT_BUFFER,
            preassigned: PreassignedSprintPolicy::Reset,
        }
    }
}

/// Outcome of one allocation run.
#[derive(Debug, Clone, PartialEq)]
pub enum Allocation {
    /// Every participating task found a sprint and a person.
    Scheduled(Vec<Sprint>),
    /// Some tasks fit nowhere and were left out of the plan.
    PartiallyScheduled {
        sprints: Vec<Sprint>,
        dropped_task_keys: Vec<String>,
    },
}

impl Allocation {
    pub fn sprints(&self) -> &[Sprint] {
        match self {
            Allocation::Scheduled(sprints) => sprints,
            Allocation::PartiallyScheduled { sprints, .. } => sprints,
        }
    }

    pub fn dropped_task_keys(&self) -> &[String] {
        match self {
            Allocation::Scheduled(_) => &[],
            Allocation::PartiallyScheduled {
                dropped_task_keys, ..
            } => dropped_task_keys,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Allocation::Scheduled(_))
    }

    pub fn into_parts(self) -> (Vec<Sprint>, Vec<String>) {
        match self {
            Allocation::Scheduled(sprints) => (sprints, Vec::new()),
            Allocation::PartiallyScheduled {
                sprints,
                dropped_task_keys,
            } => (sprints, dropped_task_keys),
        }
    }
}

struct Placement {
    ordinal: usize,
    member_idx: usize,
    user_id: String,
    pool: SkillPool,
    start: NaiveDate,
    end: NaiveDate,
}

/// Greedy first-fit assignment of tasks to sprints and people.
#[derive(Debug, Clone, Default)]
pub struct SprintAllocator {
    config: AllocatorConfig,
}

impl SprintAllocator {
    pub fn new(config: AllocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Story points each pool is asked for, over the tasks this run will place.
    pub fn skill_demand(&self, epics: &[Epic]) -> BTreeMap<SkillPool, u64> {
        let mut demand: BTreeMap<SkillPool, u64> = BTreeMap::new();
        for task in epics.iter().flat_map(|epic| epic.tasks()) {
            if !self.participates(task) {
                continue;
            }
            if let Some(pool) = task.required_skill {
                *demand.entry(pool).or_default() += u64::from(task.story_point);
            }
        }
        demand
    }

    /// Sprints needed by the most loaded pool, before the buffer is added.
    pub fn minimum_sprint_count(&self, epics: &[Epic], template: &SkillCapacity) -> usize {
        let mut minimum = 0usize;
        for (pool, points) in self.skill_demand(epics) {
            if points == 0 {
                continue;
            }
            let per_sprint = template.pool_remaining(pool);
            if per_sprint <= 0.0 {
                tracing::warn!(
                    pool = %pool,
                    demand = points,
                    "skill pool has demand but no capacity; its tasks cannot be placed"
                );
                continue;
            }
            let needed = (points as f64 / per_sprint).ceil();
            if needed >= MAX_SPRINT_SLOTS as f64 {
                tracing::warn!(
                    pool = %pool,
                    demand = points,
                    per_sprint,
                    max_slots = MAX_SPRINT_SLOTS,
                    "skill pool needs more sprints than the slot limit"
                );
                return MAX_SPRINT_SLOTS;
            }
            minimum = minimum.max(needed as usize);
        }
        minimum
    }

    /// Never more than [`MAX_SPRINT_SLOTS`].
    pub fn estimate_sprint_count(&self, epics: &[Epic], template: &SkillCapacity) -> usize {
        self.minimum_sprint_count(epics, template)
            .saturating_add(self.config.sprint_buffer)
            .min(MAX_SPRINT_SLOTS)
    }

    pub fn allocate(
        &self,
        epics: &mut [Epic],
        team_members: &[TeamMember],
        sprint_length_days: i64,
        sprint_start_date: NaiveDate,
    ) -> Allocation {
        let template = CapacityModel::from_members(team_members);
        let sprint_count = self.estimate_sprint_count(epics, &template);
        tracing::debug!(
            sprint_count,
            members = team_members.len(),
            sprint_length_days,
            "allocating sprint slots"
        );

        let mut sprints: Vec<Sprint> = Vec::with_capacity(sprint_count);
        for ordinal in 0..sprint_count {
            let Some((start, end)) = sprint_window(sprint_start_date, sprint_length_days, ordinal)
            else {
                tracing::warn!(
                    ordinal,
                    sprint_length_days,
                    start = %sprint_start_date,
                    "sprint dates fall outside the calendar; no further sprint slots"
                );
                break;
            };
            sprints.push(Sprint::empty(ordinal, start, end));
        }
        let mut arena = CapacityArena::new(&template, sprints.len());
        // Latest end date per (sprint, member); a person's tasks run back to back.
        let mut busy_until: Vec<Vec<Option<NaiveDate>>> =
            vec![vec![None; team_members.len()]; sprints.len()];
        let mut dropped_task_keys = Vec::new();

        for epic in epics.iter_mut() {
            let epic_key = epic.key.clone();
            let epic_name = epic.name.clone();
            for story in epic.stories.iter_mut() {
                for task in story.tasks.iter_mut() {
                    if !self.prepare_task(task) {
                        continue;
                    }
                    let Some(placement) = Self::place(
                        task,
                        &mut arena,
                        &sprints,
                        &busy_until,
                        sprint_length_days,
                    ) else {
                        tracing::warn!(
                            task_key = %task.key,
                            skill = ?task.required_skill,
                            story_point = task.story_point,
                            owner = ?task.owner,
                            "no sprint or teammate can take task; dropping it from the plan"
                        );
                        dropped_task_keys.push(task.key.clone());
                        continue;
                    };

                    busy_until[placement.ordinal][placement.member_idx] = Some(placement.end);
                    let sprint = &mut sprints[placement.ordinal];
                    task.sprint_key = Some(sprint.key.clone());
                    task.assignee = Some(placement.user_id.clone());
                    task.start_date = Some(placement.start);
                    task.end_date = Some(placement.end);

                    let entry = match sprint
                        .stories
                        .iter()
                        .position(|s| s.key == story.key && s.epic_key == epic_key)
                    {
                        Some(idx) => &mut sprint.stories[idx],
                        None => {
                            sprint.stories.push(SprintStory {
                                key: story.key.clone(),
                                name: story.name.clone(),
                                epic_key: epic_key.clone(),
                                epic_name: epic_name.clone(),
                                story_point: 0,
                                tasks: Vec::new(),
                            });
                            let last = sprint.stories.len() - 1;
                            &mut sprint.stories[last]
                        }
                    };
                    entry.story_point += task.story_point;
                    entry.tasks.push(SprintTask {
                        key: task.key.clone(),
                        name: task.name.clone(),
                        story_point: task.story_point,
                        required_skill: placement.pool,
                        assignee: placement.user_id,
                        start_date: placement.start,
                        end_date: placement.end,
                    });
                    sprint.story_point += task.story_point;
                }
            }
        }

        trim_empty_sprints(&mut sprints);
        tracing::info!(
            sprints = sprints.len(),
            dropped = dropped_task_keys.len(),
            "sprint allocation finished"
        );

        if dropped_task_keys.is_empty() {
            Allocation::Scheduled(sprints)
        } else {
            Allocation::PartiallyScheduled {
                sprints,
                dropped_task_keys,
            }
        }
    }

    fn participates(&self, task: &Task) -> bool {
        match self.config.preassigned {
            PreassignedSprintPolicy::Reset => true,
            PreassignedSprintPolicy::Keep => task.sprint_key.is_none(),
        }
    }

    /// Applies the pre-assigned sprint policy. Returns whether the task is
    /// allocated in this run.
    fn prepare_task(&self, task: &mut Task) -> bool {
        if !self.participates(task) {
            tracing::debug!(
                task_key = %task.key,
                sprint_key = ?task.sprint_key,
                "keeping pre-assigned sprint"
            );
            return false;
        }
        if let Some(previous) = task.sprint_key.as_deref() {
            tracing::info!(
                task_key = %task.key,
                sprint_key = previous,
                "resetting pre-assigned sprint before allocation"
            );
        }
        task.clear_schedule();
        true
    }

    fn place(
        task: &Task,
        arena: &mut CapacityArena,
        sprints: &[Sprint],
        busy_until: &[Vec<Option<NaiveDate>>],
        sprint_length_days: i64,
    ) -> Option<Placement> {
        let pool = task.required_skill?;
        for ordinal in 0..arena.len() {
            let snapshot = arena.snapshot(ordinal);
            if !snapshot.pool_can_fit(pool, task.story_point) {
                continue;
            }
            let Some(member_idx) =
                snapshot.find_member(pool, task.story_point, task.owner.as_deref())
            else {
                continue;
            };

            let member = &snapshot.members()[member_idx];
            let sprint_start = sprints[ordinal].start_date;
            let start = busy_until[ordinal][member_idx]
                .map_or(sprint_start, |end| end.max(sprint_start));
            let Some(end) = dates::add_days(
                start,
                task_duration_days(sprint_length_days, member.total, task.story_point),
            ) else {
                continue;
            };
            let user_id = member.user_id.clone();

            let next = snapshot.reserve(pool, member_idx, task.story_point);
            arena.commit(ordinal, next);
            return Some(Placement {
                ordinal,
                member_idx,
                user_id,
                pool,
                start,
                end,
            });
        }
        None
    }
}

/// Calendar days a task occupies: its share of the sprint proportional to
/// the assignee's capacity, rounded up.
pub fn task_duration_days(sprint_length_days: i64, member_capacity: f64, story_point: u32) -> i64 {
    if story_point == 0 || member_capacity <= 0.0 {
        return 0;
    }
    (sprint_length_days as f64 / member_capacity * f64::from(story_point)).ceil() as i64
}

/// Start and end of sprint slot `ordinal`, or `None` past the calendar's range.
fn sprint_window(
    sprint_start_date: NaiveDate,
    sprint_length_days: i64,
    ordinal: usize,
) -> Option<(NaiveDate, NaiveDate)> {
    let offset = i64::try_from(ordinal).ok()?.checked_mul(sprint_length_days)?;
    let start = dates::add_days(sprint_start_date, offset)?;
    let end = dates::add_days(sprint_start_date, offset.checked_add(sprint_length_days)?)?;
    Some((start, end))
}

/// Drops sprints that received no work.
pub fn trim_empty_sprints(sprints: &mut Vec<Sprint>) {
    let mut idx = 0;
    while idx < sprints.len() {
        if sprints[idx].is_empty() {
            sprints.remove(idx);
        } else {
            idx += 1;
        }
    }
}
