use crate::dates;
use crate::skill::SkillPool;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub story_point: u32,
    /// Pool the task draws capacity from. Filled from the `[Tag]` name prefix
    /// by [`prepare_work_tree`] when the document omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_skill: Option<SkillPool>,
    /// Sprint the task is (or was previously) placed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_key: Option<String>,
    /// Fixed owner constraint: only this user may be assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "dates::flexible_option"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "dates::flexible_option"
    )]
    pub end_date: Option<NaiveDate>,
}

impl Task {
    pub fn new(key: impl Into<String>, name: impl Into<String>, story_point: u32) -> Self {
        let name = name.into();
        Self {
            key: key.into(),
            required_skill: SkillPool::from_task_name(&name),
            name,
            story_point,
            ..Self::default()
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub(crate) fn clear_schedule(&mut self) {
        self.sprint_key = None;
        self.assignee = None;
        self.start_date = None;
        self.end_date = None;
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub story_point: u32,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Story {
    pub fn new(key: impl Into<String>, name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            story_point: 0,
            tasks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epic {
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub story_point: u32,
    #[serde(default)]
    pub stories: Vec<Story>,
}

impl Epic {
    pub fn new(key: impl Into<String>, name: impl Into<String>, stories: Vec<Story>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            story_point: 0,
            stories,
        }
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.stories.iter().flat_map(|story| story.tasks.iter())
    }
}

/// A task as placed inside a sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintTask {
    pub key: String,
    pub name: String,
    pub story_point: u32,
    pub required_skill: SkillPool,
    pub assignee: String,
    #[serde(with = "dates::flexible")]
    pub start_date: NaiveDate,
    #[serde(with = "dates::flexible")]
    pub end_date: NaiveDate,
}

/// The slice of one story that landed in one sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintStory {
    pub key: String,
    pub name: String,
    pub epic_key: String,
    pub epic_name: String,
    pub story_point: u32,
    #[serde(default)]
    pub tasks: Vec<SprintTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub key: String,
    pub name: String,
    #[serde(with = "dates::flexible")]
    pub start_date: NaiveDate,
    #[serde(with = "dates::flexible")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub story_point: u32,
    #[serde(default)]
    pub stories: Vec<SprintStory>,
}

impl Sprint {
    pub fn empty(ordinal: usize, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            key: format!("SPRINT-{}", ordinal + 1),
            name: format!("Sprint {}", ordinal + 1),
            start_date,
            end_date,
            story_point: 0,
            stories: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &SprintTask> {
        self.stories.iter().flat_map(|story| story.tasks.iter())
    }
}

/// Per-epic progress inside one milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneEpic {
    pub key: String,
    pub name: String,
    /// Points of this epic completed within the milestone.
    pub story_point: u32,
    /// Points of this epic completed by earlier milestones.
    pub prev_story_point: u32,
    /// Overall size of the epic.
    pub total_story_point: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub key: String,
    pub name: String,
    #[serde(with = "dates::flexible")]
    pub start_date: NaiveDate,
    #[serde(with = "dates::flexible")]
    pub end_date: NaiveDate,
    pub story_point: u32,
    #[serde(default)]
    pub epics: Vec<MilestoneEpic>,
    /// Keys of member sprints, in chronological order.
    #[serde(default)]
    pub sprints: Vec<String>,
}

/// The plan document exchanged with the surrounding product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(default)]
    pub epics: Vec<Epic>,
    #[serde(default)]
    pub sprints: Vec<Sprint>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl Plan {
    pub fn new(epics: Vec<Epic>) -> Self {
        Self {
            epics,
            ..Self::default()
        }
    }

    pub fn task_count(&self) -> usize {
        self.epics.iter().map(|epic| epic.tasks().count()).sum()
    }

    pub fn find_task(&self, key: &str) -> Option<&Task> {
        self.epics
            .iter()
            .flat_map(|epic| epic.tasks())
            .find(|task| task.key == key)
    }

    pub fn scheduled_story_points(&self) -> u32 {
        self.sprints.iter().map(|sprint| sprint.story_point).sum()
    }
}

/// Fills in what the generation layer may leave out: missing keys and the
/// `required_skill` of each task.
///
/// Generated keys follow the tree path (`E1`, `E1-2`, `E1-2-3`) and skip
/// keys already present in the document.
pub fn prepare_work_tree(epics: &mut [Epic]) {
    let mut used: HashSet<String> = HashSet::new();
    for epic in epics.iter() {
        remember_key(&mut used, &epic.key);
        for story in &epic.stories {
            remember_key(&mut used, &story.key);
            for task in &story.tasks {
                remember_key(&mut used, &task.key);
            }
        }
    }

    for (epic_idx, epic) in epics.iter_mut().enumerate() {
        if epic.key.trim().is_empty() {
            epic.key = unique_key(&mut used, format!("E{}", epic_idx + 1));
        }
        for (story_idx, story) in epic.stories.iter_mut().enumerate() {
            if story.key.trim().is_empty() {
                story.key = unique_key(&mut used, format!("{}-{}", epic.key, story_idx + 1));
            }
            for (task_idx, task) in story.tasks.iter_mut().enumerate() {
                if task.key.trim().is_empty() {
                    task.key = unique_key(&mut used, format!("{}-{}", story.key, task_idx + 1));
                }
                if task.required_skill.is_none() {
                    task.required_skill = SkillPool::from_task_name(&task.name);
                }
            }
        }
    }
}

fn remember_key(used: &mut HashSet<String>, key: &str) {
    if !key.trim().is_empty() {
        used.insert(key.to_string());
    }
}

fn unique_key(used: &mut HashSet<String>, candidate: String) -> String {
    let mut key = candidate.clone();
    let mut suffix = 2;
    while used.contains(&key) {
        key = format!("{candidate}.{suffix}");
        suffix += 1;
    }
    used.insert(key.clone());
    key
}
