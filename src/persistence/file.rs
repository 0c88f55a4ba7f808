use super::{PersistenceError, PersistenceResult, PlanDocument};
use crate::dates;
use crate::plan::Plan;
use crate::team::TeamMember;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

pub fn save_plan_to_json<P: AsRef<Path>>(
    document: &PlanDocument,
    path: P,
) -> PersistenceResult<()> {
    super::validate_document(document)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, document)?;
    Ok(())
}

pub fn load_plan_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<PlanDocument> {
    let file = File::open(path)?;
    let document: PlanDocument = serde_json::from_reader(file)?;
    super::validate_document(&document)?;
    Ok(document)
}

/// One scheduled task per row.
#[derive(Serialize, Deserialize)]
struct AssignmentCsvRecord {
    sprint_key: String,
    sprint_name: String,
    epic_key: String,
    story_key: String,
    task_key: String,
    task_name: String,
    skill: String,
    story_point: u32,
    assignee: String,
    start_date: String,
    end_date: String,
}

pub fn save_assignments_to_csv<P: AsRef<Path>>(plan: &Plan, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for sprint in &plan.sprints {
        for story in &sprint.stories {
            for task in &story.tasks {
                writer.serialize(AssignmentCsvRecord {
                    sprint_key: sprint.key.clone(),
                    sprint_name: sprint.name.clone(),
                    epic_key: story.epic_key.clone(),
                    story_key: story.key.clone(),
                    task_key: task.key.clone(),
                    task_name: task.name.clone(),
                    skill: task.required_skill.to_string(),
                    story_point: task.story_point,
                    assignee: task.assignee.clone(),
                    start_date: dates::format_date(task.start_date),
                    end_date: dates::format_date(task.end_date),
                })?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

#[derive(Deserialize)]
struct TeamMemberCsvRecord {
    user_id: String,
    specialty: String,
    story_points_per_sprint: String,
}

impl TeamMemberCsvRecord {
    fn into_member(self) -> PersistenceResult<TeamMember> {
        let capacity = self
            .story_points_per_sprint
            .trim()
            .parse::<f64>()
            .map_err(|e| {
                PersistenceError::InvalidData(format!(
                    "invalid story_points_per_sprint '{}' for '{}': {e}",
                    self.story_points_per_sprint, self.user_id
                ))
            })?;
        let member = TeamMember::new(self.user_id.trim(), self.specialty.trim(), capacity);
        crate::validation::validate_member(&member)
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        Ok(member)
    }
}

/// Reads a roster with columns `user_id,specialty,story_points_per_sprint`.
pub fn load_team_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<TeamMember>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut members = Vec::new();
    for record in reader.deserialize::<TeamMemberCsvRecord>() {
        members.push(record?.into_member()?);
    }

    if members.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no team members".into(),
        ));
    }
    Ok(members)
}
