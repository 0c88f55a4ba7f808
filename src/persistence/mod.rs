use crate::params::SchedulingParams;
use crate::plan::Plan;
use crate::validation;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeJsonError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("no plan stored for project '{0}'")]
    NotFound(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Everything needed to re-run or display a plan: the scheduling parameters
/// and the plan itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    #[serde(default)]
    pub params: SchedulingParams,
    #[serde(default)]
    pub plan: Plan,
}

impl PlanDocument {
    pub fn new(params: SchedulingParams, plan: Plan) -> Self {
        Self { params, plan }
    }
}

/// Storage for plans keyed by project.
pub trait PlanStore {
    fn save_plan(&self, project_id: &str, document: &PlanDocument) -> PersistenceResult<()>;
    fn load_plan(&self, project_id: &str) -> PersistenceResult<Option<PlanDocument>>;

    /// Like [`PlanStore::load_plan`], but a missing project is an error.
    fn require_plan(&self, project_id: &str) -> PersistenceResult<PlanDocument> {
        self.load_plan(project_id)?
            .ok_or_else(|| PersistenceError::NotFound(project_id.to_string()))
    }
}

pub fn validate_document(document: &PlanDocument) -> PersistenceResult<()> {
    validation::validate_params(&document.params)
        .and_then(|_| validation::validate_epics(&document.plan.epics))
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

/// Reads a stored plan blob. An absent or blank blob yields an empty plan.
pub fn plan_from_blob(blob: Option<&str>) -> PersistenceResult<Plan> {
    match blob {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(raw)?),
        _ => Ok(Plan::default()),
    }
}

pub fn plan_to_blob(plan: &Plan) -> PersistenceResult<String> {
    Ok(serde_json::to_string(plan)?)
}

/// Reads the parameters record stored beside a plan blob, with the same
/// fallback rules as [`plan_from_blob`].
pub fn params_from_record(record: Option<&str>) -> PersistenceResult<SchedulingParams> {
    match record {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(raw)?),
        _ => Ok(SchedulingParams::default()),
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{load_plan_from_json, load_team_from_csv, save_assignments_to_csv, save_plan_to_json};
