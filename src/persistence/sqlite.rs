use super::{PersistenceError, PersistenceResult, PlanDocument, PlanStore};
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::{Mutex, MutexGuard};

/// Keeps one row per project: the plan blob plus its parameters record.
pub struct SqlitePlanStore {
    connection: Mutex<Connection>,
}

impl SqlitePlanStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS development_plans (
                project_id TEXT PRIMARY KEY,
                plan_blob TEXT,
                params_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection lock poisoned".into()))
    }

    pub fn delete_plan(&self, project_id: &str) -> PersistenceResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM development_plans WHERE project_id = ?1",
            params![project_id],
        )?;
        Ok(removed > 0)
    }

    pub fn project_ids(&self) -> PersistenceResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT project_id FROM development_plans ORDER BY project_id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    }
}

impl PlanStore for SqlitePlanStore {
    fn save_plan(&self, project_id: &str, document: &PlanDocument) -> PersistenceResult<()> {
        super::validate_document(document)?;
        let blob = super::plan_to_blob(&document.plan)?;
        let params_json = serde_json::to_string(&document.params)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO development_plans (project_id, plan_blob, params_json)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(project_id) DO UPDATE SET
                plan_blob = excluded.plan_blob,
                params_json = excluded.params_json",
            params![project_id, blob, params_json],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_plan(&self, project_id: &str) -> PersistenceResult<Option<PlanDocument>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT plan_blob, params_json FROM development_plans WHERE project_id = ?1",
        )?;
        let row: Option<(Option<String>, String)> = stmt
            .query_row(params![project_id], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((blob, params_json)) = row else {
            return Ok(None);
        };

        let document = PlanDocument {
            params: super::params_from_record(Some(&params_json))?,
            plan: super::plan_from_blob(blob.as_deref())?,
        };
        super::validate_document(&document)?;
        Ok(Some(document))
    }
}
