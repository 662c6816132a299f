//! Grasp/perturbation repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist grasps for scaled models and perturbation trials for grasps.
//! - Serve per-model and per-hand grasp queries.
//!
//! # Invariants
//! - Joint vectors and poses are stored as JSON text.
//! - Id-list filters bind the whole list as one JSON parameter.

use super::{
    bool_to_int, ensure_schema_ready, from_json_column, int_to_bool, to_json_column, RepoError,
    RepoResult,
};
use crate::model::geometry::Pose;
use crate::model::grasp::Grasp;
use crate::model::perturbation::Perturbation;
use crate::model::RecordId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const GRASP_SELECT_SQL: &str = "SELECT
    grasp_id,
    scaled_model_id,
    hand_name,
    grasp_pregrasp_pose,
    grasp_grasp_pose,
    grasp_pregrasp_joints,
    grasp_grasp_joints,
    grasp_energy,
    grasp_pregrasp_clearance,
    grasp_cluster_rep,
    grasp_table_clearance,
    grasp_compliant_copy,
    grasp_compliant_original_id,
    grasp_scaled_quality
FROM grasp";

const PERTURBATION_SELECT_SQL: &str = "SELECT
    perturbation_id,
    grasp_id,
    perturbation_deltas,
    perturbation_score
FROM perturbation";

/// Filter for grasp listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraspQuery {
    pub scaled_model_id: RecordId,
    pub hand_name: Option<String>,
    /// Only return cluster representative grasps.
    pub cluster_rep_only: bool,
}

impl GraspQuery {
    pub fn for_model(scaled_model_id: RecordId) -> Self {
        Self {
            scaled_model_id,
            hand_name: None,
            cluster_rep_only: false,
        }
    }
}

/// Repository interface for grasps and perturbations.
pub trait GraspRepository {
    fn insert_grasp(&self, grasp: &Grasp) -> RepoResult<RecordId>;
    fn get_grasp(&self, id: RecordId) -> RepoResult<Option<Grasp>>;
    fn list_grasps(&self, query: &GraspQuery) -> RepoResult<Vec<Grasp>>;
    fn insert_perturbation(&self, perturbation: &Perturbation) -> RepoResult<RecordId>;
    /// Perturbations of every grasp that belongs to one scaled model.
    fn list_perturbations_for_model(&self, scaled_model_id: RecordId)
        -> RepoResult<Vec<Perturbation>>;
    fn list_perturbations_for_grasps(&self, grasp_ids: &[RecordId])
        -> RepoResult<Vec<Perturbation>>;
}

/// SQLite-backed grasp repository.
pub struct SqliteGraspRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGraspRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn scaled_model_exists(&self, scaled_model_id: RecordId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM scaled_model WHERE scaled_model_id = ?1);",
            [scaled_model_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn query_perturbations(
        &self,
        where_clause: &str,
        bind_values: Vec<Value>,
    ) -> RepoResult<Vec<Perturbation>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERTURBATION_SELECT_SQL} WHERE {where_clause} ORDER BY perturbation_id ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut perturbations = Vec::new();
        while let Some(row) = rows.next()? {
            perturbations.push(parse_perturbation_row(row)?);
        }
        Ok(perturbations)
    }
}

impl GraspRepository for SqliteGraspRepository<'_> {
    fn insert_grasp(&self, grasp: &Grasp) -> RepoResult<RecordId> {
        grasp.validate()?;
        if !self.scaled_model_exists(grasp.scaled_model_id)? {
            return Err(RepoError::NotFound {
                entity: "scaled model",
                id: grasp.scaled_model_id,
            });
        }

        self.conn.execute(
            "INSERT INTO grasp (
                scaled_model_id,
                hand_name,
                grasp_pregrasp_pose,
                grasp_grasp_pose,
                grasp_pregrasp_joints,
                grasp_grasp_joints,
                grasp_energy,
                grasp_pregrasp_clearance,
                grasp_cluster_rep,
                grasp_table_clearance,
                grasp_compliant_copy,
                grasp_compliant_original_id,
                grasp_scaled_quality
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                grasp.scaled_model_id,
                grasp.hand_name.as_str(),
                to_json_column("grasp.grasp_pregrasp_pose", &grasp.pregrasp_pose)?,
                to_json_column("grasp.grasp_grasp_pose", &grasp.grasp_pose)?,
                to_json_column("grasp.grasp_pregrasp_joints", &grasp.pregrasp_joints)?,
                to_json_column("grasp.grasp_grasp_joints", &grasp.grasp_joints)?,
                grasp.energy,
                grasp.pregrasp_clearance,
                bool_to_int(grasp.cluster_rep),
                grasp.table_clearance,
                bool_to_int(grasp.compliant_copy),
                grasp.compliant_original_id,
                grasp.scaled_quality,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_grasp(&self, id: RecordId) -> RepoResult<Option<Grasp>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GRASP_SELECT_SQL} WHERE grasp_id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_grasp_row(row)?));
        }
        Ok(None)
    }

    fn list_grasps(&self, query: &GraspQuery) -> RepoResult<Vec<Grasp>> {
        let mut sql = format!("{GRASP_SELECT_SQL} WHERE scaled_model_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Integer(query.scaled_model_id)];

        if let Some(hand_name) = query.hand_name.as_ref() {
            sql.push_str(" AND hand_name = ?");
            bind_values.push(Value::Text(hand_name.clone()));
        }
        if query.cluster_rep_only {
            sql.push_str(" AND grasp_cluster_rep = 1");
        }
        sql.push_str(" ORDER BY grasp_id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut grasps = Vec::new();
        while let Some(row) = rows.next()? {
            grasps.push(parse_grasp_row(row)?);
        }
        Ok(grasps)
    }

    fn insert_perturbation(&self, perturbation: &Perturbation) -> RepoResult<RecordId> {
        perturbation.validate()?;
        if self.get_grasp(perturbation.grasp_id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: "grasp",
                id: perturbation.grasp_id,
            });
        }

        self.conn.execute(
            "INSERT INTO perturbation (
                grasp_id,
                perturbation_deltas,
                perturbation_score
            ) VALUES (?1, ?2, ?3);",
            params![
                perturbation.grasp_id,
                to_json_column("perturbation.perturbation_deltas", &perturbation.deltas)?,
                perturbation.score,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_perturbations_for_model(
        &self,
        scaled_model_id: RecordId,
    ) -> RepoResult<Vec<Perturbation>> {
        self.query_perturbations(
            "grasp_id IN (SELECT grasp_id FROM grasp WHERE scaled_model_id = ?)",
            vec![Value::Integer(scaled_model_id)],
        )
    }

    fn list_perturbations_for_grasps(
        &self,
        grasp_ids: &[RecordId],
    ) -> RepoResult<Vec<Perturbation>> {
        if grasp_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = to_json_column("grasp_ids", grasp_ids)?;
        self.query_perturbations(
            "grasp_id IN (SELECT value FROM json_each(?))",
            vec![Value::Text(ids)],
        )
    }
}

fn parse_grasp_row(row: &Row<'_>) -> RepoResult<Grasp> {
    let pregrasp_pose: String = row.get("grasp_pregrasp_pose")?;
    let grasp_pose: String = row.get("grasp_grasp_pose")?;
    let pregrasp_joints: String = row.get("grasp_pregrasp_joints")?;
    let grasp_joints: String = row.get("grasp_grasp_joints")?;

    let grasp = Grasp {
        id: Some(row.get("grasp_id")?),
        scaled_model_id: row.get("scaled_model_id")?,
        hand_name: row.get("hand_name")?,
        pregrasp_pose: from_json_column::<Pose>("grasp.grasp_pregrasp_pose", &pregrasp_pose)?,
        grasp_pose: from_json_column::<Pose>("grasp.grasp_grasp_pose", &grasp_pose)?,
        pregrasp_joints: from_json_column("grasp.grasp_pregrasp_joints", &pregrasp_joints)?,
        grasp_joints: from_json_column("grasp.grasp_grasp_joints", &grasp_joints)?,
        energy: row.get("grasp_energy")?,
        pregrasp_clearance: row.get("grasp_pregrasp_clearance")?,
        cluster_rep: int_to_bool("grasp.grasp_cluster_rep", row.get("grasp_cluster_rep")?)?,
        table_clearance: row.get("grasp_table_clearance")?,
        compliant_copy: int_to_bool("grasp.grasp_compliant_copy", row.get("grasp_compliant_copy")?)?,
        compliant_original_id: row.get("grasp_compliant_original_id")?,
        scaled_quality: row.get("grasp_scaled_quality")?,
    };
    grasp.validate()?;
    Ok(grasp)
}

fn parse_perturbation_row(row: &Row<'_>) -> RepoResult<Perturbation> {
    let deltas: String = row.get("perturbation_deltas")?;
    let perturbation = Perturbation {
        id: Some(row.get("perturbation_id")?),
        grasp_id: row.get("grasp_id")?,
        deltas: from_json_column("perturbation.perturbation_deltas", &deltas)?,
        score: row.get("perturbation_score")?,
    };
    perturbation.validate()?;
    Ok(perturbation)
}
