//! Objects database facade.
//!
//! # Responsibility
//! - Own one migrated connection to the household objects catalog.
//! - Expose convenience queries used by grasp planners and experiment workers.
//! - Convert stored meshes into planner-facing [`Shape`] values.
//!
//! # Invariants
//! - Every query goes through a repository; no SQL lives here.
//! - `acquire_next_task` never hands the same task to two workers.
//! - Mesh lookup failures are logged with both scaled and original model ids.

use crate::config::{ConfigError, DatabaseConfig};
use crate::db::{open_db, open_db_in_memory, open_db_with_config, DbError};
use crate::model::geometry::Shape;
use crate::model::grasp::Grasp;
use crate::model::mesh::Mesh;
use crate::model::original_model::OriginalModel;
use crate::model::perturbation::Perturbation;
use crate::model::scaled_model::ScaledModel;
use crate::model::task::{Task, TaskOutcome};
use crate::model::{RecordId, ValidationError};
use crate::repo::catalog_repo::{
    CatalogRepository, OriginalModelQuery, ScaledModelQuery, SqliteCatalogRepository,
};
use crate::repo::grasp_repo::{GraspQuery, GraspRepository, SqliteGraspRepository};
use crate::repo::mesh_repo::{MeshRepository, SqliteMeshRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::RepoError;
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Catalog variable holding the directory geometry paths are relative to.
pub const MODEL_ROOT_VARIABLE: &str = "MODEL_ROOT";

pub type ObjectsDbResult<T> = Result<T, ObjectsDbError>;

/// Error for objects database use-cases.
#[derive(Debug)]
pub enum ObjectsDbError {
    Config(ConfigError),
    Db(DbError),
    Repo(RepoError),
    /// Scaled model id does not resolve to an original model.
    ScaledModelNotFound(RecordId),
    /// Original model has no stored mesh.
    MeshNotFound {
        scaled_model_id: RecordId,
        original_model_id: RecordId,
    },
    /// Scaled model or mesh row exists but cannot be read back.
    MeshLoad {
        scaled_model_id: RecordId,
        /// `None` when the scaled model itself failed to load.
        original_model_id: Option<RecordId>,
        source: RepoError,
    },
    /// Stored mesh cannot be converted to a shape.
    InvalidMesh {
        scaled_model_id: RecordId,
        source: ValidationError,
    },
    /// Catalog variable is not set.
    VariableNotSet(&'static str),
}

impl Display for ObjectsDbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::ScaledModelNotFound(id) => {
                write!(f, "failed to get original model for scaled model id {id}")
            }
            Self::MeshNotFound {
                scaled_model_id,
                original_model_id,
            } => write!(
                f,
                "failed to load mesh for scaled model {scaled_model_id}, resolved to original model {original_model_id}"
            ),
            Self::MeshLoad {
                scaled_model_id,
                original_model_id: Some(original_model_id),
                source,
            } => write!(
                f,
                "failed to load mesh from database for scaled model {scaled_model_id}, resolved to original model {original_model_id}: {source}"
            ),
            Self::MeshLoad {
                scaled_model_id,
                original_model_id: None,
                source,
            } => write!(
                f,
                "failed to get original model for scaled model id {scaled_model_id}: {source}"
            ),
            Self::InvalidMesh {
                scaled_model_id,
                source,
            } => write!(f, "invalid mesh for scaled model {scaled_model_id}: {source}"),
            Self::VariableNotSet(name) => write!(f, "catalog variable `{name}` is not set"),
        }
    }
}

impl Error for ObjectsDbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::MeshLoad { source, .. } => Some(source),
            Self::InvalidMesh { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ObjectsDbError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for ObjectsDbError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ObjectsDbError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Household objects catalog with convenience queries.
pub struct ObjectsDatabase {
    conn: Connection,
}

impl ObjectsDatabase {
    /// Opens (or creates) the catalog stored at `path`.
    pub fn open(path: impl AsRef<Path>) -> ObjectsDbResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a private in-memory catalog.
    pub fn open_in_memory() -> ObjectsDbResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Opens the catalog described by `config`.
    pub fn from_config(config: &DatabaseConfig) -> ObjectsDbResult<Self> {
        config.validate()?;
        Ok(Self {
            conn: open_db_with_config(config)?,
        })
    }

    /// Borrows the underlying connection for repository-level access.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn catalog(&self) -> ObjectsDbResult<SqliteCatalogRepository<'_>> {
        Ok(SqliteCatalogRepository::try_new(&self.conn)?)
    }

    pub fn grasps(&self) -> ObjectsDbResult<SqliteGraspRepository<'_>> {
        Ok(SqliteGraspRepository::try_new(&self.conn)?)
    }

    pub fn meshes(&self) -> ObjectsDbResult<SqliteMeshRepository<'_>> {
        Ok(SqliteMeshRepository::try_new(&self.conn)?)
    }

    pub fn tasks(&mut self) -> ObjectsDbResult<SqliteTaskRepository<'_>> {
        Ok(SqliteTaskRepository::try_new(&mut self.conn)?)
    }

    /// Claims the next queued experiment for `worker`, marking it running.
    ///
    /// Returns `Ok(None)` when no task is waiting.
    pub fn acquire_next_task(&mut self, worker: &str) -> ObjectsDbResult<Option<Task>> {
        let result = self.tasks()?.acquire_next_task(worker);
        match &result {
            Ok(Some(task)) => info!(
                "event=task_acquire module=objects_db status=ok task_id={} task_type={} worker={}",
                task.id, task.task_type, worker
            ),
            Ok(None) => info!(
                "event=task_acquire module=objects_db status=empty worker={}",
                worker
            ),
            Err(err) => error!(
                "event=task_acquire module=objects_db status=error worker={} error={}",
                worker, err
            ),
        }
        Ok(result?)
    }

    /// Records the outcome of a task previously claimed by `worker`.
    pub fn finish_task(
        &mut self,
        task_id: RecordId,
        worker: &str,
        outcome: &TaskOutcome,
    ) -> ObjectsDbResult<Task> {
        let result = self.tasks()?.finish_task(task_id, worker, outcome);
        match &result {
            Ok(task) => info!(
                "event=task_finish module=objects_db status=ok task_id={} outcome={} worker={}",
                task.id,
                task.status.as_db_str(),
                worker
            ),
            Err(err) => error!(
                "event=task_finish module=objects_db status=error task_id={} worker={} error={}",
                task_id, worker, err
            ),
        }
        Ok(result?)
    }

    /// Lists every original model.
    pub fn get_original_models_list(&self) -> ObjectsDbResult<Vec<OriginalModel>> {
        Ok(self
            .catalog()?
            .list_original_models(&OriginalModelQuery::default())?)
    }

    /// Lists every scaled model.
    pub fn get_scaled_models_list(&self) -> ObjectsDbResult<Vec<ScaledModel>> {
        Ok(self
            .catalog()?
            .list_scaled_models(&ScaledModelQuery::default())?)
    }

    /// Lists scaled models acquired with `acquisition_method`.
    pub fn get_scaled_models_by_acquisition(
        &self,
        acquisition_method: &str,
    ) -> ObjectsDbResult<Vec<ScaledModel>> {
        let query = ScaledModelQuery {
            acquisition_method: Some(acquisition_method.to_string()),
            ..ScaledModelQuery::default()
        };
        Ok(self.catalog()?.list_scaled_models(&query)?)
    }

    /// Lists scaled models whose original model belongs to `model_set_name`.
    ///
    /// A blank set name lists every scaled model.
    pub fn get_scaled_models_by_set(
        &self,
        model_set_name: &str,
    ) -> ObjectsDbResult<Vec<ScaledModel>> {
        if model_set_name.trim().is_empty() {
            return self.get_scaled_models_list();
        }
        let query = ScaledModelQuery {
            model_set: Some(model_set_name.to_string()),
            ..ScaledModelQuery::default()
        };
        Ok(self.catalog()?.list_scaled_models(&query)?)
    }

    pub fn get_num_original_models(&self) -> ObjectsDbResult<u64> {
        Ok(self.catalog()?.count_original_models()?)
    }

    /// Returns the directory that geometry paths are relative to.
    pub fn get_model_root(&self) -> ObjectsDbResult<String> {
        self.catalog()?
            .get_variable(MODEL_ROOT_VARIABLE)?
            .ok_or(ObjectsDbError::VariableNotSet(MODEL_ROOT_VARIABLE))
    }

    /// Lists original models carrying every tag in `tags`.
    ///
    /// No tags means no filter.
    pub fn get_models_list_by_tags(&self, tags: &[String]) -> ObjectsDbResult<Vec<OriginalModel>> {
        let query = OriginalModelQuery {
            tags: tags.to_vec(),
        };
        Ok(self.catalog()?.list_original_models(&query)?)
    }

    /// Lists grasps of one scaled model for one hand.
    pub fn get_grasps(
        &self,
        scaled_model_id: RecordId,
        hand_name: &str,
    ) -> ObjectsDbResult<Vec<Grasp>> {
        let query = GraspQuery {
            hand_name: Some(hand_name.to_string()),
            ..GraspQuery::for_model(scaled_model_id)
        };
        Ok(self.grasps()?.list_grasps(&query)?)
    }

    /// Lists only the cluster representative grasps of one model and hand.
    pub fn get_cluster_rep_grasps(
        &self,
        scaled_model_id: RecordId,
        hand_name: &str,
    ) -> ObjectsDbResult<Vec<Grasp>> {
        let query = GraspQuery {
            hand_name: Some(hand_name.to_string()),
            cluster_rep_only: true,
            ..GraspQuery::for_model(scaled_model_id)
        };
        Ok(self.grasps()?.list_grasps(&query)?)
    }

    /// Loads the mesh of the original model behind a scaled model.
    pub fn get_scaled_model_mesh(&self, scaled_model_id: RecordId) -> ObjectsDbResult<Mesh> {
        let scaled_model = match self.catalog()?.get_scaled_model(scaled_model_id) {
            Ok(Some(model)) => model,
            Ok(None) => {
                error!(
                    "event=mesh_load module=objects_db status=error scaled_model_id={} error_code=scaled_model_not_found",
                    scaled_model_id
                );
                return Err(ObjectsDbError::ScaledModelNotFound(scaled_model_id));
            }
            Err(source) => {
                error!(
                    "event=mesh_load module=objects_db status=error scaled_model_id={} error_code=scaled_model_load_failed error={}",
                    scaled_model_id, source
                );
                return Err(ObjectsDbError::MeshLoad {
                    scaled_model_id,
                    original_model_id: None,
                    source,
                });
            }
        };

        let original_model_id = scaled_model.original_model_id;
        match self.meshes()?.get_mesh(original_model_id) {
            Ok(Some(mesh)) => Ok(mesh),
            Ok(None) => {
                error!(
                    "event=mesh_load module=objects_db status=error scaled_model_id={} original_model_id={} error_code=mesh_not_found",
                    scaled_model_id, original_model_id
                );
                Err(ObjectsDbError::MeshNotFound {
                    scaled_model_id,
                    original_model_id,
                })
            }
            Err(source) => {
                error!(
                    "event=mesh_load module=objects_db status=error scaled_model_id={} original_model_id={} error_code=mesh_load_failed error={}",
                    scaled_model_id, original_model_id, source
                );
                Err(ObjectsDbError::MeshLoad {
                    scaled_model_id,
                    original_model_id: Some(original_model_id),
                    source,
                })
            }
        }
    }

    /// Loads the mesh behind a scaled model as a planner [`Shape`].
    pub fn get_scaled_model_shape(&self, scaled_model_id: RecordId) -> ObjectsDbResult<Shape> {
        let mesh = self.get_scaled_model_mesh(scaled_model_id)?;
        mesh.to_shape().map_err(|source| {
            error!(
                "event=mesh_load module=objects_db status=error scaled_model_id={} error_code=invalid_mesh error={}",
                scaled_model_id, source
            );
            ObjectsDbError::InvalidMesh {
                scaled_model_id,
                source,
            }
        })
    }

    /// Lists perturbations of every grasp of one scaled model.
    pub fn get_all_perturbations_for_model(
        &self,
        scaled_model_id: RecordId,
    ) -> ObjectsDbResult<Vec<Perturbation>> {
        Ok(self
            .grasps()?
            .list_perturbations_for_model(scaled_model_id)?)
    }

    /// Lists perturbations recorded for any of `grasp_ids`.
    pub fn get_perturbations_for_grasps(
        &self,
        grasp_ids: &[RecordId],
    ) -> ObjectsDbResult<Vec<Perturbation>> {
        Ok(self.grasps()?.list_perturbations_for_grasps(grasp_ids)?)
    }
}
