//! Household objects catalog: models, meshes, grasps and the experiment queue.
//! This crate owns the catalog schema and every query against it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, DatabaseConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::geometry::{Point, Pose, Quaternion, Shape, ShapeKind};
pub use model::grasp::Grasp;
pub use model::mesh::Mesh;
pub use model::original_model::OriginalModel;
pub use model::perturbation::Perturbation;
pub use model::scaled_model::ScaledModel;
pub use model::task::{Task, TaskOutcome, TaskStatus};
pub use model::{RecordId, ValidationError};
pub use repo::catalog_repo::{
    CatalogRepository, OriginalModelQuery, ScaledModelQuery, SqliteCatalogRepository,
};
pub use repo::grasp_repo::{GraspQuery, GraspRepository, SqliteGraspRepository};
pub use repo::mesh_repo::{MeshRepository, SqliteMeshRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::objects_database::{
    ObjectsDatabase, ObjectsDbError, ObjectsDbResult, MODEL_ROOT_VARIABLE,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
