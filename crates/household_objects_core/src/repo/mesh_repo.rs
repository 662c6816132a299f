//! Mesh repository contracts and SQLite implementation.
//!
//! # Invariants
//! - At most one mesh exists per original model; saving replaces it.
//! - Writes must pass `Mesh::validate()`.
//! - Reads return stored geometry as-is; grouping is checked on shape conversion.

use super::{ensure_schema_ready, from_json_column, to_json_column, RepoError, RepoResult};
use crate::model::mesh::Mesh;
use crate::model::RecordId;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for original model meshes.
pub trait MeshRepository {
    /// Inserts or replaces the mesh of `mesh.original_model_id`.
    fn save_mesh(&self, mesh: &Mesh) -> RepoResult<()>;
    fn get_mesh(&self, original_model_id: RecordId) -> RepoResult<Option<Mesh>>;
}

/// SQLite-backed mesh repository.
pub struct SqliteMeshRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMeshRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MeshRepository for SqliteMeshRepository<'_> {
    fn save_mesh(&self, mesh: &Mesh) -> RepoResult<()> {
        mesh.validate()?;
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM original_model WHERE original_model_id = ?1);",
            [mesh.original_model_id],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::NotFound {
                entity: "original model",
                id: mesh.original_model_id,
            });
        }

        self.conn.execute(
            "INSERT INTO mesh (original_model_id, mesh_triangles, mesh_vertices)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(original_model_id) DO UPDATE SET
                mesh_triangles = excluded.mesh_triangles,
                mesh_vertices = excluded.mesh_vertices;",
            params![
                mesh.original_model_id,
                to_json_column("mesh.mesh_triangles", &mesh.triangles)?,
                to_json_column("mesh.mesh_vertices", &mesh.vertices)?,
            ],
        )?;
        Ok(())
    }

    fn get_mesh(&self, original_model_id: RecordId) -> RepoResult<Option<Mesh>> {
        let columns: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT mesh_triangles, mesh_vertices
                 FROM mesh
                 WHERE original_model_id = ?1;",
                [original_model_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((triangles, vertices)) = columns else {
            return Ok(None);
        };
        Ok(Some(Mesh {
            original_model_id,
            triangles: from_json_column("mesh.mesh_triangles", &triangles)?,
            vertices: from_json_column("mesh.mesh_vertices", &vertices)?,
        }))
    }
}
