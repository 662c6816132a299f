//! Triangle mesh of an original model and its conversion to [`Shape`].
//!
//! # Invariants
//! - `vertices` is a flat `x, y, z` list; its length is a multiple of 3.
//! - `triangles` holds three vertex indices per face.

use super::geometry::{Point, Shape, ShapeKind};
use super::{RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Mesh geometry keyed by the original model it belongs to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub original_model_id: RecordId,
    pub triangles: Vec<i32>,
    pub vertices: Vec<f64>,
}

impl Mesh {
    pub fn new(original_model_id: RecordId, triangles: Vec<i32>, vertices: Vec<f64>) -> Self {
        Self {
            original_model_id,
            triangles,
            vertices,
        }
    }

    /// Number of complete points in the flat vertex list.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Full structural check used before a mesh is stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.vertices.len() % 3 != 0 {
            return Err(ValidationError::VertexCountNotMultipleOfThree(
                self.vertices.len(),
            ));
        }
        if self.triangles.len() % 3 != 0 {
            return Err(ValidationError::TriangleCountNotMultipleOfThree(
                self.triangles.len(),
            ));
        }
        let vertex_count = self.vertex_count();
        for &index in &self.triangles {
            if index < 0 || index as usize >= vertex_count {
                return Err(ValidationError::TriangleIndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Converts the flat vertex list into a mesh [`Shape`].
    ///
    /// Triangles are copied unchanged; only vertex grouping is checked.
    pub fn to_shape(&self) -> Result<Shape, ValidationError> {
        if self.vertices.len() % 3 != 0 {
            return Err(ValidationError::VertexCountNotMultipleOfThree(
                self.vertices.len(),
            ));
        }
        let vertices = self
            .vertices
            .chunks_exact(3)
            .map(|xyz| Point::new(xyz[0], xyz[1], xyz[2]))
            .collect();
        Ok(Shape {
            kind: ShapeKind::Mesh,
            triangles: self.triangles.clone(),
            vertices,
        })
    }
}
