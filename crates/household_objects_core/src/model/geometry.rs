//! Plain geometry value types used by grasps and shape conversion.

use super::{require_finite, ValidationError};
use serde::{Deserialize, Serialize};

/// Point in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Rotation quaternion. Identity is `w = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

/// Position plus orientation of a hand relative to the object frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn validate(&self, field: &'static str) -> Result<(), ValidationError> {
        let p = self.position;
        let q = self.orientation;
        for value in [p.x, p.y, p.z, q.x, q.y, q.z, q.w] {
            require_finite(field, value)?;
        }
        Ok(())
    }
}

/// Kind of geometric shape carried by [`Shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Mesh,
}

/// Shape message exchanged with planners: a triangle mesh with indexed points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    /// Vertex indices, three per triangle.
    pub triangles: Vec<i32>,
    pub vertices: Vec<Point>,
}
