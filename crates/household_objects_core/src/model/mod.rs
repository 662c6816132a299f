//! Domain model for the household objects catalog.
//!
//! # Responsibility
//! - Define canonical records for models, grasps, meshes and tasks.
//! - Own field-level validation shared by write and read paths.
//!
//! # Invariants
//! - Every persisted record is identified by its integer row id.
//! - Records that fail `validate()` are never written.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod geometry;
pub mod grasp;
pub mod mesh;
pub mod original_model;
pub mod perturbation;
pub mod scaled_model;
pub mod task;

/// Database row id shared by all catalog tables.
pub type RecordId = i64;

/// Field-level validation failure for catalog records.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    EmptyField(&'static str),
    /// Numeric field holds NaN or infinity.
    NonFinite(&'static str),
    /// Scale factor must be strictly positive.
    NonPositiveScale(f64),
    /// Tag is blank after trimming.
    InvalidTag(String),
    /// Catalog variable name does not match `UPPER_SNAKE` form.
    InvalidVariableName(String),
    /// Flat vertex list cannot be grouped into points.
    VertexCountNotMultipleOfThree(usize),
    /// Flat index list cannot be grouped into triangles.
    TriangleCountNotMultipleOfThree(usize),
    /// Triangle index points outside the vertex list.
    TriangleIndexOutOfRange { index: i32, vertex_count: usize },
    /// Grasp names a compliant original but is not a compliant copy.
    CompliantOriginalWithoutCopy(RecordId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` cannot be empty"),
            Self::NonFinite(field) => write!(f, "`{field}` must be finite"),
            Self::NonPositiveScale(scale) => {
                write!(f, "scale must be greater than zero, got {scale}")
            }
            Self::InvalidTag(tag) => write!(f, "invalid tag: `{tag}`"),
            Self::InvalidVariableName(name) => write!(f, "invalid variable name: `{name}`"),
            Self::VertexCountNotMultipleOfThree(len) => {
                write!(f, "size of vertices vector ({len}) is not a multiple of 3")
            }
            Self::TriangleCountNotMultipleOfThree(len) => {
                write!(f, "size of triangles vector ({len}) is not a multiple of 3")
            }
            Self::TriangleIndexOutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "triangle index {index} is outside vertex range 0..{vertex_count}"
            ),
            Self::CompliantOriginalWithoutCopy(original_id) => write!(
                f,
                "compliant_original_id {original_id} is set but compliant_copy is false"
            ),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite(field));
    }
    Ok(())
}
