//! Perturbation trial recorded against a grasp.

use super::{require_finite, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Result of re-evaluating a grasp under a small pose offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perturbation {
    pub id: Option<RecordId>,
    pub grasp_id: RecordId,
    /// Pose offset applied to the grasp, one value per perturbed dimension.
    pub deltas: Vec<f64>,
    pub score: Option<f64>,
}

impl Perturbation {
    pub fn new(grasp_id: RecordId, deltas: Vec<f64>) -> Self {
        Self {
            id: None,
            grasp_id,
            deltas,
            score: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for value in &self.deltas {
            require_finite("deltas", *value)?;
        }
        if let Some(score) = self.score {
            require_finite("score", score)?;
        }
        Ok(())
    }
}
