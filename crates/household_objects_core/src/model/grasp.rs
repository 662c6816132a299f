//! Precomputed grasp of a scaled model by a named hand.
//!
//! # Invariants
//! - `hand_name` is non-empty.
//! - Poses and joint values are finite.
//! - `compliant_original_id` may only be set on a compliant copy.

use super::geometry::Pose;
use super::{require_finite, require_non_empty, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Catalog record for one grasp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grasp {
    pub id: Option<RecordId>,
    pub scaled_model_id: RecordId,
    pub hand_name: String,
    pub pregrasp_pose: Pose,
    pub grasp_pose: Pose,
    pub pregrasp_joints: Vec<f64>,
    pub grasp_joints: Vec<f64>,
    /// Planner energy; lower is better.
    pub energy: Option<f64>,
    pub pregrasp_clearance: Option<f64>,
    /// Set on the representative grasp of a cluster of similar grasps.
    pub cluster_rep: bool,
    pub table_clearance: Option<f64>,
    pub compliant_copy: bool,
    pub compliant_original_id: Option<RecordId>,
    pub scaled_quality: Option<f64>,
}

impl Grasp {
    pub fn new(scaled_model_id: RecordId, hand_name: impl Into<String>) -> Self {
        Self {
            id: None,
            scaled_model_id,
            hand_name: hand_name.into(),
            pregrasp_pose: Pose::default(),
            grasp_pose: Pose::default(),
            pregrasp_joints: Vec::new(),
            grasp_joints: Vec::new(),
            energy: None,
            pregrasp_clearance: None,
            cluster_rep: false,
            table_clearance: None,
            compliant_copy: false,
            compliant_original_id: None,
            scaled_quality: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("hand_name", &self.hand_name)?;
        self.pregrasp_pose.validate("pregrasp_pose")?;
        self.grasp_pose.validate("grasp_pose")?;
        for value in &self.pregrasp_joints {
            require_finite("pregrasp_joints", *value)?;
        }
        for value in &self.grasp_joints {
            require_finite("grasp_joints", *value)?;
        }
        match self.compliant_original_id {
            Some(original_id) if !self.compliant_copy => {
                Err(ValidationError::CompliantOriginalWithoutCopy(original_id))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Grasp;
    use crate::model::ValidationError;

    #[test]
    fn nan_joint_is_rejected() {
        let mut grasp = Grasp::new(1, "WILLOW_GRIPPER_2010");
        grasp.grasp_joints = vec![0.1, f64::NAN];
        assert_eq!(
            grasp.validate(),
            Err(ValidationError::NonFinite("grasp_joints"))
        );
    }

    #[test]
    fn compliant_original_requires_compliant_copy() {
        let mut grasp = Grasp::new(1, "WILLOW_GRIPPER_2010");
        grasp.compliant_original_id = Some(7);
        assert_eq!(
            grasp.validate(),
            Err(ValidationError::CompliantOriginalWithoutCopy(7))
        );

        grasp.compliant_copy = true;
        assert_eq!(grasp.validate(), Ok(()));

        grasp.compliant_original_id = None;
        assert_eq!(grasp.validate(), Ok(()));
    }

    #[test]
    fn non_finite_pose_is_rejected() {
        let mut grasp = Grasp::new(1, "WILLOW_GRIPPER_2010");
        grasp.grasp_pose.position.z = f64::INFINITY;
        assert_eq!(grasp.validate(), Err(ValidationError::NonFinite("grasp_pose")));
    }
}
