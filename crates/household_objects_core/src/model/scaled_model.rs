//! Scaled model: an original model instantiated at a given scale.

use super::{require_finite, require_non_empty, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Catalog record for one scaled instance of an original model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledModel {
    pub id: Option<RecordId>,
    pub original_model_id: RecordId,
    pub scale: f64,
    /// How the geometry was acquired, e.g. `3DSOM` or `IRCS_SCANNER`.
    pub acquisition_method: String,
}

impl ScaledModel {
    pub fn new(original_model_id: RecordId, acquisition_method: impl Into<String>) -> Self {
        Self {
            id: None,
            original_model_id,
            scale: 1.0,
            acquisition_method: acquisition_method.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("acquisition_method", &self.acquisition_method)?;
        require_finite("scale", self.scale)?;
        if self.scale <= 0.0 {
            return Err(ValidationError::NonPositiveScale(self.scale));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ScaledModel;
    use crate::model::ValidationError;

    #[test]
    fn zero_scale_is_rejected() {
        let mut model = ScaledModel::new(1, "3DSOM");
        model.scale = 0.0;
        assert_eq!(
            model.validate(),
            Err(ValidationError::NonPositiveScale(0.0))
        );
    }

    #[test]
    fn blank_acquisition_method_is_rejected() {
        let model = ScaledModel::new(1, " ");
        assert_eq!(
            model.validate(),
            Err(ValidationError::EmptyField("acquisition_method"))
        );
    }
}
