//! Original (unscaled) object model.
//!
//! # Responsibility
//! - Describe one physical product scanned or modeled into the catalog.
//! - Own tag normalization shared by writes and tag queries.
//!
//! # Invariants
//! - `tags` are trimmed, non-empty and unique; case is preserved.
//! - `id` is `None` until the model has been inserted.

use super::{RecordId, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Catalog record for one original object model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OriginalModel {
    pub id: Option<RecordId>,
    pub maker: String,
    pub model: String,
    pub barcode: Option<String>,
    pub description: Option<String>,
    /// Where the geometry came from, e.g. a scanner or a vendor library.
    pub source: Option<String>,
    /// Geometry file path relative to the catalog `MODEL_ROOT`.
    pub geometry_path: Option<String>,
    pub thumbnail_path: Option<String>,
    pub tags: Vec<String>,
}

impl OriginalModel {
    pub fn new(maker: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            maker: maker.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Sets tags. They are normalized when the model is inserted.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for tag in &self.tags {
            if tag.trim().is_empty() {
                return Err(ValidationError::InvalidTag(tag.clone()));
            }
        }
        Ok(())
    }
}

/// Normalizes tag values: trims, rejects blanks, deduplicates in sorted order.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidTag(tag.clone()));
        }
        unique.insert(trimmed.to_string());
    }
    Ok(unique.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::normalize_tags;
    use crate::model::ValidationError;

    #[test]
    fn normalize_tags_trims_and_deduplicates_keeping_case() {
        let tags = vec![
            " mug ".to_string(),
            "Kitchen".to_string(),
            "mug".to_string(),
        ];
        assert_eq!(
            normalize_tags(&tags).expect("tags should normalize"),
            vec!["Kitchen".to_string(), "mug".to_string()]
        );
    }

    #[test]
    fn normalize_tags_rejects_blank_values() {
        let err = normalize_tags(&["  ".to_string()]).expect_err("blank tag must fail");
        assert!(matches!(err, ValidationError::InvalidTag(_)));
    }
}
