//! Model catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist original models with their tags, scaled models and model sets.
//! - Serve list/count queries used by the catalog facade.
//! - Store global catalog variables such as `MODEL_ROOT`.
//!
//! # Invariants
//! - Tag filters use AND semantics: a model must carry every requested tag.
//! - Tag replacement for one model is atomic.
//! - List results are ordered by primary key ascending.

use super::{ensure_schema_ready, RepoError, RepoResult};
use crate::model::original_model::{normalize_tags, OriginalModel};
use crate::model::scaled_model::ScaledModel;
use crate::model::{RecordId, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

static VARIABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid variable name regex"));

const ORIGINAL_MODEL_SELECT_SQL: &str = "SELECT
    original_model_id,
    original_model_maker,
    original_model_model,
    original_model_barcode,
    original_model_description,
    original_model_source,
    geometry_path,
    thumbnail_path
FROM original_model";

const SCALED_MODEL_SELECT_SQL: &str = "SELECT
    scaled_model_id,
    original_model_id,
    scaled_model_scale,
    acquisition_method_name
FROM scaled_model";

/// Filter for original model listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalModelQuery {
    /// Models must carry all of these tags. Empty means no tag filter.
    pub tags: Vec<String>,
}

/// Filter for scaled model listing. Filters combine with AND.
///
/// Values are trimmed before matching, as they are on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaledModelQuery {
    pub acquisition_method: Option<String>,
    /// Restrict to scaled models whose original model is in this set.
    pub model_set: Option<String>,
}

/// Repository interface for the model catalog.
pub trait CatalogRepository {
    /// Inserts an original model with its normalized tags; returns its id.
    fn insert_original_model(&self, model: &OriginalModel) -> RepoResult<RecordId>;
    fn get_original_model(&self, id: RecordId) -> RepoResult<Option<OriginalModel>>;
    fn list_original_models(&self, query: &OriginalModelQuery) -> RepoResult<Vec<OriginalModel>>;
    fn count_original_models(&self) -> RepoResult<u64>;
    /// Replaces the full tag set of one original model.
    fn set_original_model_tags(&self, id: RecordId, tags: &[String]) -> RepoResult<()>;
    fn insert_scaled_model(&self, model: &ScaledModel) -> RepoResult<RecordId>;
    fn get_scaled_model(&self, id: RecordId) -> RepoResult<Option<ScaledModel>>;
    fn list_scaled_models(&self, query: &ScaledModelQuery) -> RepoResult<Vec<ScaledModel>>;
    /// Adds one original model to a named set. Re-adding is a no-op.
    fn add_to_model_set(&self, set_name: &str, original_model_id: RecordId) -> RepoResult<()>;
    fn list_model_sets(&self) -> RepoResult<Vec<String>>;
    fn get_variable(&self, name: &str) -> RepoResult<Option<String>>;
    fn set_variable(&self, name: &str, value: &str) -> RepoResult<()>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn insert_original_model(&self, model: &OriginalModel) -> RepoResult<RecordId> {
        model.validate()?;
        let tags = normalize_tags(&model.tags)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO original_model (
                original_model_maker,
                original_model_model,
                original_model_barcode,
                original_model_description,
                original_model_source,
                geometry_path,
                thumbnail_path
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                model.maker.as_str(),
                model.model.as_str(),
                model.barcode.as_deref(),
                model.description.as_deref(),
                model.source.as_deref(),
                model.geometry_path.as_deref(),
                model.thumbnail_path.as_deref(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_tags(&tx, id, &tags)?;
        tx.commit()?;

        Ok(id)
    }

    fn get_original_model(&self, id: RecordId) -> RepoResult<Option<OriginalModel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ORIGINAL_MODEL_SELECT_SQL} WHERE original_model_id = ?1;"
        ))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_original_model_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_original_models(&self, query: &OriginalModelQuery) -> RepoResult<Vec<OriginalModel>> {
        let tags = normalize_tags(&query.tags)?;
        let mut sql = format!("{ORIGINAL_MODEL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        for tag in tags {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM original_model_tag t
                    WHERE t.original_model_id = original_model.original_model_id
                      AND t.tag = ?
                )",
            );
            bind_values.push(Value::Text(tag));
        }
        sql.push_str(" ORDER BY original_model_id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut models = Vec::new();
        while let Some(row) = rows.next()? {
            models.push(parse_original_model_row(self.conn, row)?);
        }
        Ok(models)
    }

    fn count_original_models(&self) -> RepoResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM original_model;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative original model count {count}")))
    }

    fn set_original_model_tags(&self, id: RecordId, tags: &[String]) -> RepoResult<()> {
        let tags = normalize_tags(tags)?;
        let tx = self.conn.unchecked_transaction()?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM original_model WHERE original_model_id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::NotFound {
                entity: "original model",
                id,
            });
        }

        tx.execute(
            "DELETE FROM original_model_tag WHERE original_model_id = ?1;",
            [id],
        )?;
        insert_tags(&tx, id, &tags)?;
        tx.commit()?;
        Ok(())
    }

    fn insert_scaled_model(&self, model: &ScaledModel) -> RepoResult<RecordId> {
        model.validate()?;
        if self.get_original_model(model.original_model_id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: "original model",
                id: model.original_model_id,
            });
        }

        self.conn.execute(
            "INSERT INTO scaled_model (
                original_model_id,
                scaled_model_scale,
                acquisition_method_name
            ) VALUES (?1, ?2, ?3);",
            params![
                model.original_model_id,
                model.scale,
                model.acquisition_method.trim(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_scaled_model(&self, id: RecordId) -> RepoResult<Option<ScaledModel>> {
        let model = self
            .conn
            .query_row(
                &format!("{SCALED_MODEL_SELECT_SQL} WHERE scaled_model_id = ?1;"),
                [id],
                read_scaled_model_row,
            )
            .optional()?;
        match model {
            Some(model) => {
                model.validate()?;
                Ok(Some(model))
            }
            None => Ok(None),
        }
    }

    fn list_scaled_models(&self, query: &ScaledModelQuery) -> RepoResult<Vec<ScaledModel>> {
        let mut sql = format!("{SCALED_MODEL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(method) = query.acquisition_method.as_ref() {
            sql.push_str(" AND acquisition_method_name = ?");
            bind_values.push(Value::Text(method.trim().to_string()));
        }
        if let Some(set_name) = query.model_set.as_ref() {
            sql.push_str(
                " AND original_model_id IN (
                    SELECT original_model_id
                    FROM model_set
                    WHERE model_set_name = ?
                )",
            );
            bind_values.push(Value::Text(set_name.trim().to_string()));
        }
        sql.push_str(" ORDER BY scaled_model_id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut models = Vec::new();
        while let Some(row) = rows.next()? {
            let model = read_scaled_model_row(row)?;
            model.validate()?;
            models.push(model);
        }
        Ok(models)
    }

    fn add_to_model_set(&self, set_name: &str, original_model_id: RecordId) -> RepoResult<()> {
        let set_name = set_name.trim();
        if set_name.is_empty() {
            return Err(ValidationError::EmptyField("model_set_name").into());
        }
        if self.get_original_model(original_model_id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: "original model",
                id: original_model_id,
            });
        }

        self.conn.execute(
            "INSERT OR IGNORE INTO model_set (model_set_name, original_model_id)
             VALUES (?1, ?2);",
            params![set_name, original_model_id],
        )?;
        Ok(())
    }

    fn list_model_sets(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT model_set_name FROM model_set ORDER BY model_set_name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut sets = Vec::new();
        while let Some(row) = rows.next()? {
            sets.push(row.get(0)?);
        }
        Ok(sets)
    }

    fn get_variable(&self, name: &str) -> RepoResult<Option<String>> {
        validate_variable_name(name)?;
        let value = self
            .conn
            .query_row(
                "SELECT variable_value FROM variable WHERE variable_name = ?1;",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_variable(&self, name: &str, value: &str) -> RepoResult<()> {
        validate_variable_name(name)?;
        self.conn.execute(
            "INSERT INTO variable (variable_name, variable_value) VALUES (?1, ?2)
             ON CONFLICT(variable_name) DO UPDATE SET variable_value = excluded.variable_value;",
            params![name, value],
        )?;
        Ok(())
    }
}

/// Checks that a catalog variable name is `UPPER_SNAKE` (e.g. `MODEL_ROOT`).
pub fn validate_variable_name(name: &str) -> Result<(), ValidationError> {
    if VARIABLE_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidVariableName(name.to_string()))
    }
}

fn insert_tags(conn: &Connection, original_model_id: RecordId, tags: &[String]) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO original_model_tag (original_model_id, tag) VALUES (?1, ?2);",
    )?;
    for tag in tags {
        stmt.execute(params![original_model_id, tag.as_str()])?;
    }
    Ok(())
}

fn load_tags(conn: &Connection, original_model_id: RecordId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tag
         FROM original_model_tag
         WHERE original_model_id = ?1
         ORDER BY tag ASC;",
    )?;
    let mut rows = stmt.query([original_model_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

fn parse_original_model_row(conn: &Connection, row: &Row<'_>) -> RepoResult<OriginalModel> {
    let id: RecordId = row.get("original_model_id")?;
    let model = OriginalModel {
        id: Some(id),
        maker: row.get("original_model_maker")?,
        model: row.get("original_model_model")?,
        barcode: row.get("original_model_barcode")?,
        description: row.get("original_model_description")?,
        source: row.get("original_model_source")?,
        geometry_path: row.get("geometry_path")?,
        thumbnail_path: row.get("thumbnail_path")?,
        tags: load_tags(conn, id)?,
    };
    model.validate()?;
    Ok(model)
}

fn read_scaled_model_row(row: &Row<'_>) -> rusqlite::Result<ScaledModel> {
    Ok(ScaledModel {
        id: Some(row.get("scaled_model_id")?),
        original_model_id: row.get("original_model_id")?,
        scale: row.get("scaled_model_scale")?,
        acquisition_method: row.get("acquisition_method_name")?,
    })
}

#[cfg(test)]
mod tests {
    use super::validate_variable_name;

    #[test]
    fn variable_names_must_be_upper_snake_case() {
        assert!(validate_variable_name("MODEL_ROOT").is_ok());
        assert!(validate_variable_name("DB_VERSION_2").is_ok());
        assert!(validate_variable_name("'MODEL_ROOT'").is_err());
        assert!(validate_variable_name("model_root").is_err());
        assert!(validate_variable_name("").is_err());
    }
}
