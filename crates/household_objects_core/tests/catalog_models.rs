use household_objects_core::{
    CatalogRepository, ObjectsDatabase, ObjectsDbError, OriginalModel, RepoError, ScaledModel,
    ValidationError,
};

fn seed_model(db: &ObjectsDatabase, maker: &str, model: &str, tags: &[&str]) -> i64 {
    let record = OriginalModel::new(maker, model).with_tags(tags.iter().copied());
    db.catalog().unwrap().insert_original_model(&record).unwrap()
}

fn seed_scaled(db: &ObjectsDatabase, original_model_id: i64, method: &str) -> i64 {
    db.catalog()
        .unwrap()
        .insert_scaled_model(&ScaledModel::new(original_model_id, method))
        .unwrap()
}

#[test]
fn original_models_roundtrip_with_normalized_tags() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let mut record = OriginalModel::new("Campbell's", "tomato soup")
        .with_tags([" can ", "food", "can"]);
    record.barcode = Some("051000012616".to_string());
    record.geometry_path = Some("campbells/soup.ply".to_string());
    let id = db.catalog().unwrap().insert_original_model(&record).unwrap();

    let models = db.get_original_models_list().unwrap();
    assert_eq!(models.len(), 1);
    let loaded = &models[0];
    assert_eq!(loaded.id, Some(id));
    assert_eq!(loaded.maker, "Campbell's");
    assert_eq!(loaded.barcode.as_deref(), Some("051000012616"));
    assert_eq!(loaded.geometry_path.as_deref(), Some("campbells/soup.ply"));
    assert_eq!(loaded.tags, vec!["can".to_string(), "food".to_string()]);
}

#[test]
fn num_original_models_counts_rows() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    assert_eq!(db.get_num_original_models().unwrap(), 0);

    seed_model(&db, "a", "one", &[]);
    seed_model(&db, "b", "two", &[]);
    seed_model(&db, "c", "three", &[]);
    assert_eq!(db.get_num_original_models().unwrap(), 3);
}

#[test]
fn models_by_tags_require_every_tag() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let mug = seed_model(&db, "ikea", "mug", &["kitchen", "container"]);
    let bowl = seed_model(&db, "ikea", "bowl", &["kitchen", "container", "round"]);
    seed_model(&db, "acme", "hammer", &["tool"]);

    let kitchen: Vec<_> = db
        .get_models_list_by_tags(&["kitchen".to_string()])
        .unwrap()
        .into_iter()
        .filter_map(|model| model.id)
        .collect();
    assert_eq!(kitchen, vec![mug, bowl]);

    let round_containers: Vec<_> = db
        .get_models_list_by_tags(&["container".to_string(), "round".to_string()])
        .unwrap()
        .into_iter()
        .filter_map(|model| model.id)
        .collect();
    assert_eq!(round_containers, vec![bowl]);

    let none = db
        .get_models_list_by_tags(&["kitchen".to_string(), "tool".to_string()])
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn models_by_tags_with_no_tags_lists_everything() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    seed_model(&db, "a", "one", &["x"]);
    seed_model(&db, "b", "two", &[]);

    assert_eq!(db.get_models_list_by_tags(&[]).unwrap().len(), 2);
}

#[test]
fn tag_values_are_bound_not_spliced() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    seed_model(&db, "a", "one", &["plain"]);

    let hostile = "x' = ANY (original_model_tags) OR '1'='1".to_string();
    let models = db.get_models_list_by_tags(&[hostile]).unwrap();
    assert!(models.is_empty());
}

#[test]
fn set_original_model_tags_replaces_full_set() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let id = seed_model(&db, "a", "one", &["old", "stale"]);
    let catalog = db.catalog().unwrap();

    catalog
        .set_original_model_tags(id, &["fresh".to_string()])
        .unwrap();
    let loaded = catalog.get_original_model(id).unwrap().unwrap();
    assert_eq!(loaded.tags, vec!["fresh".to_string()]);

    let err = catalog
        .set_original_model_tags(id, &["  ".to_string()])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidTag(_))
    ));
    let unchanged = catalog.get_original_model(id).unwrap().unwrap();
    assert_eq!(unchanged.tags, vec!["fresh".to_string()]);

    let missing = catalog
        .set_original_model_tags(9_999, &["x".to_string()])
        .unwrap_err();
    assert!(matches!(missing, RepoError::NotFound { id: 9_999, .. }));
}

#[test]
fn scaled_models_filter_by_acquisition_method() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let original = seed_model(&db, "a", "one", &[]);
    let scanned = seed_scaled(&db, original, "IRCS_SCANNER");
    let modeled = seed_scaled(&db, original, "3DSOM");

    let all: Vec<_> = db
        .get_scaled_models_list()
        .unwrap()
        .into_iter()
        .filter_map(|model| model.id)
        .collect();
    assert_eq!(all, vec![scanned, modeled]);

    let by_method = db.get_scaled_models_by_acquisition("3DSOM").unwrap();
    assert_eq!(by_method.len(), 1);
    assert_eq!(by_method[0].id, Some(modeled));
    assert_eq!(by_method[0].acquisition_method, "3DSOM");
    assert_eq!(by_method[0].scale, 1.0);

    assert!(db
        .get_scaled_models_by_acquisition("UNKNOWN")
        .unwrap()
        .is_empty());
}

#[test]
fn scaled_models_filter_by_model_set() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let in_set = seed_model(&db, "a", "one", &[]);
    let out_of_set = seed_model(&db, "b", "two", &[]);
    let scaled_in = seed_scaled(&db, in_set, "3DSOM");
    seed_scaled(&db, out_of_set, "3DSOM");

    let catalog = db.catalog().unwrap();
    catalog.add_to_model_set("REDUCED_MODEL_SET", in_set).unwrap();
    catalog.add_to_model_set("REDUCED_MODEL_SET", in_set).unwrap();
    assert_eq!(
        catalog.list_model_sets().unwrap(),
        vec!["REDUCED_MODEL_SET".to_string()]
    );

    let in_set_models = db.get_scaled_models_by_set("REDUCED_MODEL_SET").unwrap();
    assert_eq!(in_set_models.len(), 1);
    assert_eq!(in_set_models[0].id, Some(scaled_in));

    assert!(db.get_scaled_models_by_set("MISSING_SET").unwrap().is_empty());
    assert_eq!(db.get_scaled_models_by_set("").unwrap().len(), 2);
}

#[test]
fn scaled_model_filters_ignore_surrounding_whitespace() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let original = seed_model(&db, "a", "one", &[]);
    let scaled = seed_scaled(&db, original, " 3DSOM ");
    db.catalog()
        .unwrap()
        .add_to_model_set(" REDUCED_MODEL_SET ", original)
        .unwrap();

    let by_method = db.get_scaled_models_by_acquisition("3DSOM ").unwrap();
    assert_eq!(by_method.len(), 1);
    assert_eq!(by_method[0].id, Some(scaled));
    assert_eq!(by_method[0].acquisition_method, "3DSOM");

    let by_set = db.get_scaled_models_by_set("  REDUCED_MODEL_SET").unwrap();
    assert_eq!(by_set.len(), 1);
    assert_eq!(by_set[0].id, Some(scaled));

    assert_eq!(db.get_scaled_models_by_set("   ").unwrap().len(), 1);
}

#[test]
fn stored_scaled_model_with_zero_scale_is_rejected_on_read() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let original = seed_model(&db, "a", "one", &[]);
    let scaled = seed_scaled(&db, original, "3DSOM");
    db.connection()
        .execute(
            "UPDATE scaled_model SET scaled_model_scale = 0 WHERE scaled_model_id = ?1;",
            [scaled],
        )
        .unwrap();

    let err = db.catalog().unwrap().get_scaled_model(scaled).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::NonPositiveScale(scale)) if scale == 0.0
    ));

    let err = db.get_scaled_models_list().unwrap_err();
    assert!(matches!(
        err,
        ObjectsDbError::Repo(RepoError::Validation(ValidationError::NonPositiveScale(_)))
    ));

    let err = db.get_scaled_model_mesh(scaled).unwrap_err();
    match err {
        ObjectsDbError::MeshLoad {
            scaled_model_id,
            original_model_id,
            source: RepoError::Validation(_),
        } => {
            assert_eq!(scaled_model_id, scaled);
            assert_eq!(original_model_id, None);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn scaled_model_requires_existing_original_model() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let err = db
        .catalog()
        .unwrap()
        .insert_scaled_model(&ScaledModel::new(42, "3DSOM"))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 42, .. }));
}

#[test]
fn model_root_reads_catalog_variable() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let err = db.get_model_root().unwrap_err();
    assert!(matches!(err, ObjectsDbError::VariableNotSet("MODEL_ROOT")));

    let catalog = db.catalog().unwrap();
    catalog.set_variable("MODEL_ROOT", "/data/models").unwrap();
    assert_eq!(db.get_model_root().unwrap(), "/data/models");

    catalog.set_variable("MODEL_ROOT", "/mnt/models").unwrap();
    assert_eq!(db.get_model_root().unwrap(), "/mnt/models");
}

#[test]
fn variable_names_are_validated() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let err = db
        .catalog()
        .unwrap()
        .set_variable("'MODEL_ROOT'", "/x")
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidVariableName(_))
    ));
}
