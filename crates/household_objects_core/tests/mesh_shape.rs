use household_objects_core::{
    CatalogRepository, Mesh, MeshRepository, ObjectsDatabase, ObjectsDbError, OriginalModel,
    Point, RepoError, ScaledModel, ShapeKind, ValidationError,
};

fn seed_models(db: &ObjectsDatabase) -> (i64, i64) {
    let catalog = db.catalog().unwrap();
    let original = catalog
        .insert_original_model(&OriginalModel::new("ikea", "mug"))
        .unwrap();
    let scaled = catalog
        .insert_scaled_model(&ScaledModel::new(original, "3DSOM"))
        .unwrap();
    (original, scaled)
}

fn unit_triangle(original_model_id: i64) -> Mesh {
    Mesh::new(
        original_model_id,
        vec![0, 1, 2],
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
    )
}

#[test]
fn scaled_model_mesh_resolves_through_original_model() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let (original, scaled) = seed_models(&db);
    db.meshes().unwrap().save_mesh(&unit_triangle(original)).unwrap();

    let mesh = db.get_scaled_model_mesh(scaled).unwrap();
    assert_eq!(mesh.original_model_id, original);
    assert_eq!(mesh.triangles, vec![0, 1, 2]);
    assert_eq!(mesh.vertices.len(), 9);
}

#[test]
fn scaled_model_shape_groups_vertices() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let (original, scaled) = seed_models(&db);
    db.meshes().unwrap().save_mesh(&unit_triangle(original)).unwrap();

    let shape = db.get_scaled_model_shape(scaled).unwrap();
    assert_eq!(shape.kind, ShapeKind::Mesh);
    assert_eq!(shape.triangles, vec![0, 1, 2]);
    assert_eq!(
        shape.vertices,
        vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ]
    );
}

#[test]
fn save_mesh_replaces_existing_mesh() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let (original, scaled) = seed_models(&db);
    let meshes = db.meshes().unwrap();
    meshes.save_mesh(&unit_triangle(original)).unwrap();
    meshes
        .save_mesh(&Mesh::new(original, Vec::new(), vec![5.0, 5.0, 5.0]))
        .unwrap();

    let shape = db.get_scaled_model_shape(scaled).unwrap();
    assert!(shape.triangles.is_empty());
    assert_eq!(shape.vertices, vec![Point::new(5.0, 5.0, 5.0)]);
}

#[test]
fn unknown_scaled_model_is_reported() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let err = db.get_scaled_model_mesh(404).unwrap_err();
    assert!(matches!(err, ObjectsDbError::ScaledModelNotFound(404)));
}

#[test]
fn missing_mesh_reports_both_model_ids() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let (original, scaled) = seed_models(&db);

    let err = db.get_scaled_model_shape(scaled).unwrap_err();
    match err {
        ObjectsDbError::MeshNotFound {
            scaled_model_id,
            original_model_id,
        } => {
            assert_eq!(scaled_model_id, scaled);
            assert_eq!(original_model_id, original);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_stored_vertices_fail_shape_conversion() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let (original, scaled) = seed_models(&db);
    db.connection()
        .execute(
            "INSERT INTO mesh (original_model_id, mesh_triangles, mesh_vertices)
             VALUES (?1, '[]', '[1.0, 2.0, 3.0, 4.0]');",
            [original],
        )
        .unwrap();

    let mesh = db.get_scaled_model_mesh(scaled).unwrap();
    assert_eq!(mesh.vertices.len(), 4);

    let err = db.get_scaled_model_shape(scaled).unwrap_err();
    assert!(matches!(
        err,
        ObjectsDbError::InvalidMesh {
            source: ValidationError::VertexCountNotMultipleOfThree(4),
            ..
        }
    ));
}

#[test]
fn save_mesh_rejects_invalid_geometry() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let (original, _) = seed_models(&db);

    let err = db
        .meshes()
        .unwrap()
        .save_mesh(&Mesh::new(original, vec![0, 1, 9], vec![0.0; 9]))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::TriangleIndexOutOfRange { index: 9, .. })
    ));
}

#[test]
fn unreadable_stored_mesh_reports_both_model_ids() {
    let db = ObjectsDatabase::open_in_memory().unwrap();
    let (original, scaled) = seed_models(&db);
    db.connection()
        .execute(
            "INSERT INTO mesh (original_model_id, mesh_triangles, mesh_vertices)
             VALUES (?1, '[0,1', '[]');",
            [original],
        )
        .unwrap();

    let err = db.get_scaled_model_mesh(scaled).unwrap_err();
    match err {
        ObjectsDbError::MeshLoad {
            scaled_model_id,
            original_model_id,
            source: RepoError::InvalidData(message),
        } => {
            assert_eq!(scaled_model_id, scaled);
            assert_eq!(original_model_id, Some(original));
            assert!(message.contains("mesh_triangles"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
