//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `household_objects_core` linkage without other runtime setup.
//! - Print a short catalog summary when given a database path.

use household_objects_core::{core_version, ObjectsDatabase, ObjectsDbError};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("household_objects_core version={}", core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match summarize(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(path: &str) -> Result<(), ObjectsDbError> {
    let db = ObjectsDatabase::open(path)?;
    println!("original_models={}", db.get_num_original_models()?);
    println!("scaled_models={}", db.get_scaled_models_list()?.len());
    match db.get_model_root() {
        Ok(root) => println!("model_root={root}"),
        Err(ObjectsDbError::VariableNotSet(_)) => println!("model_root=<unset>"),
        Err(err) => return Err(err),
    }
    Ok(())
}
