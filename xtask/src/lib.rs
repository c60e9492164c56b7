pub mod tasks;

use std::{
    path::{Path, PathBuf},
    process::Command,
};

pub type DynError = Box<dyn std::error::Error>;

pub fn project_root() -> PathBuf {
    Path::new(&env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .unwrap()
        .to_path_buf()
}

pub fn dist_dir() -> PathBuf {
    project_root().join("target/dist")
}

pub fn check_nextest_exists() -> Result<(), DynError> {
    let status = Command::new("cargo")
        .current_dir(project_root())
        .args(["nextest", "--version"])
        .status();

    match status {
        Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(
                "Error: 'cargo nextest' is not found on the PATH. Please install it to continue."
                    .into(),
            );
        }
        Err(e) => return Err(format!("An unknown error occurred: {}", e).into()),
        Ok(status) if !status.success() => {
            return Err("Error: 'cargo nextest' is not installed.".into());
        }
        _ => {}
    };

    Ok(())
}

pub fn check_tarpaulin_exists() -> Result<(), DynError> {
    let status = Command::new("cargo")
        .current_dir(project_root())
        .args(["tarpaulin", "--version"])
        .status();

    match status {
        Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(
                "Error: 'cargo tarpaulin' is not found on the PATH. Please install it to continue."
                    .into(),
            );
        }
        Err(e) => return Err(format!("An unknown error occurred: {}", e).into()),
        Ok(status) if !status.success() => {
            return Err("Error: 'cargo tarpaulin' is not installed.".into());
        }
        _ => {}
    };

    Ok(())
}
