use dotenvy::{dotenv, from_filename, var};
use std::path::PathBuf;

use super::constants::DEFAULT_DATA_DIR;

pub fn check_for_env_variables() {
    match get_env_variable("PROJECT_ROOT") {
        Some(root) => println!("Project root set to {} ✅", root),
        None => println!("PROJECT_ROOT not set, using the current directory ⚠️"),
    };
    match get_env_variable("DATA_DIR") {
        Some(dir) => println!("Data directory set to {} ✅", dir),
        None => println!("DATA_DIR not set, writing to {} ⚠️", DEFAULT_DATA_DIR),
    };
    match get_env_variable("HOLDINGS_COMMAND") {
        Some(_) => println!("Holdings command set ✅"),
        None => println!("HOLDINGS_COMMAND not set, falling back to the mix query ⚠️"),
    };
}

pub fn get_env_variable(variable_to_get: &str) -> Option<String> {
    let environment = var("RUST_ENV").unwrap_or_else(|_| "development".into());

    match environment.as_str() {
        "development" => from_filename(".env.dev").ok(),
        "production" => from_filename(".env.prod").ok(),
        _ => dotenv().ok(),
    };
    var(variable_to_get).ok().filter(|value| !value.is_empty())
}

pub fn project_root() -> PathBuf {
    get_env_variable("PROJECT_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn data_dir() -> PathBuf {
    project_root().join(get_env_variable("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()))
}
