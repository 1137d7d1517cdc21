use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

/// A PDF found in the input directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
}

impl PdfFile {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

pub fn create_dir_if_nonexistent(directory_path: &Path) -> anyhow::Result<()> {
    if !directory_path.exists() {
        fs::create_dir_all(directory_path)?;
        debug!("Folder created at: {:?}", directory_path);
    }
    Ok(())
}

/// `*.pdf` files directly inside `directory_path`, sorted by name.
pub fn list_pdf_files(directory_path: &Path) -> anyhow::Result<Vec<PdfFile>> {
    let mut files = vec![];
    for entry in WalkDir::new(directory_path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.ends_with(".pdf") {
            continue;
        }
        files.push(PdfFile {
            path: entry.path().to_path_buf(),
            name,
            size_bytes: entry.metadata()?.len(),
        });
    }
    Ok(files)
}

/// Writes `data` as pretty printed JSON (two space indent), creating parent folders.
pub fn save_json<T>(data: &T, output_path: &Path) -> anyhow::Result<()>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = output_path.parent() {
        create_dir_if_nonexistent(parent)?;
    }
    let json_data = serde_json::to_string_pretty(data)?;
    fs::write(output_path, json_data)?;
    Ok(())
}
