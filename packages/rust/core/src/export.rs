//! JSON and plain-text exports written to the output directory.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use lexcore_shared::{LexCoreError, Result};

pub const CORE_UNITS_FILE: &str = "core_units.json";
pub const CODE_UNITS_FILE: &str = "code_units.json";
pub const EXAMPLE_BANK_FILE: &str = "example_bank.json";
pub const SKIPPED_FILE: &str = "skipped.txt";

/// Write `contents` to `path` atomically (write to temp, then rename).
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LexCoreError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));
    std::fs::write(&temp, contents).map_err(|e| LexCoreError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| LexCoreError::io(path, e))?;
    Ok(())
}

/// Serialize `data` as pretty JSON into `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| LexCoreError::validation(format!("JSON serialization failed: {e}")))?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Append to the skipped-term log: one raw term per line.
///
/// Earlier runs' entries are kept. The file is created when missing.
pub fn write_skipped(path: &Path, skipped: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LexCoreError::io(parent, e))?;
    }

    let mut out = String::new();
    for term in skipped {
        out.push_str(term);
        out.push('\n');
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LexCoreError::io(path, e))?;
    file.write_all(out.as_bytes()).map_err(|e| LexCoreError::io(path, e))?;
    debug!(path = %path.display(), terms = skipped.len(), "appended to skipped log");
    Ok(())
}

/// Paths of the files a run exports under `output_dir`.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub core_units: PathBuf,
    pub code_units: PathBuf,
    pub example_bank: PathBuf,
    pub skipped: PathBuf,
}

impl ExportPaths {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            core_units: output_dir.join(CORE_UNITS_FILE),
            code_units: output_dir.join(CODE_UNITS_FILE),
            example_bank: output_dir.join(EXAMPLE_BANK_FILE),
            skipped: output_dir.join(SKIPPED_FILE),
        }
    }
}
