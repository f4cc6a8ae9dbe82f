//! Run-result persistence.
//!
//! Results are stored as bincode for compact round-trips and can be exported
//! as JSON for external tooling. File naming follows `{tag}-{seed}.bin`
//! inside the chosen output directory.

use super::SimulationResult;
use crate::error::SimError;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

fn result_path(dir: &Path, tag: &str, seed: u64) -> PathBuf {
    dir.join(format!("{tag}-{seed}.bin"))
}

/// Saves a result under `dir/{tag}-{seed}.bin`, creating the directory.
pub fn save_result(
    dir: &Path,
    tag: &str,
    seed: u64,
    result: &SimulationResult,
) -> Result<PathBuf, SimError> {
    fs::create_dir_all(dir)?;
    let path = result_path(dir, tag, seed);
    let writer = BufWriter::new(File::create(&path)?);
    bincode::serialize_into(writer, result)
        .map_err(|e| SimError::Config(format!("serialize {}: {e}", path.display())))?;
    Ok(path)
}

/// Loads a result previously written by [`save_result`].
pub fn load_result(dir: &Path, tag: &str, seed: u64) -> Result<SimulationResult, SimError> {
    let path = result_path(dir, tag, seed);
    let reader = BufReader::new(File::open(&path)?);
    bincode::deserialize_from(reader)
        .map_err(|e| SimError::Config(format!("deserialize {}: {e}", path.display())))
}

/// Writes the JSON export next to the binary result.
pub fn export_json(dir: &Path, tag: &str, seed: u64, result: &SimulationResult) -> Result<PathBuf, SimError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{tag}-{seed}.json"));
    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer(writer, result)
        .map_err(|e| SimError::Config(format!("export {}: {e}", path.display())))?;
    Ok(path)
}
