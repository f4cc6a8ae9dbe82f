//! Error taxonomy of the simulation core.
//!
//! Saturations (velocity, acceleration) and empty neighbourhoods are handled
//! locally and never appear here. Everything else aborts the run with a
//! diagnostic naming the offending parameter, file location or tick index.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of the simulation core.
#[derive(Error, Debug)]
pub enum SimError {
    /// A configuration value fell outside its documented [min, max] range,
    /// or a structural constraint (N >= 1, DeltaT > 0, Dim in {2,3}) failed.
    #[error("configuration error: parameter `{name}` = {value} outside [{min}, {max}]")]
    ConfigRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("configuration error: {0}")]
    Config(String),

    /// Arena or obstacle file could not be parsed.
    #[error("file format error in {path} (line {line}): {reason}")]
    FileFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Degenerate geometry input (empty polygon, non-convex obstacle).
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Eigensolver failure or NaN contaminating the dynamics.
    #[error("numerical breakdown at tick {tick}: {reason}")]
    Numerical { tick: u64, reason: String },

    /// Short read/write on the co-simulation channel, or any other stream
    /// failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ipc framing error: {0}")]
    IpcFrame(String),
}
