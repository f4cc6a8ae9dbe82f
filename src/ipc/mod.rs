//! # Co-Simulation Channel
//!
//! Length-prefixed binary framing over a local byte stream: each frame is a
//! 4-byte little-endian byte count followed by the payload. Per tick the
//! radio oracle sends two `N×N` matrices of IEEE-754 doubles (little
//! endian): the neighbour-ID matrix (sentinel −1) and the link-power matrix
//! in dBm (sentinel −∞).
//!
//! Any short read or write is fatal to the tick loop; there is no resync.

use crate::error::SimError;
use crate::phase::NO_NEIGHBOUR;
use crate::sensing::OracleRows;
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;

/// Writes one length-prefixed frame.
pub fn send_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), SimError> {
    let len = u32::try_from(payload.len())
        .map_err(|_| SimError::IpcFrame("frame exceeds u32 length prefix".into()))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Reads one length-prefixed frame in full.
pub fn recv_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, SimError> {
    let mut prefix = [0u8; 4];
    reader.read_exact(&mut prefix)?;
    let len = u32::from_le_bytes(prefix) as usize;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Serialises an `n×n` matrix row-major as little-endian doubles.
pub fn send_matrix<W: Write>(writer: &mut W, matrix: &[Vec<f64>]) -> Result<(), SimError> {
    let n = matrix.len();
    let mut payload = Vec::with_capacity(n * n * 8);
    for row in matrix {
        if row.len() != n {
            return Err(SimError::IpcFrame(format!(
                "ragged matrix: row of {} in an {n}x{n} frame",
                row.len()
            )));
        }
        for value in row {
            payload.extend_from_slice(&value.to_le_bytes());
        }
    }
    send_frame(writer, &payload)
}

/// Receives an `n×n` double matrix, validating the frame size exactly.
pub fn recv_matrix<R: Read>(reader: &mut R, n: usize) -> Result<Vec<Vec<f64>>, SimError> {
    let payload = recv_frame(reader)?;
    let expected = n * n * 8;
    if payload.len() != expected {
        return Err(SimError::IpcFrame(format!(
            "expected {expected} bytes for an {n}x{n} matrix, got {}",
            payload.len()
        )));
    }
    let mut matrix = vec![vec![0.0; n]; n];
    for (idx, chunk) in payload.chunks_exact(8).enumerate() {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        matrix[idx / n][idx % n] = f64::from_le_bytes(bytes);
    }
    Ok(matrix)
}

/// Stream wrapper exchanging the per-tick oracle matrices.
pub struct CosimChannel<S: Read + Write> {
    stream: S,
    n: usize,
}

impl CosimChannel<UnixStream> {
    /// Connects to an oracle serving on a Unix-domain socket.
    pub fn connect(path: &Path, n: usize) -> Result<Self, SimError> {
        let stream = UnixStream::connect(path)?;
        Ok(CosimChannel { stream, n })
    }

    /// Binds a socket and waits for a single peer (oracle side).
    pub fn serve(path: &Path, n: usize) -> Result<Self, SimError> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        let listener = UnixListener::bind(path)?;
        let (stream, _addr) = listener.accept()?;
        Ok(CosimChannel { stream, n })
    }
}

impl<S: Read + Write> CosimChannel<S> {
    pub fn new(stream: S, n: usize) -> Self {
        CosimChannel { stream, n }
    }

    /// Receives one tick's neighbour and link-power matrices and splits them
    /// into per-agent oracle rows.
    pub fn recv_tick(&mut self) -> Result<Vec<OracleRows>, SimError> {
        let neighbours = recv_matrix(&mut self.stream, self.n)?;
        let powers = recv_matrix(&mut self.stream, self.n)?;
        Ok(neighbours
            .into_iter()
            .zip(powers)
            .map(|(neighbour_row, power_row)| OracleRows {
                neighbours: neighbour_row
                    .into_iter()
                    .map(|id| if id.is_finite() && id >= 0.0 {
                        id as i64
                    } else {
                        NO_NEIGHBOUR
                    })
                    .collect(),
                powers: power_row,
            })
            .collect())
    }

    /// Sends one tick's matrices (oracle side).
    pub fn send_tick(
        &mut self,
        neighbours: &[Vec<f64>],
        powers: &[Vec<f64>],
    ) -> Result<(), SimError> {
        send_matrix(&mut self.stream, neighbours)?;
        send_matrix(&mut self.stream, powers)
    }
}
