//! Arena and obstacle descriptions.
//!
//! Both are read-only after load. The arena file may describe several arenas
//! (one per shape); the active one is selected by the `ArenaShape` parameter.
//!
//! Arena file format (UTF-8 text, whitespace separated):
//! ```text
//! shape: disc
//! center: 0 0
//! radius: 62500
//! shape: square
//! center: 0 0
//! side: 62500
//! ```
//!
//! Obstacle file format: records of a vertex count followed by that many
//! `x y` lines describing a convex polygon.

use crate::error::SimError;
use crate::geometry::{centroid, is_convex};
use crate::vector::Vec3;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Flight arena: a disc or an axis-aligned square, both parameterised by a
/// centre and a radius (half side length for the square).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Arena {
    Disc { center: Vec3, radius: f64 },
    Square { center: Vec3, radius: f64 },
}

impl Arena {
    pub fn center(&self) -> Vec3 {
        match self {
            Arena::Disc { center, .. } | Arena::Square { center, .. } => *center,
        }
    }

    pub fn radius(&self) -> f64 {
        match self {
            Arena::Disc { radius, .. } | Arena::Square { radius, .. } => *radius,
        }
    }
}

/// A convex 2D obstacle polygon with its centre point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub vertices: Vec<Vec3>,
    pub center: Vec3,
}

impl Obstacle {
    /// Builds an obstacle, rejecting polygons that are not convex or have
    /// fewer than three vertices.
    pub fn new(vertices: Vec<Vec3>) -> Result<Self, SimError> {
        if vertices.len() < 3 {
            return Err(SimError::Geometry(format!(
                "obstacle polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if !is_convex(&vertices) {
            return Err(SimError::Geometry(
                "obstacle polygon is not convex".into(),
            ));
        }
        let center = centroid(&vertices);
        Ok(Obstacle { vertices, center })
    }
}

fn format_err(path: &Path, line: usize, reason: impl Into<String>) -> SimError {
    SimError::FileFormat {
        path: PathBuf::from(path),
        line,
        reason: reason.into(),
    }
}

/// Parses an arena file into the list of described arenas.
pub fn load_arenas(path: &Path) -> Result<Vec<Arena>, SimError> {
    let text = fs::read_to_string(path).map_err(|e| format_err(path, 0, e.to_string()))?;
    parse_arenas(&text, path)
}

fn parse_arenas(text: &str, path: &Path) -> Result<Vec<Arena>, SimError> {
    let mut arenas = Vec::new();
    let mut shape: Option<&str> = None;
    let mut center: Option<Vec3> = None;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let lineno = lineno + 1;
        let (key, rest) = line
            .split_once(':')
            .ok_or_else(|| format_err(path, lineno, "expected `key: value`"))?;
        let rest = rest.trim();
        match key.trim() {
            "shape" => match rest {
                "disc" | "square" => shape = Some(if rest == "disc" { "disc" } else { "square" }),
                other => {
                    return Err(format_err(
                        path,
                        lineno,
                        format!("unknown arena shape `{other}`"),
                    ));
                }
            },
            "center" => {
                let mut it = rest.split_whitespace();
                let x: f64 = it
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| format_err(path, lineno, "bad center x"))?;
                let y: f64 = it
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| format_err(path, lineno, "bad center y"))?;
                center = Some(Vec3::new(x, y, 0.0));
            }
            "radius" | "side" => {
                let value: f64 = rest
                    .parse()
                    .map_err(|_| format_err(path, lineno, "bad radius/side value"))?;
                if value <= 0.0 {
                    return Err(format_err(path, lineno, "radius/side must be positive"));
                }
                let c = center
                    .take()
                    .ok_or_else(|| format_err(path, lineno, "radius before center"))?;
                match shape.take() {
                    Some("disc") => arenas.push(Arena::Disc {
                        center: c,
                        radius: value,
                    }),
                    Some("square") => arenas.push(Arena::Square {
                        center: c,
                        // a `side` record carries the full edge length
                        radius: if key.trim() == "side" {
                            value / 2.0
                        } else {
                            value
                        },
                    }),
                    _ => return Err(format_err(path, lineno, "radius before shape")),
                }
            }
            other => {
                return Err(format_err(
                    path,
                    lineno,
                    format!("unknown arena key `{other}`"),
                ));
            }
        }
    }

    if arenas.is_empty() {
        return Err(format_err(path, 0, "arena file describes no arena"));
    }
    info!("loaded {} arena(s) from {}", arenas.len(), path.display());
    Ok(arenas)
}

/// Selects the active arena for the configured shape (0 = disc, 1 = square);
/// falls back to the first arena when no shape matches.
pub fn select_arena(arenas: &[Arena], shape: u32) -> Arena {
    arenas
        .iter()
        .find(|a| match (a, shape) {
            (Arena::Disc { .. }, 0) => true,
            (Arena::Square { .. }, 1) => true,
            _ => false,
        })
        .copied()
        .unwrap_or(arenas[0])
}

/// Parses an obstacle file into its convex polygons.
pub fn load_obstacles(path: &Path) -> Result<Vec<Obstacle>, SimError> {
    let text = fs::read_to_string(path).map_err(|e| format_err(path, 0, e.to_string()))?;
    parse_obstacles(&text, path)
}

fn parse_obstacles(text: &str, path: &Path) -> Result<Vec<Obstacle>, SimError> {
    let mut obstacles = Vec::new();
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

    while let Some((lineno, header)) = lines.next() {
        let count: usize = header
            .parse()
            .map_err(|_| format_err(path, lineno, "expected vertex count"))?;
        if count < 3 {
            return Err(format_err(path, lineno, "polygon needs >= 3 vertices"));
        }
        let mut vertices = Vec::with_capacity(count);
        for _ in 0..count {
            let (vline, body) = lines
                .next()
                .ok_or_else(|| format_err(path, lineno, "truncated vertex list"))?;
            let mut it = body.split_whitespace();
            let x: f64 = it
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or_else(|| format_err(path, vline, "bad vertex x"))?;
            let y: f64 = it
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or_else(|| format_err(path, vline, "bad vertex y"))?;
            vertices.push(Vec3::new(x, y, 0.0));
        }
        obstacles.push(Obstacle::new(vertices)?);
    }

    info!(
        "loaded {} obstacle(s) from {}",
        obstacles.len(),
        path.display()
    );
    Ok(obstacles)
}

#[cfg(test)]
pub(crate) fn parse_arenas_str(text: &str) -> Result<Vec<Arena>, SimError> {
    parse_arenas(text, Path::new("<inline>"))
}

#[cfg(test)]
pub(crate) fn parse_obstacles_str(text: &str) -> Result<Vec<Obstacle>, SimError> {
    parse_obstacles(text, Path::new("<inline>"))
}
