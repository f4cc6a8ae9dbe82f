//! # Geometry Kernels
//!
//! Planar geometry used by the obstacle model and the sensing pipeline:
//! point-in-polygon, nearest point of a convex polygon, segment-polygon
//! intersection (radio obstruction lengths), convex hull of the swarm and
//! polygon overlap tests (obstacle candidate filtering).
//!
//! All routines operate on the XY plane; z-components are carried through
//! untouched where vectors are returned.

// Arena and obstacle types plus their text-file loaders
pub mod arena;
// Unit tests
pub mod tests;

use crate::error::SimError;
use crate::vector::Vec3;

/// Ray-cast point-in-polygon test (odd crossing rule).
///
/// `vertices` is an ordered polygon boundary; closing edge is implicit.
pub fn point_in_polygon(point: &Vec3, vertices: &[Vec3]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (&vertices[i], &vertices[j]);
        if ((pi.y > point.y) != (pj.y > point.y))
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// True when the perpendicular foot of `point` on the line through `a`-`b`
/// falls within the segment.
fn at_shadow(a: &Vec3, b: &Vec3, point: &Vec3) -> bool {
    let edge = Vec3::new(b.x - a.x, b.y - a.y, 0.0);
    let to_point = Vec3::new(point.x - a.x, point.y - a.y, 0.0);
    let len_sq = edge.norm_squared();
    if len_sq <= 0.0 {
        return false;
    }
    let t = edge.dot(&to_point) / len_sq;
    (0.0..=1.0).contains(&t)
}

/// Unsigned XY distance from `point` to the infinite line through `a`-`b`.
fn distance_from_line_xy(point: &Vec3, a: &Vec3, b: &Vec3) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= 0.0 {
        let px = point.x - a.x;
        let py = point.y - a.y;
        return (px * px + py * py).sqrt();
    }
    ((b.y - a.y) * point.x - (b.x - a.x) * point.y + b.x * a.y - b.y * a.x).abs() / len
}

/// Nearest point of a convex polygon boundary and the signed distance to it:
/// negative when `point` lies inside the polygon, positive outside.
///
/// The nearest-vertex tracker starts from a valid index; an empty polygon
/// is rejected.
pub fn nearest_point_of_polygon(
    point: &Vec3,
    vertices: &[Vec3],
) -> Result<(Vec3, f64), SimError> {
    if vertices.is_empty() {
        return Err(SimError::Geometry(
            "nearest point requested on a polygon with no vertices".into(),
        ));
    }

    let n = vertices.len();
    let mut nearest_vertex = 0usize;
    let mut nearest_vertex_dist = f64::INFINITY;
    let mut nearest_edge: Option<usize> = None;
    let mut nearest_edge_dist = f64::INFINITY;

    for j in 0..n {
        let d = Vec3::new(point.x - vertices[j].x, point.y - vertices[j].y, 0.0).norm();
        if d < nearest_vertex_dist {
            nearest_vertex_dist = d;
            nearest_vertex = j;
        }
        let next = (j + 1) % n;
        if at_shadow(&vertices[j], &vertices[next], point) {
            let d = distance_from_line_xy(point, &vertices[j], &vertices[next]);
            if d < nearest_edge_dist {
                nearest_edge_dist = d;
                nearest_edge = Some(j);
            }
        }
    }

    let nearest = if nearest_vertex_dist <= nearest_edge_dist {
        Vec3::new(vertices[nearest_vertex].x, vertices[nearest_vertex].y, 0.0)
    } else {
        // Foot of the perpendicular on the winning edge.
        let j = nearest_edge.expect("edge distance finite implies an edge index");
        let a = &vertices[j];
        let b = &vertices[(j + 1) % n];
        let edge = Vec3::new(b.x - a.x, b.y - a.y, 0.0).normalize();
        let to_point = Vec3::new(point.x - a.x, point.y - a.y, 0.0);
        Vec3::new(a.x, a.y, 0.0) + edge * edge.dot(&to_point)
    };

    let dist = nearest_vertex_dist.min(nearest_edge_dist);
    let sign = if point_in_polygon(point, vertices) {
        -1.0
    } else {
        1.0
    };
    Ok((nearest, sign * dist))
}

/// XY intersection point of two segments, if any (proper or touching).
pub fn segment_intersection(a1: &Vec3, a2: &Vec3, b1: &Vec3, b2: &Vec3) -> Option<Vec3> {
    let r = Vec3::new(a2.x - a1.x, a2.y - a1.y, 0.0);
    let s = Vec3::new(b2.x - b1.x, b2.y - b1.y, 0.0);
    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() < 1e-12 {
        return None; // parallel or collinear
    }
    let qp = Vec3::new(b1.x - a1.x, b1.y - a1.y, 0.0);
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(Vec3::new(a1.x + t * r.x, a1.y + t * r.y, 0.0))
    } else {
        None
    }
}

/// All intersection points of a segment with a polygon boundary.
///
/// A line-of-sight segment piercing a convex obstacle yields exactly two
/// points; their separation is the obstructed path length used by the radio
/// model.
pub fn segment_polygon_intersections(p1: &Vec3, p2: &Vec3, vertices: &[Vec3]) -> Vec<Vec3> {
    let n = vertices.len();
    let mut hits = Vec::new();
    for j in 0..n {
        let next = (j + 1) % n;
        if let Some(hit) = segment_intersection(p1, p2, &vertices[j], &vertices[next]) {
            hits.push(hit);
        }
    }
    hits
}

/// Obstructed length of the line of sight `p1`-`p2` through a convex polygon
/// (zero when the segment misses it).
pub fn obstructed_length(p1: &Vec3, p2: &Vec3, vertices: &[Vec3]) -> f64 {
    let hits = segment_polygon_intersections(p1, p2, vertices);
    if hits.len() >= 2 {
        (&hits[0] - &hits[1]).xy_norm()
    } else {
        0.0
    }
}

/// Convex hull of a point set in the XY plane (Andrew's monotone chain),
/// counter-clockwise, without the repeated closing point.
pub fn convex_hull(points: &[Vec3]) -> Vec<Vec3> {
    let mut pts: Vec<Vec3> = points.to_vec();
    pts.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    pts.dedup_by(|a, b| a.x == b.x && a.y == b.y);
    let n = pts.len();
    if n < 3 {
        return pts;
    }

    let cross = |o: &Vec3, a: &Vec3, b: &Vec3| -> f64 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    };

    let mut hull: Vec<Vec3> = Vec::with_capacity(2 * n);
    for p in pts.iter() {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}

/// True when two polygons overlap: any boundary edges intersect, or either
/// contains a vertex of the other.
pub fn polygons_intersect(a: &[Vec3], b: &[Vec3]) -> bool {
    let na = a.len();
    let nb = b.len();
    if na == 0 || nb == 0 {
        return false;
    }
    for i in 0..na {
        for j in 0..nb {
            if segment_intersection(&a[i], &a[(i + 1) % na], &b[j], &b[(j + 1) % nb]).is_some() {
                return true;
            }
        }
    }
    point_in_polygon(&a[0], b) || point_in_polygon(&b[0], a)
}

/// Convexity check for an ordered polygon: all cross products of consecutive
/// edges share a sign (collinear runs are tolerated).
pub fn is_convex(vertices: &[Vec3]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    for i in 0..n {
        let a = &vertices[i];
        let b = &vertices[(i + 1) % n];
        let c = &vertices[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross.abs() < 1e-12 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Arithmetic centroid of a vertex set.
pub fn centroid(vertices: &[Vec3]) -> Vec3 {
    if vertices.is_empty() {
        return Vec3::zero();
    }
    let mut c = Vec3::zero();
    for v in vertices {
        c += *v;
    }
    c / vertices.len() as f64
}
