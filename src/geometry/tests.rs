#[cfg(test)]
mod units {
    use crate::geometry::arena::{
        parse_arenas_str, parse_obstacles_str, select_arena, Arena, Obstacle,
    };
    use crate::geometry::*;
    use crate::vector::Vec3;

    fn unit_square() -> Vec<Vec3> {
        vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ]
    }

    #[test]
    fn point_in_polygon_inside_outside_and_degenerate() {
        let square = unit_square();
        assert!(point_in_polygon(&Vec3::zero(), &square));
        assert!(!point_in_polygon(&Vec3::new(2.0, 0.0, 0.0), &square));
        assert!(!point_in_polygon(&Vec3::zero(), &square[..2]));
    }

    #[test]
    fn nearest_point_signed_distance() {
        let square = unit_square();
        // Outside, closest to the right edge.
        let (p, d) = nearest_point_of_polygon(&Vec3::new(2.0, 0.0, 0.0), &square).unwrap();
        assert!(p.approx_eq(&Vec3::new(0.5, 0.0, 0.0), 1e-9));
        assert!((d - 1.5).abs() < 1e-9);
        // Inside: distance is negative.
        let (_, d) = nearest_point_of_polygon(&Vec3::new(0.1, 0.0, 0.0), &square).unwrap();
        assert!(d < 0.0);
        assert!((d + 0.4).abs() < 1e-9);
        // Outside near a corner: the vertex wins.
        let (p, _) = nearest_point_of_polygon(&Vec3::new(2.0, 2.0, 0.0), &square).unwrap();
        assert!(p.approx_eq(&Vec3::new(0.5, 0.5, 0.0), 1e-9));
    }

    #[test]
    fn nearest_point_rejects_empty_polygon() {
        assert!(nearest_point_of_polygon(&Vec3::zero(), &[]).is_err());
    }

    #[test]
    fn obstruction_length_through_square() {
        let square = unit_square();
        let a = Vec3::new(-2.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 0.0, 0.0);
        // The chord across the unit square has length 1.
        assert!((obstructed_length(&a, &b, &square) - 1.0).abs() < 1e-9);
        // A segment that misses the polygon is unobstructed.
        let high = Vec3::new(-2.0, 3.0, 0.0);
        let high2 = Vec3::new(2.0, 3.0, 0.0);
        assert_eq!(obstructed_length(&high, &high2, &square), 0.0);
    }

    #[test]
    fn hull_of_square_with_interior_point() {
        let mut pts = unit_square();
        pts.push(Vec3::zero()); // interior, must not survive
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(!hull.iter().any(|p| p.approx_eq(&Vec3::zero(), 1e-12)));
    }

    #[test]
    fn polygon_overlap_cases() {
        let a = unit_square();
        let shifted: Vec<Vec3> = a.iter().map(|p| *p + Vec3::new(0.6, 0.0, 0.0)).collect();
        let far: Vec<Vec3> = a.iter().map(|p| *p + Vec3::new(5.0, 0.0, 0.0)).collect();
        let contained: Vec<Vec3> = a.iter().map(|p| *p * 0.2).collect();
        assert!(polygons_intersect(&a, &shifted));
        assert!(!polygons_intersect(&a, &far));
        assert!(polygons_intersect(&a, &contained));
    }

    #[test]
    fn convexity_check() {
        assert!(is_convex(&unit_square()));
        let dart = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.2, 0.2, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        assert!(!is_convex(&dart));
    }

    #[test]
    fn obstacle_constructor_validates() {
        assert!(Obstacle::new(unit_square()).is_ok());
        let concave = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.2, 0.2, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        assert!(Obstacle::new(concave).is_err());
        assert!(Obstacle::new(unit_square()[..2].to_vec()).is_err());
    }

    #[test]
    fn arena_file_round_trip() {
        let text = "\
# test arenas
shape: disc
center: 100 -200
radius: 1000
shape: square
center: 0 0
side: 5000
";
        let arenas = parse_arenas_str(text).unwrap();
        assert_eq!(arenas.len(), 2);
        assert_eq!(
            arenas[0],
            Arena::Disc {
                center: Vec3::new(100.0, -200.0, 0.0),
                radius: 1000.0
            }
        );
        // `side` records the full edge, stored as half side.
        assert_eq!(arenas[1].radius(), 2500.0);
        assert_eq!(select_arena(&arenas, 1), arenas[1]);
        assert_eq!(select_arena(&arenas, 0), arenas[0]);
    }

    #[test]
    fn arena_file_rejects_malformed_records() {
        assert!(parse_arenas_str("shape: hexagon\n").is_err());
        assert!(parse_arenas_str("radius: 100\n").is_err());
        assert!(parse_arenas_str("").is_err());
    }

    #[test]
    fn obstacle_file_round_trip_and_rejection() {
        let text = "\
4
-0.5 -0.5
0.5 -0.5
0.5 0.5
-0.5 0.5
";
        let obstacles = parse_obstacles_str(text).unwrap();
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].vertices.len(), 4);
        assert!(obstacles[0].center.approx_eq(&Vec3::zero(), 1e-12));

        // Truncated vertex list is a format error.
        assert!(parse_obstacles_str("4\n0 0\n1 0\n").is_err());
        // Non-convex polygons are rejected at load.
        let concave = "4\n0 0\n2 0\n0.2 0.2\n0 2\n";
        assert!(parse_obstacles_str(concave).is_err());
    }
}
