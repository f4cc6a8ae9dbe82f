#[cfg(test)]
mod units {
    use crate::vector::kernels::*;
    use crate::vector::Vec3;

    #[test]
    fn arithmetic_value_and_reference_forms_agree() {
        let a = Vec3::new(1.0, -2.0, 3.0);
        let b = Vec3::new(0.5, 4.0, -1.0);
        assert_eq!(a + b, &a + &b);
        assert_eq!(a - b, &a - &b);
        assert_eq!(a * 2.0, 2.0 * a);
        assert_eq!(-a, -&a);
    }

    #[test]
    fn add_assign_accumulates() {
        let mut acc = Vec3::zero();
        acc += Vec3::new(1.0, 0.0, 0.0);
        acc += Vec3::new(0.0, 2.0, 0.0);
        assert_eq!(acc, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn normalize_handles_zero_vector() {
        assert_eq!(Vec3::zero().normalize(), Vec3::zero());
        let v = Vec3::new(3.0, 4.0, 0.0).normalize();
        assert!((v.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zeroed_z_pins_only_in_2d() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.zeroed_z(2).z, 0.0);
        assert_eq!(v.zeroed_z(3).z, 3.0);
    }

    #[test]
    fn clamp_norm_rescales_long_vectors_only() {
        let v = Vec3::new(30.0, 40.0, 0.0);
        let clamped = v.clamp_norm(10.0);
        assert!((clamped.norm() - 10.0).abs() < 1e-12);
        assert!(clamped.normalize().approx_eq(&v.normalize(), 1e-12));
        assert_eq!(v.clamp_norm(100.0), v);
    }

    #[test]
    fn sigmoid_lin_shape() {
        // Inside the radius the gain ramps linearly, saturating at v_max.
        assert_eq!(sigmoid_lin(1000.0, 0.15, 400.0, 1000.0), 0.0);
        assert!((sigmoid_lin(900.0, 0.15, 400.0, 1000.0) - 15.0).abs() < 1e-12);
        assert_eq!(sigmoid_lin(0.0, 1.0, 400.0, 1000.0), 400.0);
        // Beyond the radius the repulsive gain is zero.
        assert_eq!(sigmoid_lin(2000.0, 0.15, 400.0, 1000.0), 0.0);
    }

    #[test]
    fn sigmoid_lin_att_mirrors() {
        assert_eq!(sigmoid_lin_att(900.0, 0.005, 800.0, 1000.0), 0.0);
        assert!((sigmoid_lin_att(3000.0, 0.005, 800.0, 1000.0) - 10.0).abs() < 1e-12);
        assert_eq!(sigmoid_lin_att(1e9, 0.005, 800.0, 1000.0), 800.0);
    }

    #[test]
    fn linsqrt_curve_is_continuous_at_the_regime_switch() {
        let (slope, acc, r0) = (0.4, 250.0, 0.0);
        // Regimes meet at gap = acc / slope^2.
        let gap = acc / (slope * slope);
        let below = vel_decay_lin_sqrt(gap - 1e-9, slope, acc, r0);
        let above = vel_decay_lin_sqrt(gap + 1e-9, slope, acc, r0);
        assert!((below - above).abs() < 1e-3);
        // No allowed difference at or behind the offset.
        assert_eq!(vel_decay_lin_sqrt(-500.0, slope, acc, r0), 0.0);
        assert_eq!(vel_decay_lin_sqrt(0.0, slope, acc, r0), 0.0);
    }

    #[test]
    fn sigma_norm_matches_closed_form() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        let eps = 0.1;
        let expected = ((1.0 + eps * 25.0f64).sqrt() - 1.0) / eps;
        assert!((sigma_norm(&v, eps) - expected).abs() < 1e-12);
        assert!((sigma_norm_scalar(5.0, eps) - expected).abs() < 1e-12);
    }

    #[test]
    fn sigma_grad_is_bounded_by_unity() {
        // |sigma_grad| is bounded by 1/sqrt(eps) for any input.
        let v = Vec3::new(1e6, 0.0, 0.0);
        assert!(sigma_grad(&v, 0.1).norm() <= 1.0 / 0.1f64.sqrt() + 1e-9);
        // Near the origin the gradient approaches the identity.
        let small = Vec3::new(1e-6, 0.0, 0.0);
        assert!(sigma_grad(&small, 0.1).approx_eq(&small, 1e-9));
    }

    #[test]
    fn bump_function_plateau_taper_and_cutoff() {
        let h = 0.3;
        assert_eq!(bump_function(0.0, h), 1.0);
        assert_eq!(bump_function(h, h), 1.0);
        let mid = bump_function(0.5 * (h + 1.0), h);
        assert!((mid - 0.5).abs() < 1e-12);
        assert_eq!(bump_function(1.0 + 1e-12, h), 0.0);
        assert_eq!(bump_function(-0.1, h), 0.0);
    }

    #[test]
    fn action_function_limits() {
        let (a, b) = (50.0, 250.0);
        // phi(+inf) -> a (attraction), phi(-inf) -> -b (repulsion).
        assert!((action_function(1e9, a, b) - a).abs() < 1.0);
        assert!((action_function(-1e9, a, b) + b).abs() < 1.0);
        // phi(0) == 0 by construction of the offset c.
        assert!(action_function(0.0, a, b).abs() < 1e-9);
    }

    #[test]
    fn sat_clips_symmetrically() {
        assert_eq!(sat(0.7, 0.2), 0.2);
        assert_eq!(sat(-0.7, 0.2), -0.2);
        assert_eq!(sat(0.1, 0.2), 0.1);
    }
}
