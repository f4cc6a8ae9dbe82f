#[cfg(test)]
mod units {
    use crate::config::SimConfig;

    #[test]
    fn defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_parameter_is_fatal() {
        let mut config = SimConfig::default();
        config.flocking.h_bump = 1.5; // outside [0, 1]
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("H_Bump"));
    }

    #[test]
    fn structural_constraints() {
        let mut config = SimConfig::default();
        config.sit.number_of_agents = 0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.sit.delta_t = 0.0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.flocking.dim = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip_with_partial_overrides() {
        let text = r#"
[flocking]
v_flock = 250.0
r_0 = 2000.0
dim = 3

[unit]
flocking_type = 5
t_del = 0.5

[sit]
number_of_agents = 7
delta_t = 0.05
"#;
        let config = SimConfig::from_toml(text).unwrap();
        assert_eq!(config.flocking.v_flock, 250.0);
        assert_eq!(config.flocking.dim, 3);
        assert_eq!(config.unit.flocking_type, 5);
        assert_eq!(config.sit.number_of_agents, 7);
        // Unspecified fields keep their defaults.
        assert_eq!(config.flocking.v_rep, 400.0);
        assert_eq!(config.unit.a_max, 600.0);
    }

    #[test]
    fn invalid_toml_value_is_rejected() {
        let text = r#"
[unit]
flocking_type = 9
"#;
        assert!(SimConfig::from_toml(text).is_err());
    }

    #[test]
    fn derived_tick_quantities() {
        let mut config = SimConfig::default();
        config.unit.t_del = 0.5;
        config.sit.delta_t = 0.1;
        assert_eq!(config.delay_steps(), 5);
        config.unit.t_gps = 0.3;
        assert_eq!(config.gps_tick_steps(), 3);
        // GPS can never tick slower than the integration step.
        config.unit.t_gps = 0.0;
        assert_eq!(config.gps_tick_steps(), 1);
    }
}
