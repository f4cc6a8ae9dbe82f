//! # Configuration
//!
//! The typed, immutable parameter block of the simulation core: three serde
//! structs loaded from TOML and validated once at init. Every numeric
//! parameter carries name/unit/min/max/default metadata and an out-of-range
//! value is a fatal [`SimError::ConfigRange`].
//!
//! The only runtime-mutable quantity that looks like a parameter (the
//! strategy-3 equilibrium-distance inflation) lives in the engine's dynamic
//! state instead, so the block handed to the core never changes during a run.

// Unit tests
pub mod tests;

use crate::error::SimError;
use crate::radio::{CommModel, LinkBudget};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Metadata of one numeric parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamMeta {
    pub name: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

const UNBOUNDED: f64 = 2e222;

macro_rules! meta {
    ($name:literal, $unit:literal, $min:expr, $max:expr, $default:expr) => {
        ParamMeta {
            name: $name,
            unit: $unit,
            min: $min,
            max: $max,
            default: $default,
        }
    };
}

/// Flocking-model parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingParams {
    /// Preferred SPP cruise speed, m/s.
    pub v_flock: f64,
    /// Maximum repulsion velocity, m/s.
    pub v_rep: f64,
    /// Friction velocity slack, m/s.
    pub v_frict: f64,
    /// Hard speed limit, m/s.
    pub v_max: f64,
    /// Equilibrium distance of the pair potential, m.
    pub r_0: f64,
    /// Linear coefficient of the pressure repulsion.
    pub k_press: f64,
    /// Friction range offset added to `r_0`, m.
    pub r_0_offset_frict: f64,
    /// Distance offset of the shill wall, m.
    pub r_0_shill: f64,
    /// Linear v-x slope of repulsion, 1/s.
    pub slope_rep: f64,
    /// Linear v-x slope of attraction, 1/s.
    pub slope_att: f64,
    /// Slope of the friction braking curve, 1/s.
    pub slope_frict: f64,
    /// Acceleration limit inside the friction braking curve, m/s^2.
    pub acc_frict: f64,
    /// Slope of the shill braking curve, 1/s.
    pub slope_shill: f64,
    /// Speed of shill agents, m/s.
    pub v_shill: f64,
    /// Acceleration limit inside the shill braking curve, m/s^2.
    pub acc_shill: f64,
    /// Decay onset of the Olfati-Saber bump function, dimensionless in [0,1].
    pub h_bump: f64,
    /// Sigma-norm parameter.
    pub epsilon: f64,
    /// Attractive strength of the action function, m.
    pub a_action_function: f64,
    /// Repulsive strength of the action function, m.
    pub b_action_function: f64,
    /// Maximum number of neighbours an agent may track.
    pub size_neighbourhood: usize,
    /// Arena radius (half side for the square arena), m.
    pub arena_radius: f64,
    /// Target algebraic connectivity of the communication graph.
    pub lambda_2: f64,
    /// Linear scaler of the friction velocity error.
    pub c_frict: f64,
    pub arena_center_x: f64,
    pub arena_center_y: f64,
    /// 0 = disc arena, 1 = square arena.
    pub arena_shape: u32,
    /// Spatial dimensionality, 2 or 3.
    pub dim: u32,
    /// Distance cut-off of the connectivity Laplacian, m.
    pub r_lambda: f64,
    /// When set, the preferred velocity saturates at `v_max` instead of
    /// being normalised to `v_flock`.
    pub cut_off_mode: bool,
}

impl Default for FlockingParams {
    fn default() -> Self {
        FlockingParams {
            v_flock: 400.0,
            v_rep: 400.0,
            v_frict: 50.0,
            v_max: 600.0,
            r_0: 1000.0,
            k_press: 0.01,
            r_0_offset_frict: 1000.0,
            r_0_shill: 0.0,
            slope_rep: 0.15,
            slope_att: 0.005,
            slope_frict: 0.4,
            acc_frict: 250.0,
            slope_shill: 0.4,
            v_shill: 600.0,
            acc_shill: 250.0,
            h_bump: 0.3,
            epsilon: 0.1,
            a_action_function: 50.0,
            b_action_function: 250.0,
            size_neighbourhood: 4,
            arena_radius: 62_500.0,
            lambda_2: 4.0,
            c_frict: 1.0,
            arena_center_x: 0.0,
            arena_center_y: 0.0,
            arena_shape: 0,
            dim: 2,
            r_lambda: 4000.0,
            cut_off_mode: false,
        }
    }
}

impl FlockingParams {
    /// Metadata rows paired with the current field values, in declaration
    /// order, for validation and external parameter surfaces.
    pub fn entries(&self) -> Vec<(ParamMeta, f64)> {
        vec![
            (meta!("V_Flock", "m/s", 0.0, UNBOUNDED, 400.0), self.v_flock),
            (meta!("V_Rep", "m/s", 0.0, UNBOUNDED, 400.0), self.v_rep),
            (meta!("V_Frict", "m/s", 0.0, UNBOUNDED, 50.0), self.v_frict),
            (meta!("V_Max", "m/s", 0.0, UNBOUNDED, 600.0), self.v_max),
            (meta!("R_0", "m", 0.0, UNBOUNDED, 1000.0), self.r_0),
            (meta!("K_Press", "-", 0.0, UNBOUNDED, 0.01), self.k_press),
            (
                meta!("R_0_Offset_Frict", "m", -UNBOUNDED, UNBOUNDED, 1000.0),
                self.r_0_offset_frict,
            ),
            (
                meta!("R_0_Shill", "m", -UNBOUNDED, UNBOUNDED, 0.0),
                self.r_0_shill,
            ),
            (meta!("Slope_Rep", "1/s", 0.0, UNBOUNDED, 0.15), self.slope_rep),
            (meta!("Slope_Att", "1/s", 0.0, UNBOUNDED, 0.005), self.slope_att),
            (
                meta!("Slope_Frict", "1/s", 0.0, UNBOUNDED, 0.4),
                self.slope_frict,
            ),
            (
                meta!("Acc_Frict", "m/s^2", 0.0, UNBOUNDED, 250.0),
                self.acc_frict,
            ),
            (
                meta!("Slope_Shill", "1/s", 0.0, UNBOUNDED, 0.4),
                self.slope_shill,
            ),
            (meta!("V_Shill", "m/s", 0.0, UNBOUNDED, 600.0), self.v_shill),
            (
                meta!("Acc_Shill", "m/s^2", 0.0, UNBOUNDED, 250.0),
                self.acc_shill,
            ),
            (meta!("H_Bump", "-", 0.0, 1.0, 0.3), self.h_bump),
            (meta!("Epsilon", "-", 0.0, 10.0, 0.1), self.epsilon),
            (
                meta!("A_Action_Function", "m", 0.0, UNBOUNDED, 50.0),
                self.a_action_function,
            ),
            (
                meta!("B_Action_Function", "m", 0.0, UNBOUNDED, 250.0),
                self.b_action_function,
            ),
            (
                meta!("Size_Neighbourhood", "-", 0.0, UNBOUNDED, 4.0),
                self.size_neighbourhood as f64,
            ),
            (
                meta!("ArenaRadius", "m", 0.0, UNBOUNDED, 62_500.0),
                self.arena_radius,
            ),
            (meta!("Lambda2", "-", 0.0, UNBOUNDED, 4.0), self.lambda_2),
            (meta!("C_Frict", "-", 0.0, UNBOUNDED, 1.0), self.c_frict),
            (
                meta!("ArenaCenterX", "m", -UNBOUNDED, UNBOUNDED, 0.0),
                self.arena_center_x,
            ),
            (
                meta!("ArenaCenterY", "m", -UNBOUNDED, UNBOUNDED, 0.0),
                self.arena_center_y,
            ),
            (
                meta!("ArenaShape", "", 0.0, 1.0, 0.0),
                self.arena_shape as f64,
            ),
            (meta!("Dim", "", 2.0, 3.0, 2.0), self.dim as f64),
            (meta!("R_Lambda", "m", 0.0, UNBOUNDED, 4000.0), self.r_lambda),
        ]
    }
}

/// Robot/unit-model parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitParams {
    /// Time constant of the horizontal velocity response, s.
    pub tau_pid_xy: f64,
    /// Time constant of the vertical velocity response, s.
    pub tau_pid_z: f64,
    /// Horizontal diffusive outer noise intensity.
    pub sigma_outer_xy: f64,
    /// Vertical diffusive outer noise intensity.
    pub sigma_outer_z: f64,
    /// Stationary deviation of the horizontal GPS noise, m.
    pub sigma_gps_xy: f64,
    /// Stationary deviation of the vertical GPS noise, m.
    pub sigma_gps_z: f64,
    /// Observation delay of neighbour state, s.
    pub t_del: f64,
    /// GPS update period, s.
    pub t_gps: f64,
    /// Hard acceleration limit, m/s^2.
    pub a_max: f64,
    /// Radio loss-kernel index, see [`CommModel::from_index`].
    pub communication_type: u32,
    /// Receiver sensitivity threshold, dBm.
    pub sensitivity_thresh: f64,
    /// Transmit power, dBm.
    pub transmit_power: f64,
    /// Reference distance of the path-loss law, m.
    pub ref_distance: f64,
    /// Path-loss exponent.
    pub gamma: f64,
    /// Obstacle attenuation exponent.
    pub gamma_obst: f64,
    /// Carrier frequency, GHz.
    pub freq: f64,
    /// Strategy selector, 0..=6.
    pub flocking_type: u32,
    /// Initial wind heading, rad.
    pub wind_angle: f64,
    /// Wind random-walk intensity; 0 disables wind.
    pub wind_std_dev: f64,
}

impl Default for UnitParams {
    fn default() -> Self {
        UnitParams {
            tau_pid_xy: 0.2,
            tau_pid_z: 0.2,
            sigma_outer_xy: 100.0,
            sigma_outer_z: 100.0,
            sigma_gps_xy: 50.0,
            sigma_gps_z: 50.0,
            t_del: 1.0,
            t_gps: 0.1,
            a_max: 600.0,
            communication_type: 2,
            sensitivity_thresh: -90.0,
            transmit_power: 20.0,
            ref_distance: 1.0,
            gamma: 2.6,
            gamma_obst: 4.0,
            freq: 2.4,
            flocking_type: 0,
            wind_angle: 0.0,
            wind_std_dev: 0.0,
        }
    }
}

impl UnitParams {
    pub fn entries(&self) -> Vec<(ParamMeta, f64)> {
        vec![
            (meta!("Tau_PID_XY", "s", 1e-6, UNBOUNDED, 0.2), self.tau_pid_xy),
            (meta!("Tau_PID_Z", "s", 1e-6, UNBOUNDED, 0.2), self.tau_pid_z),
            (
                meta!("Sigma_Outer_XY", "-", 0.0, UNBOUNDED, 100.0),
                self.sigma_outer_xy,
            ),
            (
                meta!("Sigma_Outer_Z", "-", 0.0, UNBOUNDED, 100.0),
                self.sigma_outer_z,
            ),
            (
                meta!("Sigma_GPS_XY", "m", 0.0, UNBOUNDED, 50.0),
                self.sigma_gps_xy,
            ),
            (
                meta!("Sigma_GPS_Z", "m", 0.0, UNBOUNDED, 50.0),
                self.sigma_gps_z,
            ),
            (meta!("t_del", "s", 0.0, UNBOUNDED, 1.0), self.t_del),
            (meta!("t_GPS", "s", 0.0, UNBOUNDED, 0.1), self.t_gps),
            (meta!("a_max", "m/s^2", 0.0, UNBOUNDED, 600.0), self.a_max),
            (
                meta!("communication_type", "", 0.0, 2.0, 2.0),
                self.communication_type as f64,
            ),
            (
                meta!("sensitivity_thresh", "dBm", -UNBOUNDED, 0.0, -90.0),
                self.sensitivity_thresh,
            ),
            (
                meta!("transmit_power", "dBm", -UNBOUNDED, UNBOUNDED, 20.0),
                self.transmit_power,
            ),
            (
                meta!("ref_distance", "m", 1e-9, UNBOUNDED, 1.0),
                self.ref_distance,
            ),
            (meta!("gamma", "-", 0.0, UNBOUNDED, 2.6), self.gamma),
            (meta!("gammaObst", "-", 0.0, UNBOUNDED, 4.0), self.gamma_obst),
            (meta!("freq", "GHz", 1e-6, UNBOUNDED, 2.4), self.freq),
            (
                meta!("flocking_type", "", 0.0, 6.0, 0.0),
                self.flocking_type as f64,
            ),
            (
                meta!("Wind_Angle", "rad", -UNBOUNDED, UNBOUNDED, 0.0),
                self.wind_angle,
            ),
            (
                meta!("Wind_StDev", "-", 0.0, UNBOUNDED, 0.0),
                self.wind_std_dev,
            ),
        ]
    }

    /// Radio link budget derived from the unit parameters (frequency is
    /// configured in GHz).
    pub fn link_budget(&self) -> LinkBudget {
        LinkBudget {
            model: CommModel::from_index(self.communication_type),
            transmit_power: self.transmit_power,
            ref_distance: self.ref_distance,
            gamma: self.gamma,
            gamma_obst: self.gamma_obst,
            freq: self.freq * 1e9,
        }
    }
}

/// Situation parameters: system size, time step, initial placement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SitParams {
    pub number_of_agents: usize,
    /// Collision radius, m.
    pub radius: f64,
    /// Integration time step, s.
    pub delta_t: f64,
    /// Half extent of the initial placement volume, m.
    pub initial_x: f64,
    pub initial_y: f64,
    pub initial_z: f64,
    /// Grid resolution offered to coverage diagnostics.
    pub resolution: u32,
}

impl Default for SitParams {
    fn default() -> Self {
        SitParams {
            number_of_agents: 10,
            radius: 250.0,
            delta_t: 0.1,
            initial_x: 5000.0,
            initial_y: 5000.0,
            initial_z: 0.0,
            resolution: 600,
        }
    }
}

impl SitParams {
    pub fn entries(&self) -> Vec<(ParamMeta, f64)> {
        vec![
            (
                meta!("NumberOfAgents", "-", 1.0, UNBOUNDED, 10.0),
                self.number_of_agents as f64,
            ),
            (meta!("Radius", "m", 0.0, UNBOUNDED, 250.0), self.radius),
            (meta!("DeltaT", "s", 1e-9, UNBOUNDED, 0.1), self.delta_t),
            (
                meta!("InitialX", "m", 0.0, UNBOUNDED, 5000.0),
                self.initial_x,
            ),
            (
                meta!("InitialY", "m", 0.0, UNBOUNDED, 5000.0),
                self.initial_y,
            ),
            (
                meta!("InitialZ", "m", 0.0, UNBOUNDED, 0.0),
                self.initial_z,
            ),
            (
                meta!("Resolution", "-", 1.0, UNBOUNDED, 600.0),
                self.resolution as f64,
            ),
        ]
    }
}

/// The complete immutable configuration handed to the engine.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub flocking: FlockingParams,
    pub unit: UnitParams,
    pub sit: SitParams,
}

impl SimConfig {
    /// Validates every parameter against its [min, max] range plus the
    /// structural constraints. Fatal on the first violation.
    pub fn validate(&self) -> Result<(), SimError> {
        for (meta, value) in self
            .flocking
            .entries()
            .into_iter()
            .chain(self.unit.entries())
            .chain(self.sit.entries())
        {
            if !value.is_finite() || value < meta.min || value > meta.max {
                return Err(SimError::ConfigRange {
                    name: meta.name,
                    value,
                    min: meta.min,
                    max: meta.max,
                });
            }
        }
        if self.flocking.dim != 2 && self.flocking.dim != 3 {
            return Err(SimError::Config(format!(
                "Dim must be 2 or 3, got {}",
                self.flocking.dim
            )));
        }
        Ok(())
    }

    /// Observation delay expressed in whole ticks, `ceil(t_del / dt)`.
    pub fn delay_steps(&self) -> usize {
        (self.unit.t_del / self.sit.delta_t).ceil() as usize
    }

    /// GPS update period expressed in whole ticks, at least 1.
    pub fn gps_tick_steps(&self) -> u64 {
        ((self.unit.t_gps / self.sit.delta_t).round() as u64).max(1)
    }

    /// Loads and validates a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SimError> {
        let config: SimConfig =
            toml::from_str(text).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
