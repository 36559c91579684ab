//! Planner input and its validation

use crate::config::{AxisLimits, DurationDiscretization, PlannerConfig, Synchronization};

/// Rejected input, naming the offending axis where there is one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputError {
    /// Maximum acceleration is negative or NaN
    MaxAcceleration { dof: usize },
    /// Minimum acceleration is positive or NaN
    MinAcceleration { dof: usize },
    /// Maximum jerk is negative or NaN
    MaxJerk { dof: usize },
    /// Current position, velocity or acceleration is not finite
    CurrentState { dof: usize },
    /// Target velocity or acceleration is not finite
    TargetState { dof: usize },
    /// Target acceleration lies outside the acceleration limits
    TargetAcceleration { dof: usize },
    /// Minimum duration is negative or NaN
    MinimumDuration,
    /// Control cycle is not positive
    CycleTime,
    /// Configuration has a different number of axes than the planner
    AxisCountMismatch { expected: usize, found: usize },
}

/// Current and target state of `N` velocity-controlled axes
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VelocityInput<const N: usize> {
    pub current_position: [f64; N],
    pub current_velocity: [f64; N],
    pub current_acceleration: [f64; N],
    pub target_velocity: [f64; N],
    pub target_acceleration: [f64; N],
    pub limits: [AxisLimits; N],
    /// Disabled axes hold their current state
    pub enabled: [bool; N],
    pub synchronization: Synchronization,
    pub duration_discretization: DurationDiscretization,
    /// Lower bound on the trajectory duration
    pub minimum_duration: Option<f64>,
}

impl<const N: usize> VelocityInput<N> {
    /// Create an input at rest with all axes enabled
    pub fn new(limits: [AxisLimits; N]) -> Self {
        Self {
            current_position: [0.0; N],
            current_velocity: [0.0; N],
            current_acceleration: [0.0; N],
            target_velocity: [0.0; N],
            target_acceleration: [0.0; N],
            limits,
            enabled: [true; N],
            synchronization: Synchronization::Time,
            duration_discretization: DurationDiscretization::Continuous,
            minimum_duration: None,
        }
    }

    /// Create an input at rest from a planner configuration
    pub fn from_config(config: &PlannerConfig) -> Result<Self, InputError> {
        if config.axes.len() != N {
            return Err(InputError::AxisCountMismatch {
                expected: N,
                found: config.axes.len(),
            });
        }

        let mut input = Self::new([AxisLimits::default(); N]);
        for (dof, axis) in config.axes.iter().enumerate() {
            input.limits[dof] = axis.limits();
            input.enabled[dof] = axis.enabled;
        }
        input.synchronization = config.synchronization;
        input.duration_discretization = config.duration_discretization;
        input.minimum_duration = config.minimum_duration;
        Ok(input)
    }

    /// Check limits and states of all enabled axes
    ///
    /// Reports the first failing axis.
    pub fn validate(&self) -> Result<(), InputError> {
        for dof in (0..N).filter(|&dof| self.enabled[dof]) {
            let limits = &self.limits[dof];

            let a_max = limits.max_acceleration;
            if a_max.is_nan() || a_max < 0.0 {
                return Err(InputError::MaxAcceleration { dof });
            }

            let a_min = limits.a_min();
            if a_min.is_nan() || a_min > 0.0 {
                return Err(InputError::MinAcceleration { dof });
            }

            if let Some(j_max) = limits.max_jerk {
                if j_max.is_nan() || j_max < 0.0 {
                    return Err(InputError::MaxJerk { dof });
                }
            }

            if !(self.current_position[dof].is_finite()
                && self.current_velocity[dof].is_finite()
                && self.current_acceleration[dof].is_finite())
            {
                return Err(InputError::CurrentState { dof });
            }

            let af = self.target_acceleration[dof];
            if !(self.target_velocity[dof].is_finite() && af.is_finite()) {
                return Err(InputError::TargetState { dof });
            }

            if limits.is_third_order() && (af > a_max || af < a_min) {
                return Err(InputError::TargetAcceleration { dof });
            }
        }

        match self.minimum_duration {
            Some(t) if t.is_nan() || t < 0.0 => Err(InputError::MinimumDuration),
            _ => Ok(()),
        }
    }
}
