//! Configuration type definitions
//!
//! These types describe the planner and its axes. They are filled from a
//! TOML file or restored from postcard-serialized binary data.

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum axis name length
pub const MAX_NAME_LEN: usize = 16;

/// Maximum axes per config
pub const MAX_AXES: usize = 8;

/// Default control cycle in seconds
pub const DEFAULT_CYCLE_TIME: f64 = 0.001;

/// Kinematic limits of one axis
///
/// `max_jerk == None` selects the acceleration-limited (second-order)
/// interface.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisLimits {
    /// Maximum acceleration (>= 0)
    pub max_acceleration: f64,
    /// Minimum acceleration (<= 0), `-max_acceleration` when unset
    pub min_acceleration: Option<f64>,
    /// Maximum jerk (>= 0)
    pub max_jerk: Option<f64>,
}

impl AxisLimits {
    /// Jerk-limited axis with symmetric acceleration limits
    pub const fn third_order(max_acceleration: f64, max_jerk: f64) -> Self {
        Self {
            max_acceleration,
            min_acceleration: None,
            max_jerk: Some(max_jerk),
        }
    }

    /// Acceleration-limited axis with symmetric acceleration limits
    pub const fn second_order(max_acceleration: f64) -> Self {
        Self {
            max_acceleration,
            min_acceleration: None,
            max_jerk: None,
        }
    }

    /// Override the minimum acceleration
    pub const fn with_min_acceleration(mut self, min_acceleration: f64) -> Self {
        self.min_acceleration = Some(min_acceleration);
        self
    }

    pub fn a_max(&self) -> f64 {
        self.max_acceleration
    }

    pub fn a_min(&self) -> f64 {
        self.min_acceleration.unwrap_or(-self.max_acceleration)
    }

    pub fn is_third_order(&self) -> bool {
        self.max_jerk.is_some()
    }
}

impl Default for AxisLimits {
    fn default() -> Self {
        Self::third_order(1.0, 1.0)
    }
}

/// How the axes of a trajectory share their duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Synchronization {
    /// All axes finish together
    #[default]
    Time,
    /// Every axis runs its own minimum-time profile
    None,
}

/// Whether the synchronized duration is snapped to the control cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DurationDiscretization {
    #[default]
    Continuous,
    /// Round up to a multiple of the control cycle
    Discrete,
}

/// Axis configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisConfig {
    /// Axis name/identifier
    pub name: String<MAX_NAME_LEN>,
    pub max_acceleration: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_acceleration: Option<f64>,
    /// Omitted for acceleration-limited axes
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_jerk: Option<f64>,
    /// Disabled axes hold their current state
    #[cfg_attr(feature = "serde", serde(default = "default_enabled"))]
    pub enabled: bool,
}

#[cfg(feature = "serde")]
fn default_enabled() -> bool {
    true
}

impl AxisConfig {
    pub fn limits(&self) -> AxisLimits {
        AxisLimits {
            max_acceleration: self.max_acceleration,
            min_acceleration: self.min_acceleration,
            max_jerk: self.max_jerk,
        }
    }
}

impl Default for AxisConfig {
    fn default() -> Self {
        let limits = AxisLimits::default();
        Self {
            name: String::new(),
            max_acceleration: limits.max_acceleration,
            min_acceleration: limits.min_acceleration,
            max_jerk: limits.max_jerk,
            enabled: true,
        }
    }
}

/// Complete planner configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Format version, must equal [`CONFIG_VERSION`]
    pub version: u8,
    /// Control cycle in seconds
    pub cycle_time: f64,
    pub synchronization: Synchronization,
    pub duration_discretization: DurationDiscretization,
    /// Lower bound on every trajectory duration
    pub minimum_duration: Option<f64>,
    #[cfg_attr(feature = "serde", serde(rename = "axis"))]
    pub axes: Vec<AxisConfig, MAX_AXES>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            cycle_time: DEFAULT_CYCLE_TIME,
            synchronization: Synchronization::Time,
            duration_discretization: DurationDiscretization::Continuous,
            minimum_duration: None,
            axes: Vec::new(),
        }
    }
}

impl PlannerConfig {
    /// Find an axis by name
    pub fn axis(&self, name: &str) -> Option<&AxisConfig> {
        self.axes.iter().find(|a| a.name.as_str() == name)
    }

    /// Number of enabled axes
    pub fn enabled_count(&self) -> usize {
        self.axes.iter().filter(|a| a.enabled).count()
    }
}
