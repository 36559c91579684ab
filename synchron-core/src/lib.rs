//! Board-agnostic trajectory generation core
//!
//! This crate computes time-optimal velocity profiles for one or more
//! axes and synchronizes them to a common duration:
//!
//! - Kinematic profile model (phases, reached limits, control signs)
//! - Step 1: minimum-time profile search per axis
//! - Step 2: profile recomputation for an imposed duration
//! - Multi-axis synchronization and trajectory sampling
//! - Online planner stepping once per control cycle
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to the other modules.
mod fmt;

pub mod block;
pub mod config;
pub mod motion;
pub mod profile;
pub mod velocity;

pub use block::{Block, Interval};
pub use config::{AxisLimits, DurationDiscretization, PlannerConfig, Synchronization};
pub use motion::{
    Calculator, InputError, KinematicState, MotionState, Output, PlanError, Trajectory,
    VelocityInput, VelocityPlanner,
};
pub use profile::{BrakeProfile, ControlSigns, Direction, Profile, ReachedLimits};
pub use velocity::{
    VelocitySecondOrderStep1, VelocitySecondOrderStep2, VelocityThirdOrderStep1,
    VelocityThirdOrderStep2,
};
