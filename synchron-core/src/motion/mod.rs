//! Motion planning
//!
//! Multi-axis synchronization and the online planner on top of the
//! single-axis velocity solvers.

pub mod calculator;
pub mod input;
pub mod planner;
pub mod trajectory;

pub use crate::profile::KinematicState;
pub use calculator::{synchronize, Calculator, PlanError};
pub use input::{InputError, VelocityInput};
pub use planner::{MotionState, Output, VelocityPlanner};
pub use trajectory::Trajectory;
