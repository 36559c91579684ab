//! Online velocity planner
//!
//! Steps a calculated trajectory once per control cycle and recalculates
//! whenever the input changes.

use super::calculator::{Calculator, PlanError};
use super::input::{InputError, VelocityInput};
use super::trajectory::Trajectory;

/// Current motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    /// Trajectory is still running
    Working,
    /// Targets reached
    Finished,
}

/// Result of one control cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Output<const N: usize> {
    pub new_position: [f64; N],
    pub new_velocity: [f64; N],
    pub new_acceleration: [f64; N],
    pub new_jerk: [f64; N],
    /// Time since the start of the current trajectory
    pub time: f64,
    /// Whether this cycle calculated a new trajectory
    pub new_calculation: bool,
    pub state: MotionState,
    pub trajectory: Trajectory<N>,
}

impl<const N: usize> Output<N> {
    /// Feed the new state back as the next cycle's current state
    pub fn pass_to_input(&self, input: &mut VelocityInput<N>) {
        input.current_position = self.new_position;
        input.current_velocity = self.new_velocity;
        input.current_acceleration = self.new_acceleration;
    }
}

/// Velocity planner for `N` axes
///
/// Call [`update`](Self::update) once per control cycle with the latest
/// input. As long as the caller only feeds back the output through
/// [`Output::pass_to_input`], the running trajectory is kept.
#[derive(Debug, Clone)]
pub struct VelocityPlanner<const N: usize> {
    /// Control cycle in seconds
    delta_time: f64,
    calculator: Calculator<N>,
    trajectory: Trajectory<N>,
    /// Input the trajectory was calculated for, advanced every cycle
    current_input: Option<VelocityInput<N>>,
    time: f64,
}

impl<const N: usize> VelocityPlanner<N> {
    /// Create a planner with control cycle `delta_time` in seconds
    pub fn new(delta_time: f64) -> Self {
        Self {
            delta_time,
            calculator: Calculator::new(),
            trajectory: Trajectory::default(),
            current_input: None,
            time: 0.0,
        }
    }

    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Get the running trajectory
    pub fn trajectory(&self) -> &Trajectory<N> {
        &self.trajectory
    }

    /// Force a recalculation on the next update
    pub fn reset(&mut self) {
        self.current_input = None;
        self.time = 0.0;
    }

    /// Advance one control cycle
    pub fn update(&mut self, input: &VelocityInput<N>) -> Result<Output<N>, PlanError> {
        if self.delta_time.is_nan() || self.delta_time <= 0.0 {
            return Err(InputError::CycleTime.into());
        }

        let new_calculation = self.current_input.as_ref() != Some(input);
        if new_calculation {
            self.trajectory = self.calculator.calculate(input, self.delta_time)?;
            self.current_input = Some(*input);
            self.time = 0.0;
            debug!("New trajectory of {}s", self.trajectory.duration());
        }

        self.time += self.delta_time;
        let states = self.trajectory.at_time(self.time);

        let mut output = Output {
            new_position: [0.0; N],
            new_velocity: [0.0; N],
            new_acceleration: [0.0; N],
            new_jerk: [0.0; N],
            time: self.time,
            new_calculation,
            state: if self.time >= self.trajectory.duration() {
                MotionState::Finished
            } else {
                MotionState::Working
            },
            trajectory: self.trajectory,
        };
        for (dof, state) in states.iter().enumerate() {
            output.new_position[dof] = state.position;
            output.new_velocity[dof] = state.velocity;
            output.new_acceleration[dof] = state.acceleration;
            output.new_jerk[dof] = state.jerk;
        }

        if let Some(current) = self.current_input.as_mut() {
            output.pass_to_input(current);
        }
        Ok(output)
    }
}
