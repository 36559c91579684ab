//! Multi-axis trajectory calculation
//!
//! Runs the minimum-time search on every axis, picks the shortest duration
//! no axis blocks, and recomputes the remaining axes to finish together.

use libm::{ceil, fabs};

use crate::block::Block;
use crate::config::{DurationDiscretization, Synchronization};
use crate::profile::{BrakeProfile, Profile, T_MAX};
use crate::velocity::{
    VelocitySecondOrderStep1, VelocitySecondOrderStep2, VelocityThirdOrderStep1,
    VelocityThirdOrderStep2,
};

use super::input::{InputError, VelocityInput};
use super::trajectory::Trajectory;

/// Tolerance under which the synchronized duration reuses a Step 1 profile
const REUSE_EPS: f64 = 2.0 * f64::EPSILON;

/// Trajectory calculation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanError {
    /// Input failed validation
    InvalidInput(InputError),
    /// No minimum-time profile for this axis
    ExecutionTime { dof: usize },
    /// Every candidate duration is blocked by some axis
    Synchronization,
    /// No profile realizes the synchronized duration for this axis
    SynchronizationCalculation { dof: usize },
    /// Duration exceeds the supported maximum
    TrajectoryDuration,
}

impl From<InputError> for PlanError {
    fn from(e: InputError) -> Self {
        PlanError::InvalidInput(e)
    }
}

/// Trajectory calculator for `N` axes
///
/// Keeps the blocks of the last calculation for inspection.
#[derive(Debug, Clone)]
pub struct Calculator<const N: usize> {
    blocks: [Block; N],
}

impl<const N: usize> Default for Calculator<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Calculator<N> {
    pub fn new() -> Self {
        Self {
            blocks: [Block::default(); N],
        }
    }

    /// Blocks found by the last calculation
    pub fn blocks(&self) -> &[Block; N] {
        &self.blocks
    }

    /// Calculate the trajectory for `input`
    ///
    /// `delta_time` is the control cycle, only used for discrete durations.
    pub fn calculate(
        &mut self,
        input: &VelocityInput<N>,
        delta_time: f64,
    ) -> Result<Trajectory<N>, PlanError> {
        input.validate()?;
        let discrete = input.duration_discretization == DurationDiscretization::Discrete;
        if discrete && (delta_time.is_nan() || delta_time <= 0.0) {
            return Err(InputError::CycleTime.into());
        }

        let mut trajectory = Trajectory::<N>::default();

        for dof in 0..N {
            let block = if input.enabled[dof] {
                Self::min_time_block(input, dof).ok_or(PlanError::ExecutionTime { dof })?
            } else {
                Block::from_min(hold_profile(input, dof))
            };
            trace!("Axis {} minimum duration {}", dof, block.t_min);

            self.blocks[dof] = block;
            trajectory.independent_min_durations[dof] = block.t_min;
        }

        if input.synchronization == Synchronization::None {
            let mut duration = 0.0;
            for dof in (0..N).filter(|&dof| input.enabled[dof]) {
                trajectory.profiles[dof] = self.blocks[dof].p_min;
                if self.blocks[dof].t_min > duration || trajectory.limiting_dof.is_none() {
                    duration = self.blocks[dof].t_min;
                    trajectory.limiting_dof = Some(dof);
                }
            }
            for dof in (0..N).filter(|&dof| !input.enabled[dof]) {
                trajectory.profiles[dof] = self.blocks[dof].p_min;
            }
            trajectory.duration = duration;
        } else {
            let (t_sync, limiting_dof) = synchronize(
                &self.blocks,
                &input.enabled,
                input.minimum_duration,
                if discrete { Some(delta_time) } else { None },
            )
            .ok_or(PlanError::Synchronization)?;
            debug!("Synchronized duration {} (limiting axis {:?})", t_sync, limiting_dof);

            for dof in 0..N {
                let block = &self.blocks[dof];
                trajectory.profiles[dof] = if !input.enabled[dof] {
                    block.p_min
                } else if limiting_dof == Some(dof) {
                    *block.get_profile(t_sync)
                } else {
                    Self::synchronized_profile(input, dof, block, t_sync)
                        .ok_or(PlanError::SynchronizationCalculation { dof })?
                };
            }
            trajectory.duration = t_sync;
            trajectory.limiting_dof = limiting_dof;
        }

        if trajectory.duration > T_MAX {
            return Err(PlanError::TrajectoryDuration);
        }
        Ok(trajectory)
    }

    /// Brake and run the minimum-time search on one axis
    fn min_time_block(input: &VelocityInput<N>, dof: usize) -> Option<Block> {
        let limits = &input.limits[dof];
        let (a_max, a_min) = (limits.a_max(), limits.a_min());
        let vf = input.target_velocity[dof];
        let af = input.target_acceleration[dof];

        let mut boundary = Profile::default();
        match limits.max_jerk {
            Some(j_max) => {
                boundary.brake = BrakeProfile::velocity_brake(
                    input.current_acceleration[dof],
                    a_max,
                    a_min,
                    j_max,
                );
                let (p0, v0, a0) = boundary.brake.finalize(
                    input.current_position[dof],
                    input.current_velocity[dof],
                    input.current_acceleration[dof],
                );
                boundary.set_boundary(p0, v0, a0, p0, vf, af);

                VelocityThirdOrderStep1::new(v0, a0, vf, af, a_max, a_min, j_max)
                    .get_profile(&boundary)
            }
            None => {
                // Without a jerk limit the acceleration drops to zero at the end
                let (p0, v0) = (input.current_position[dof], input.current_velocity[dof]);
                boundary.set_boundary(p0, v0, 0.0, p0, vf, 0.0);

                VelocitySecondOrderStep1::new(v0, vf, a_max, a_min).get_profile(&boundary)
            }
        }
    }

    /// Profile of one axis lasting exactly `t_sync` (brake included)
    fn synchronized_profile(
        input: &VelocityInput<N>,
        dof: usize,
        block: &Block,
        t_sync: f64,
    ) -> Option<Profile> {
        if fabs(t_sync - block.t_min) < REUSE_EPS {
            return Some(block.p_min);
        }
        if let Some(interval) = &block.a {
            if fabs(t_sync - interval.right) < REUSE_EPS {
                return Some(interval.profile);
            }
        }

        let limits = &input.limits[dof];
        let mut profile = Profile::default();
        profile.set_boundary_from(&block.p_min);
        let tf = t_sync - profile.brake.duration;
        let (v0, a0, vf, af) = (profile.v[0], profile.a[0], profile.vf, profile.af);

        let found = match limits.max_jerk {
            Some(j_max) => VelocityThirdOrderStep2::new(
                tf,
                v0,
                a0,
                vf,
                af,
                limits.a_max(),
                limits.a_min(),
                j_max,
            )
            .get_profile(&mut profile),
            None => VelocitySecondOrderStep2::new(tf, v0, vf, limits.a_max(), limits.a_min())
                .get_profile(&mut profile),
        };

        if found {
            Some(profile)
        } else {
            warn!("Axis {} cannot be synchronized to {}s", dof, t_sync);
            None
        }
    }
}

/// Zero-duration profile keeping the current state of a disabled axis
fn hold_profile<const N: usize>(input: &VelocityInput<N>, dof: usize) -> Profile {
    let (p0, v0, a0) = (
        input.current_position[dof],
        input.current_velocity[dof],
        input.current_acceleration[dof],
    );
    let mut profile = Profile::default();
    profile.set_boundary(p0, v0, a0, p0, v0, a0);
    profile.p = [p0; 8];
    profile.v = [v0; 8];
    profile.a = [a0; 8];
    profile
}

/// Find the shortest duration no enabled axis blocks
///
/// Candidates are every minimum duration, every blocked interval's right
/// edge and `minimum_duration`. Ties keep the lower axis, minimum
/// durations before interval edges. With a control cycle, candidates are
/// rounded up to a multiple of it and no axis counts as limiting once
/// rounding moved its duration.
///
/// Returns the duration and the limiting axis.
pub fn synchronize<const N: usize>(
    blocks: &[Block; N],
    enabled: &[bool; N],
    minimum_duration: Option<f64>,
    delta_time: Option<f64>,
) -> Option<(f64, Option<usize>)> {
    let t_lower = minimum_duration.unwrap_or(0.0);
    let mut best: Option<(f64, Option<usize>)> = None;

    let mut consider = |t_raw: f64, dof: Option<usize>| {
        let (t, dof) = match delta_time {
            Some(dt) => {
                let t = ceil(t_raw / dt) * dt;
                (t, if t == t_raw { dof } else { None })
            }
            None => (t_raw, dof),
        };

        if t < t_lower || !t.is_finite() {
            return;
        }
        if (0..N).any(|i| enabled[i] && blocks[i].is_blocked(t)) {
            return;
        }
        if best.map_or(true, |(t_best, _)| t < t_best) {
            best = Some((t, dof));
        }
    };

    for dof in (0..N).filter(|&dof| enabled[dof]) {
        consider(blocks[dof].t_min, Some(dof));
        if let Some(interval) = &blocks[dof].a {
            consider(interval.right, Some(dof));
        }
    }
    if let Some(t) = minimum_duration {
        consider(t, None);
    }

    best
}
