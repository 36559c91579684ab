//! Kinematic profile model
//!
//! A profile describes one axis's trajectory segment as seven phases of
//! constant jerk, optionally preceded by a brake phase. Solvers fill in the
//! phase durations and the `check_*` methods integrate them and verify the
//! boundary conditions and acceleration limits.

pub mod brake;

pub use brake::BrakeProfile;

use libm::fabs;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance on the final velocity
pub const V_PRECISION: f64 = 1e-8;

/// Tolerance on the final acceleration
pub const A_PRECISION: f64 = 1e-10;

/// Relative tolerance on a synchronized duration
pub const T_PRECISION: f64 = 1e-12;

/// Slack allowed on acceleration limits
pub const A_EPS: f64 = 1e-12;

/// Slack allowed on the jerk limit
pub const J_EPS: f64 = 1e-12;

/// Longest accepted profile duration in seconds
pub const T_MAX: f64 = 1e12;

/// Which kinematic limits a profile saturates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReachedLimits {
    Acc0Acc1Vel,
    Vel,
    /// Acceleration plateau in the first half
    Acc0,
    Acc1,
    Acc0Acc1,
    Acc0Vel,
    Acc1Vel,
    /// No limit is held for a finite time
    #[default]
    None,
}

/// Sign pattern of the jerk over the phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ControlSigns {
    /// Up, down, down, up
    #[default]
    Uddu,
    /// Up, down, up, down
    Udud,
}

/// Which limit set a profile was solved against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// `aMax` is the primary limit (positive jerk first)
    #[default]
    Up,
    /// `aMin` is the primary limit (negative jerk first)
    Down,
}

/// Sampled kinematic state of one axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KinematicState {
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
    pub jerk: f64,
}

/// Integrate a constant-jerk motion for `t` seconds
///
/// Returns `(position, velocity, acceleration)`.
#[inline]
pub fn integrate(t: f64, p0: f64, v0: f64, a0: f64, j: f64) -> (f64, f64, f64) {
    (
        p0 + t * (v0 + t * (a0 / 2.0 + t * j / 6.0)),
        v0 + t * (a0 + t * j / 2.0),
        a0 + t * j,
    )
}

/// Candidate trajectory segment of a single axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Profile {
    /// Phase durations
    pub t: [f64; 7],
    /// Cumulative phase end times
    pub t_sum: [f64; 7],
    /// Jerk of each phase
    pub j: [f64; 7],
    /// Acceleration at each phase boundary (`a[0]` is the start state)
    pub a: [f64; 8],
    /// Velocity at each phase boundary
    pub v: [f64; 8],
    /// Position at each phase boundary
    pub p: [f64; 8],
    /// Brake pre-trajectory executed before phase 0
    pub brake: BrakeProfile,
    /// Final position (result of integration, not a constraint)
    pub pf: f64,
    /// Target velocity
    pub vf: f64,
    /// Target acceleration
    pub af: f64,
    pub limits: ReachedLimits,
    pub direction: Direction,
    pub control_signs: ControlSigns,
}

impl Profile {
    /// Set start and target state
    pub fn set_boundary(&mut self, p0: f64, v0: f64, a0: f64, pf: f64, vf: f64, af: f64) {
        self.p[0] = p0;
        self.v[0] = v0;
        self.a[0] = a0;
        self.pf = pf;
        self.vf = vf;
        self.af = af;
    }

    /// Copy the boundary state (and brake) of another profile
    pub fn set_boundary_from(&mut self, other: &Profile) {
        self.p[0] = other.p[0];
        self.v[0] = other.v[0];
        self.a[0] = other.a[0];
        self.pf = other.pf;
        self.vf = other.vf;
        self.af = other.af;
        self.brake = other.brake;
    }

    /// Total duration including the brake
    pub fn duration(&self) -> f64 {
        self.t_sum[6] + self.brake.duration
    }

    /// Reject negative or NaN phase durations and fill `t_sum`
    fn accumulate_times(&mut self) -> bool {
        let mut sum = 0.0;
        for i in 0..7 {
            if self.t[i] < 0.0 || self.t[i].is_nan() {
                return false;
            }
            sum += self.t[i];
            self.t_sum[i] = sum;
        }
        self.t_sum[6] <= T_MAX
    }

    fn integrate_phases(&mut self) {
        for i in 0..7 {
            let (p, v, a) = integrate(self.t[i], self.p[i], self.v[i], self.a[i], self.j[i]);
            self.p[i + 1] = p;
            self.v[i + 1] = v;
            self.a[i + 1] = a;
        }
        self.pf = self.p[7];
    }

    /// Verify a third-order velocity profile
    ///
    /// Assigns jerks from `control_signs` and `jf`, integrates all phases
    /// and checks the target velocity/acceleration and the acceleration
    /// limits at every ramp end.
    pub fn check_for_velocity(
        &mut self,
        control_signs: ControlSigns,
        limits: ReachedLimits,
        jf: f64,
        a_max: f64,
        a_min: f64,
    ) -> bool {
        if !self.accumulate_times() {
            return false;
        }

        if limits == ReachedLimits::Acc0 && self.t[1] < f64::EPSILON {
            return false;
        }

        let t = self.t;
        let ramp = |i: usize, jerk: f64| if t[i] > 0.0 { jerk } else { 0.0 };
        self.j = match control_signs {
            ControlSigns::Uddu => [
                ramp(0, jf),
                0.0,
                ramp(2, -jf),
                0.0,
                ramp(4, -jf),
                0.0,
                ramp(6, jf),
            ],
            ControlSigns::Udud => [
                ramp(0, jf),
                0.0,
                ramp(2, -jf),
                0.0,
                ramp(4, jf),
                0.0,
                ramp(6, -jf),
            ],
        };

        self.direction = if a_max >= a_min {
            Direction::Up
        } else {
            Direction::Down
        };
        let a_upp = a_max.max(a_min) + A_EPS;
        let a_low = a_max.min(a_min) - A_EPS;

        self.integrate_phases();
        self.control_signs = control_signs;
        self.limits = limits;

        fabs(self.v[7] - self.vf) < V_PRECISION
            && fabs(self.a[7] - self.af) < A_PRECISION
            && [1, 3, 5]
                .iter()
                .all(|&i| self.a[i] >= a_low && self.a[i] <= a_upp)
    }

    /// Verify a third-order velocity profile that must last exactly `tf`
    pub fn check_for_velocity_with_timing(
        &mut self,
        control_signs: ControlSigns,
        limits: ReachedLimits,
        tf: f64,
        jf: f64,
        a_max: f64,
        a_min: f64,
    ) -> bool {
        self.check_for_velocity(control_signs, limits, jf, a_max, a_min)
            && fabs(self.t_sum[6] - tf) < T_PRECISION * (1.0 + tf)
    }

    /// Verify a second-order (acceleration-limited) velocity profile
    ///
    /// Only phase 1 carries motion, with constant acceleration `a_up`. The
    /// acceleration is zero before and after it; `af` is not used.
    pub fn check_for_second_order_velocity(
        &mut self,
        control_signs: ControlSigns,
        limits: ReachedLimits,
        a_up: f64,
    ) -> bool {
        let t1 = self.t[1];
        if t1 < 0.0 || t1.is_nan() || t1 > T_MAX {
            return false;
        }

        self.t_sum = [0.0, t1, t1, t1, t1, t1, t1];
        self.j = [0.0; 7];
        self.a = [0.0; 8];
        if t1 > 0.0 {
            self.a[1] = a_up;
        }
        for i in 0..7 {
            self.v[i + 1] = self.v[i] + self.t[i] * self.a[i];
            self.p[i + 1] = self.p[i] + self.t[i] * (self.v[i] + self.t[i] * self.a[i] / 2.0);
        }
        self.pf = self.p[7];

        self.control_signs = control_signs;
        self.limits = limits;
        self.direction = if a_up >= 0.0 {
            Direction::Up
        } else {
            Direction::Down
        };

        fabs(self.v[7] - self.vf) < V_PRECISION
    }

    /// Verify a second-order profile whose acceleration must stay in limits
    pub fn check_for_second_order_velocity_with_timing(
        &mut self,
        control_signs: ControlSigns,
        limits: ReachedLimits,
        tf: f64,
        a_up: f64,
        a_max: f64,
        a_min: f64,
    ) -> bool {
        a_min - A_EPS < a_up
            && a_up < a_max + A_EPS
            && self.check_for_second_order_velocity(control_signs, limits, a_up)
            && fabs(self.t_sum[6] - tf) < T_PRECISION * (1.0 + tf)
    }

    /// Sample the profile `time` seconds after its start (brake included)
    ///
    /// Times past the end continue with the final acceleration.
    pub fn state_at(&self, time: f64) -> KinematicState {
        let time = time.max(0.0);
        if time < self.brake.duration {
            return self.brake.state_at(time);
        }

        let t = time - self.brake.duration;
        if t >= self.t_sum[6] {
            let (p, v, a) = integrate(t - self.t_sum[6], self.p[7], self.v[7], self.a[7], 0.0);
            return KinematicState {
                position: p,
                velocity: v,
                acceleration: a,
                jerk: 0.0,
            };
        }

        let index = self.t_sum.iter().position(|&end| end > t).unwrap_or(6);
        let start = if index == 0 { 0.0 } else { self.t_sum[index - 1] };
        let (p, v, a) = integrate(
            t - start,
            self.p[index],
            self.v[index],
            self.a[index],
            self.j[index],
        );
        KinematicState {
            position: p,
            velocity: v,
            acceleration: a,
            jerk: self.j[index],
        }
    }
}
