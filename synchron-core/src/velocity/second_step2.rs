//! Time synchronization for acceleration-limited velocity control

use crate::profile::{ControlSigns, Profile, ReachedLimits};

/// Profile recomputation for an axis without a jerk limit
///
/// Spreads the velocity change evenly over `tf`, so the acceleration is
/// the average `vd / tf` and must lie within the limits.
#[derive(Debug)]
pub struct VelocitySecondOrderStep2 {
    tf: f64,
    a_max: f64,
    a_min: f64,
    vd: f64,
}

impl VelocitySecondOrderStep2 {
    pub fn new(tf: f64, v0: f64, vf: f64, a_max: f64, a_min: f64) -> Self {
        Self {
            tf,
            a_max,
            a_min,
            vd: vf - v0,
        }
    }

    /// Rewrite `profile` (boundary already set) to last exactly `tf`
    pub fn get_profile(self, profile: &mut Profile) -> bool {
        let a_up = if self.tf > 0.0 { self.vd / self.tf } else { 0.0 };

        profile.t = [0.0, self.tf, 0.0, 0.0, 0.0, 0.0, 0.0];
        profile.check_for_second_order_velocity_with_timing(
            ControlSigns::Uddu,
            ReachedLimits::Acc0,
            self.tf,
            a_up,
            self.a_max,
            self.a_min,
        )
    }
}
