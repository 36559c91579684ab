//! Minimum-time profile for acceleration-limited velocity control

use libm::fabs;

use crate::block::Block;
use crate::profile::{ControlSigns, Profile, ReachedLimits};

/// Minimum-time search for one axis without a jerk limit
///
/// The acceleration jumps instantly, so the fastest profile is a single
/// constant-acceleration phase at the limit in the direction of travel.
#[derive(Debug)]
pub struct VelocitySecondOrderStep1 {
    a_max: f64,
    a_min: f64,
    vd: f64,
}

impl VelocitySecondOrderStep1 {
    pub fn new(v0: f64, vf: f64, a_max: f64, a_min: f64) -> Self {
        Self {
            a_max,
            a_min,
            vd: vf - v0,
        }
    }

    /// Returns `None` if the velocity change needs an acceleration that is zero
    pub fn get_profile(self, input: &Profile) -> Option<Block> {
        let mut profile = Profile::default();
        profile.set_boundary_from(input);

        let a_up = if self.vd > 0.0 { self.a_max } else { self.a_min };
        profile.t = [0.0; 7];
        profile.t[1] = if fabs(self.vd) < f64::EPSILON {
            0.0
        } else {
            self.vd / a_up
        };

        if profile.check_for_second_order_velocity(ControlSigns::Uddu, ReachedLimits::Acc0, a_up) {
            Some(Block::from_min(profile))
        } else {
            trace!("Second order velocity step 1 failed for vd = {}", self.vd);
            None
        }
    }
}
