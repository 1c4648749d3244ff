//! Pursuit driver: steers toward a target position and keeps a follow
//! distance. Produces the same [`ControlInput`] a human driver would.

use std::f32::consts::PI;

use nalgebra::Point3;

use crate::{
    config::AiConfig,
    constants::{AI_CRUISE_FACTOR, AI_TURN_SLOWDOWN_ANGLE, AI_TURN_SLOWDOWN_FACTOR},
    utils::{planar_distance_sq, to_planar, wrap_angle},
    vehicle::ControlInput,
};

#[derive(Clone, Debug, Default)]
pub struct AiDriver {
    params: AiConfig,
    steer: f32,
}

impl AiDriver {
    pub fn new(params: AiConfig) -> Self {
        Self { params, steer: 0.0 }
    }

    #[inline]
    pub fn params(&self) -> &AiConfig {
        &self.params
    }

    pub fn reset(&mut self) {
        self.steer = 0.0;
    }

    /// One control decision.
    ///
    /// `yaw` is the driver's heading (`atan2(forward.x, forward.z)`).
    pub fn update(
        &mut self,
        dt: f32,
        position: &Point3<f32>,
        yaw: f32,
        target: &Point3<f32>,
    ) -> ControlInput {
        let p = &self.params;
        let dx = target.x - position.x;
        let dz = target.z - position.z;

        let yaw_err = wrap_angle(dx.atan2(dz) - yaw);
        let steer_cmd = (p.steering_kp * yaw_err).clamp(-p.steering_clamp, p.steering_clamp);
        let blend = (dt.max(0.0) * p.steering_smoothing).min(1.0);
        self.steer += (steer_cmd - self.steer) * blend;

        let dist = planar_distance_sq(to_planar(position), to_planar(target)).sqrt();
        let mut brake = false;
        let mut throttle = if dist > p.accel_dist {
            p.max_throttle
        } else if dist > p.desired_dist {
            let t = (dist - p.desired_dist) / (p.accel_dist - p.desired_dist).max(1.0);
            p.min_throttle + (p.max_throttle - p.min_throttle) * t
        } else if dist < p.brake_dist {
            brake = true;
            0.0
        } else {
            p.min_throttle * AI_CRUISE_FACTOR
        };

        if yaw_err.abs() > PI * AI_TURN_SLOWDOWN_ANGLE {
            throttle *= AI_TURN_SLOWDOWN_FACTOR;
        }

        ControlInput {
            throttle: throttle.clamp(-1.0, 1.0),
            steering: self.steer.clamp(-1.0, 1.0),
            brake,
            turbo: p.use_turbo,
        }
    }
}
