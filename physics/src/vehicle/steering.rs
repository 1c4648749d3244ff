/// Smoothed steering angle shared by both front wheels.
///
/// Input accumulates `increment * input` per update and is clamped to
/// `[-max, max]`. With no input the angle decays geometrically.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SteeringState {
    angle: f32,
}

impl SteeringState {
    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn update(&mut self, input: f32, increment: f32, max: f32, decay: f32) -> f32 {
        let max = max.abs();
        if input != 0.0 {
            self.angle = (self.angle + increment * input).clamp(-max, max);
        } else {
            self.angle *= decay;
        }
        self.angle
    }

    /// Re-apply a (possibly lowered) limit.
    pub fn clamp_to(&mut self, max: f32) {
        let max = max.abs();
        self.angle = self.angle.clamp(-max, max);
    }

    pub fn reset(&mut self) {
        self.angle = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_never_leaves_limit() {
        let inputs = [1.0, 1.0, -0.3, 1.0, -1.0, -1.0, 0.0, 0.7, -1.0, 1.0];
        for &(increment, max) in &[(0.1, 1.0), (0.5, 0.6), (2.0, 0.35), (0.01, 0.05)] {
            let mut s = SteeringState::default();
            for _ in 0..20 {
                for &i in &inputs {
                    let a = s.update(i, increment, max, 0.9);
                    assert!(a.abs() <= max + 1.0e-6, "{a} exceeds {max}");
                }
            }
        }
    }

    #[test]
    fn released_steering_decays_within_log_bound() {
        let mut s = SteeringState::default();
        for _ in 0..20 {
            s.update(1.0, 0.1, 1.0, 0.9);
        }
        assert_eq!(s.angle(), 1.0);

        let bound = (1.0e-3f32.ln() / 0.9f32.ln()).ceil() as usize;
        for _ in 0..bound {
            s.update(0.0, 0.1, 1.0, 0.9);
        }
        assert!(s.angle().abs() < 1.0e-3 + 1.0e-6);
        assert!(s.angle() > 0.0);
    }

    #[test]
    fn lowering_the_limit_clamps_current_angle() {
        let mut s = SteeringState::default();
        for _ in 0..10 {
            s.update(-1.0, 0.1, 1.0, 0.9);
        }
        s.clamp_to(0.4);
        assert_eq!(s.angle(), -0.4);
    }
}
